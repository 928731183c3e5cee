//! Named strategy parameters.

use std::collections::BTreeMap;
use std::fmt;

pub const SMA: &str = "SMA";
pub const DEV: &str = "DEV";
pub const SMA_S: &str = "SMA_S";
pub const SMA_L: &str = "SMA_L";
pub const EMA_S: &str = "EMA_S";
pub const EMA_L: &str = "EMA_L";
pub const SIGNAL_MW: &str = "SIGNAL_MW";
pub const PERIODS: &str = "PERIODS";
pub const RSI_LOW: &str = "RSI_LOW";
pub const RSI_HIGH: &str = "RSI_HIGH";
pub const D_MW: &str = "D_MW";

/// Every parameter name understood by at least one strategy.
pub const ALL_PARAMETERS: [&str; 11] = [
    SMA, DEV, SMA_S, SMA_L, EMA_S, EMA_L, SIGNAL_MW, PERIODS, RSI_LOW, RSI_HIGH, D_MW,
];

pub fn is_known_parameter(key: &str) -> bool {
    ALL_PARAMETERS.contains(&key)
}

/// Parameter name to value, kept in lexicographic key order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSet {
    values: BTreeMap<String, f64>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: f64) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: f64) {
        self.values.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.values.get(key).copied()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The subset of this set whose keys appear in `keys`.
    pub fn restricted_to(&self, keys: &[&str]) -> ParameterSet {
        self.values
            .iter()
            .filter(|(k, _)| keys.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), *v))
            .collect()
    }

    /// Overwrite this set's values with every entry of `other`.
    pub fn merge(&mut self, other: &ParameterSet) {
        for (k, v) in other.iter() {
            self.insert(k, v);
        }
    }
}

impl FromIterator<(String, f64)> for ParameterSet {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for ParameterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        write!(f, "{}", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_sorted() {
        let set = ParameterSet::new().with(SMA, 20.0).with(DEV, 2.0);
        let keys: Vec<&str> = set.keys().collect();
        assert_eq!(keys, vec![DEV, SMA]);
    }

    #[test]
    fn display_lists_pairs() {
        let set = ParameterSet::new().with(SMA, 20.0).with(DEV, 2.5);
        assert_eq!(set.to_string(), "DEV=2.5, SMA=20");
    }

    #[test]
    fn restricted_to_drops_other_keys() {
        let set = ParameterSet::new()
            .with(SMA, 20.0)
            .with(DEV, 2.0)
            .with(PERIODS, 14.0);
        let subset = set.restricted_to(&[SMA, DEV]);
        assert_eq!(subset.len(), 2);
        assert!(!subset.contains(PERIODS));
    }

    #[test]
    fn merge_overwrites() {
        let mut set = ParameterSet::new().with(SMA, 20.0).with(DEV, 2.0);
        set.merge(&ParameterSet::new().with(SMA, 25.0));
        assert_eq!(set.get(SMA), Some(25.0));
        assert_eq!(set.get(DEV), Some(2.0));
    }

    #[test]
    fn known_parameters() {
        assert!(is_known_parameter("EMA_S"));
        assert!(!is_known_parameter("ema_s"));
        assert!(!is_known_parameter("TC"));
    }
}
