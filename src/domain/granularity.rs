//! Candle granularity codes.
//!
//! The codes follow the usual broker convention: `S5`..`S30` seconds,
//! `M1`..`M30` minutes, `H1`..`H12` hours, `D` daily, `W` weekly and a bare
//! `M` for monthly candles.

use std::fmt;
use std::str::FromStr;

use crate::domain::error::BacktestError;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;
const SECONDS_PER_DAY: f64 = 86_400.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Granularity {
    Seconds(u32),
    Minutes(u32),
    Hours(u32),
    Daily,
    Weekly,
    Monthly,
}

impl Granularity {
    const SECONDS: [u32; 4] = [5, 10, 15, 30];
    const MINUTES: [u32; 7] = [1, 2, 4, 5, 10, 15, 30];
    const HOURS: [u32; 7] = [1, 2, 3, 4, 6, 8, 12];

    /// Number of bars in one trading year, used to annualize statistics.
    pub fn bars_per_year(&self) -> f64 {
        match self {
            Granularity::Daily => TRADING_DAYS_PER_YEAR,
            Granularity::Weekly => 52.0,
            Granularity::Monthly => 12.0,
            Granularity::Seconds(n) => TRADING_DAYS_PER_YEAR * SECONDS_PER_DAY / *n as f64,
            Granularity::Minutes(n) => {
                TRADING_DAYS_PER_YEAR * SECONDS_PER_DAY / (*n as f64 * 60.0)
            }
            Granularity::Hours(n) => {
                TRADING_DAYS_PER_YEAR * SECONDS_PER_DAY / (*n as f64 * 3_600.0)
            }
        }
    }
}

impl FromStr for Granularity {
    type Err = BacktestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_uppercase();
        let invalid = || BacktestError::ConfigInvalid {
            section: "backtest".into(),
            key: "granularity".into(),
            reason: format!("unsupported granularity {s:?}"),
        };

        match code.as_str() {
            "D" => return Ok(Granularity::Daily),
            "W" => return Ok(Granularity::Weekly),
            "M" => return Ok(Granularity::Monthly),
            _ => {}
        }

        let mut chars = code.chars();
        let unit = chars.next().ok_or_else(invalid)?;
        let count: u32 = chars.as_str().parse().map_err(|_| invalid())?;
        match unit {
            'S' if Self::SECONDS.contains(&count) => Ok(Granularity::Seconds(count)),
            'M' if Self::MINUTES.contains(&count) => Ok(Granularity::Minutes(count)),
            'H' if Self::HOURS.contains(&count) => Ok(Granularity::Hours(count)),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Granularity::Seconds(n) => write!(f, "S{}", n),
            Granularity::Minutes(n) => write!(f, "M{}", n),
            Granularity::Hours(n) => write!(f, "H{}", n),
            Granularity::Daily => write!(f, "D"),
            Granularity::Weekly => write!(f, "W"),
            Granularity::Monthly => write!(f, "M"),
        }
    }
}
