//! Configuration access port.

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    /// Every key present in `section`, sorted.
    fn keys(&self, section: &str) -> Vec<String>;
    fn has_section(&self, section: &str) -> bool;
}
