//! Configuration Module
//!
//! Handles loading cache and demo settings from environment variables.

use std::env;

use crate::cache::DEFAULT_CAPACITY;

/// Runtime configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Capacity given to caches created without an explicit bound
    pub default_capacity: usize,
    /// Number of callers the demo binary issues per round
    pub demo_callers: usize,
    /// Simulated producer latency in the demo binary, in milliseconds
    pub demo_delay_ms: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_CAPACITY` - Default cache capacity (default: 10000)
    /// - `DEMO_CALLERS` - Callers per demo round (default: 10)
    /// - `DEMO_DELAY_MS` - Demo producer latency in ms (default: 1000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            default_capacity: parse_var("CACHE_CAPACITY").unwrap_or(defaults.default_capacity),
            demo_callers: parse_var("DEMO_CALLERS").unwrap_or(defaults.demo_callers),
            demo_delay_ms: parse_var("DEMO_DELAY_MS").unwrap_or(defaults.demo_delay_ms),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_capacity: DEFAULT_CAPACITY,
            demo_callers: 10,
            demo_delay_ms: 1000,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.default_capacity, 10_000);
        assert_eq!(config.demo_callers, 10);
        assert_eq!(config.demo_delay_ms, 1000);
    }

    #[test]
    fn test_config_from_env() {
        // Single test touches the env so parallel tests don't race on it
        env::remove_var("CACHE_CAPACITY");
        env::remove_var("DEMO_CALLERS");
        env::remove_var("DEMO_DELAY_MS");

        let config = Config::from_env();
        assert_eq!(config.default_capacity, 10_000);
        assert_eq!(config.demo_callers, 10);
        assert_eq!(config.demo_delay_ms, 1000);

        env::set_var("CACHE_CAPACITY", "250");
        env::set_var("DEMO_CALLERS", "not-a-number");
        let config = Config::from_env();
        assert_eq!(config.default_capacity, 250);
        assert_eq!(config.demo_callers, 10);

        env::remove_var("CACHE_CAPACITY");
        env::remove_var("DEMO_CALLERS");
    }
}
