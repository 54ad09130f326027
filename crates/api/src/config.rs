use std::str::FromStr;

use serde::Serialize;
use tracing::warn;

use roster_search::DEFAULT_DEBOUNCE_MS;

pub const DEFAULT_UPDATE_BUS_CAP: usize = 64;

/// Runtime knobs, read from `ROSTER_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosterConfig {
    /// Overrides every entity's page size when set.
    pub page_size: Option<usize>,
    pub debounce_ms: u64,
    pub update_bus_cap: usize,
    /// Artificial latency for the mock source and remote.
    pub mock_delay_ms: u64,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self { page_size: None, debounce_ms: DEFAULT_DEBOUNCE_MS, update_bus_cap: DEFAULT_UPDATE_BUS_CAP, mock_delay_ms: 0 }
    }
}

impl RosterConfig {
    pub fn from_env() -> Self { Self::from_lookup(|k| std::env::var(k).ok()) }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let d = Self::default();
        Self {
            page_size: parse(&get, "ROSTER_PAGE_SIZE").filter(|n: &usize| *n > 0),
            debounce_ms: parse(&get, "ROSTER_DEBOUNCE_MS").unwrap_or(d.debounce_ms),
            update_bus_cap: parse(&get, "ROSTER_UPDATE_BUS_CAP").filter(|n: &usize| *n > 0).unwrap_or(d.update_bus_cap),
            mock_delay_ms: parse(&get, "ROSTER_MOCK_DELAY_MS").unwrap_or(d.mock_delay_ms),
        }
    }
}

fn parse<T: FromStr>(get: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = get(key)?;
    match raw.trim().parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(key, value = %raw, "ignoring unparsable config value");
            None
        }
    }
}
