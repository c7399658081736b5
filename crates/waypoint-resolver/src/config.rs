use std::time::Duration;

use waypoint_core::{AppConfig, MIN_QUERY_LEN};

pub const DEFAULT_DEBOUNCE_MS: u64 = 250;
pub const DEFAULT_MIN_QUERY_LEN: usize = 3;
pub const DEFAULT_RECENTS_LIMIT: usize = 5;
pub const DEFAULT_CACHE_CAPACITY: usize = 32;

/// Tuning for one resolver instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutocompleteConfig {
    /// Inactivity window before a live search is issued.
    pub debounce: Duration,
    /// Trimmed query length (in chars) at which live search starts. Values
    /// below the history store's own threshold are raised to it.
    pub min_query_len: usize,
    /// Recents shown alongside favorites for short queries.
    pub recents_limit: usize,
    /// Distinct queries whose live suggestions are kept.
    pub cache_capacity: usize,
}

impl Default for AutocompleteConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            min_query_len: DEFAULT_MIN_QUERY_LEN,
            recents_limit: DEFAULT_RECENTS_LIMIT,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl AutocompleteConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            debounce: Duration::from_millis(config.autocomplete_debounce_ms),
            min_query_len: config.autocomplete_min_query_len,
            recents_limit: config.recents_display_limit,
            ..Self::default()
        }
    }

    pub(crate) fn is_search_query(&self, query: &str) -> bool {
        query.trim().chars().count() >= self.min_query_len.max(MIN_QUERY_LEN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_counts_trimmed_chars() {
        let config = AutocompleteConfig::default();
        assert!(!config.is_search_query("  Ma "));
        assert!(config.is_search_query(" Main"));
        assert!(config.is_search_query("Äbc"));
    }

    #[test]
    fn threshold_never_drops_below_history_search() {
        let config = AutocompleteConfig {
            min_query_len: 2,
            ..AutocompleteConfig::default()
        };
        assert!(!config.is_search_query("Ma"));
        assert!(config.is_search_query("Mai"));
    }
}
