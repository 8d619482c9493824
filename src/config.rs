#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::arena::Arena;

pub const DEFAULT_MAX_ELEMENT_COUNT: u32 = 8192;
pub const DEFAULT_MAX_MEASURE_TEXT_WORD_CACHE_COUNT: u32 = 16384;

/// Construction-time settings of a [`crate::engine::LayoutContext`].
///
/// Everything except `memory_size` can also be changed at runtime through the
/// matching setter on the context.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct Config {
    /// Arena size in bytes. `None` uses [`Arena::min_memory_size`] for the
    /// configured capacities.
    pub memory_size: Option<usize>,
    pub max_element_count: u32,
    pub max_measure_text_cache_word_count: u32,
    /// Skip render commands for elements entirely outside the viewport.
    pub culling_enabled: bool,
    /// When enabled, stored scroll positions are not applied to clip
    /// containers and the host threads them into `child_offset` itself.
    pub external_scroll_handling_enabled: bool,
    /// Dump the resolved tree through `tracing` after every layout.
    pub debug_mode_enabled: bool,
    /// Panic after reporting a usage error instead of recovering.
    pub panic_on_usage_error: bool,
}

impl Config {
    /// Bytes the arena will be created with.
    pub fn resolved_memory_size(&self) -> usize {
        self.memory_size.unwrap_or_else(|| self.min_memory_size())
    }

    pub fn min_memory_size(&self) -> usize {
        Arena::min_memory_size(self.max_element_count)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            memory_size: None,
            max_element_count: DEFAULT_MAX_ELEMENT_COUNT,
            max_measure_text_cache_word_count: DEFAULT_MAX_MEASURE_TEXT_WORD_CACHE_COUNT,
            culling_enabled: true,
            external_scroll_handling_enabled: false,
            debug_mode_enabled: false,
            panic_on_usage_error: cfg!(debug_assertions),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_memory_fits_default_capacities() {
        let config = Config::default();
        assert_eq!(config.resolved_memory_size(), config.min_memory_size());
        assert_eq!(config.max_element_count, 8192);
        assert!(config.culling_enabled);
    }

    #[test]
    fn explicit_memory_size_wins() {
        let config = Config {
            memory_size: Some(1 << 20),
            ..Config::default()
        };
        assert_eq!(config.resolved_memory_size(), 1 << 20);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn partial_json_fills_defaults() {
        let config: Config = serde_json::from_str(r#"{ "max_element_count": 64 }"#).unwrap();
        assert_eq!(config.max_element_count, 64);
        assert_eq!(config.max_measure_text_cache_word_count, 16384);
        assert!(config.memory_size.is_none());
    }
}
