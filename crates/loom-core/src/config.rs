//! Loom configuration
//!
//! Every section has defaults, so an empty TOML document is a valid
//! configuration.
//!
//! ```toml
//! [window]
//! ancestor_levels = 2
//! descendant_depth = 5
//!
//! [stats]
//! recent_window_secs = 300
//! ```

use crate::error::LoomError;
use loom_patch::TextPatchEngine;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Loom configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoomConfig {
    /// Tree windowing bounds
    pub window: WindowConfig,
    /// Aggregate statistics
    pub stats: StatsConfig,
    /// Reconstructed-text cache
    pub render: RenderConfig,
    /// Patch engine tuning
    pub patch: PatchConfig,
    /// Periodic persistence
    pub autosave: AutosaveConfig,
}

impl LoomConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With windowing bounds
    #[inline]
    #[must_use]
    pub fn with_window(mut self, ancestor_levels: usize, descendant_depth: usize) -> Self {
        self.window = WindowConfig {
            ancestor_levels,
            descendant_depth,
        };
        self
    }

    /// With trailing window used for `recent_nodes`
    #[inline]
    #[must_use]
    pub fn with_recent_window(mut self, window: Duration) -> Self {
        self.stats.recent_window_secs = window.as_secs();
        self
    }

    /// With render cache capacity (0 disables caching)
    #[inline]
    #[must_use]
    pub fn with_cache_capacity(mut self, capacity: u64) -> Self {
        self.render.cache_capacity = capacity;
        self
    }

    /// With auto-save interval
    #[inline]
    #[must_use]
    pub fn with_autosave_interval(mut self, interval: Duration) -> Self {
        self.autosave.interval_secs = interval.as_secs().max(1);
        self
    }

    /// Parse configuration from TOML
    ///
    /// # Errors
    /// Returns [`LoomError::Config`] on malformed TOML or unknown value types
    pub fn from_toml_str(input: &str) -> Result<Self, LoomError> {
        toml::from_str(input).map_err(|e| LoomError::Config(e.to_string()))
    }

    /// Load configuration from a TOML file
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoomError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    /// Render as TOML
    ///
    /// # Errors
    /// Returns [`LoomError::Config`] if serialization fails
    pub fn to_toml_string(&self) -> Result<String, LoomError> {
        toml::to_string_pretty(self).map_err(|e| LoomError::Config(e.to_string()))
    }
}

/// Tree windowing bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Ancestors shown above the focus before collapsing into an indicator
    pub ancestor_levels: usize,
    /// Levels rendered below the top of the window, per branch
    pub descendant_depth: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            ancestor_levels: 2,
            descendant_depth: 5,
        }
    }
}

/// Statistics configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    /// Trailing window for counting recently created nodes
    pub recent_window_secs: u64,
}

impl StatsConfig {
    #[inline]
    #[must_use]
    pub fn recent_window(&self) -> Duration {
        Duration::from_secs(self.recent_window_secs)
    }
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            recent_window_secs: 300,
        }
    }
}

/// Render cache configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Maximum cached texts (0 disables the cache)
    pub cache_capacity: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            cache_capacity: 1024,
        }
    }
}

/// Patch engine configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatchConfig {
    pub context_chars: usize,
    pub diff_timeout_ms: u64,
}

impl PatchConfig {
    /// Build the text engine these settings describe
    #[must_use]
    pub fn engine(&self) -> TextPatchEngine {
        TextPatchEngine::new()
            .with_context_chars(self.context_chars)
            .with_timeout(Duration::from_millis(self.diff_timeout_ms))
    }
}

impl Default for PatchConfig {
    fn default() -> Self {
        Self {
            context_chars: loom_patch::DEFAULT_CONTEXT_CHARS,
            diff_timeout_ms: u64::try_from(loom_patch::DEFAULT_DIFF_TIMEOUT.as_millis())
                .unwrap_or(u64::MAX),
        }
    }
}

/// Auto-save configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutosaveConfig {
    pub interval_secs: u64,
}

impl AutosaveConfig {
    #[inline]
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self { interval_secs: 30 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = LoomConfig::new();
        assert_eq!(config.window.ancestor_levels, 2);
        assert_eq!(config.window.descendant_depth, 5);
        assert_eq!(config.stats.recent_window(), Duration::from_secs(300));
        assert_eq!(config.autosave.interval(), Duration::from_secs(30));
    }

    #[test]
    fn empty_toml_is_default() {
        let config = LoomConfig::from_toml_str("").unwrap();
        assert_eq!(config, LoomConfig::default());
    }

    #[test]
    fn partial_toml_overrides_section() {
        let config = LoomConfig::from_toml_str(
            r#"
            [window]
            descendant_depth = 8

            [render]
            cache_capacity = 0
            "#,
        )
        .unwrap();
        assert_eq!(config.window.ancestor_levels, 2);
        assert_eq!(config.window.descendant_depth, 8);
        assert_eq!(config.render.cache_capacity, 0);
    }

    #[test]
    fn malformed_toml_is_config_error() {
        let result = LoomConfig::from_toml_str("[window]\nancestor_levels = \"two\"");
        assert!(matches!(result, Err(LoomError::Config(_))));
    }

    #[test]
    fn toml_roundtrip() {
        let config = LoomConfig::new()
            .with_window(3, 7)
            .with_recent_window(Duration::from_secs(60));
        let text = config.to_toml_string().unwrap();
        assert_eq!(LoomConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn builder_methods() {
        let config = LoomConfig::new()
            .with_cache_capacity(16)
            .with_autosave_interval(Duration::from_millis(10));
        assert_eq!(config.render.cache_capacity, 16);
        assert_eq!(config.autosave.interval_secs, 1);
    }
}
