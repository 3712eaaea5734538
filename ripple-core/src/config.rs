//! Scheduler Configuration
//!
//! Settings are plain data so they can be embedded in a host application's
//! own config file. Missing fields fall back to their defaults.
//!
//! ```rust
//! use ripple_core::SchedulerConfig;
//!
//! let config = SchedulerConfig::from_json(r#"{ "verify_levels": true }"#).unwrap();
//! assert!(config.verify_levels);
//! assert_eq!(config.capacity_hint, 16);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Tuning knobs for a [`Scheduler`](crate::Scheduler).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Check `parent.level < child.level` on every traversed edge and fail
    /// the pass on a violation. Levels are trusted when this is off.
    pub verify_levels: bool,

    /// Initial capacity of the per-pass visited set.
    pub capacity_hint: usize,
}

impl SchedulerConfig {
    /// Parse a config from JSON.
    pub fn from_json(input: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(input)?)
    }

    /// Enable or disable level verification.
    pub fn with_verify_levels(mut self, verify: bool) -> Self {
        self.verify_levels = verify;
        self
    }

    /// Set the initial capacity of the visited set.
    pub fn with_capacity_hint(mut self, capacity: usize) -> Self {
        self.capacity_hint = capacity;
        self
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            verify_levels: false,
            capacity_hint: 16,
        }
    }
}
