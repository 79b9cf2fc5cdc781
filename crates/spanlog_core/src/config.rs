//! Store configuration.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};

/// Configuration for a log store.
///
/// These are the only tunables the store recognizes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Config {
    /// Retained text size, in bytes, above which eviction runs.
    pub byte_ceiling: u64,

    /// Fraction of the ceiling that eviction shrinks the store down to.
    ///
    /// Must lie strictly between 0 and 1.
    pub eviction_target_ratio: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            byte_ceiling: 120 * 1000 * 1000, // 120 MB
            eviction_target_ratio: 0.5,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the byte ceiling.
    #[must_use]
    pub const fn byte_ceiling(mut self, bytes: u64) -> Self {
        self.byte_ceiling = bytes;
        self
    }

    /// Sets the eviction target ratio.
    #[must_use]
    pub const fn eviction_target_ratio(mut self, ratio: f64) -> Self {
        self.eviction_target_ratio = ratio;
        self
    }

    /// Size eviction shrinks the store down to.
    #[must_use]
    pub fn target_bytes(&self) -> u64 {
        (self.byte_ceiling as f64 * self.eviction_target_ratio).floor() as u64
    }

    /// Checks that every setting is usable.
    pub fn validate(&self) -> CoreResult<()> {
        if self.byte_ceiling == 0 {
            return Err(CoreError::invalid_config("byte ceiling must be positive"));
        }
        let ratio = self.eviction_target_ratio;
        if !ratio.is_finite() || ratio <= 0.0 || ratio >= 1.0 {
            return Err(CoreError::invalid_config(format!(
                "eviction target ratio must be in (0, 1), got {ratio}"
            )));
        }
        Ok(())
    }
}
