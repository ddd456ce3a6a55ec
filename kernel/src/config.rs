// Kernel Configuration
//
// Tunables for transactions, loadable from JSON.

use serde::{Deserialize, Serialize};

/// Kernel configuration loaded from JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    /// Upper bound on commit attempts when racing non-overlapping writers.
    pub max_commit_attempts: u32,

    /// Rows buffered per table before a data object is flushed.
    pub rows_per_object: usize,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl KernelConfig {
    /// Default built-in configuration (used if no config is provided).
    pub fn default_config() -> Self {
        Self {
            max_commit_attempts: 10,
            rows_per_object: 64 * 1024,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_commit_attempts == 0 {
            return Err(ConfigError::Invalid(
                "max_commit_attempts must be at least 1".into(),
            ));
        }
        if self.rows_per_object == 0 {
            return Err(ConfigError::Invalid("rows_per_object must be at least 1".into()));
        }
        Ok(())
    }
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self::default_config()
    }
}
