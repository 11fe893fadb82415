//! Run configuration
//!
//! Values come from the `[run]` table of a model description (or a standalone
//! TOML file); command-line flags override them afterwards.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::types::Step;

/// Configuration for a single simulation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Number of steps (simulated days) to run
    pub steps: Step,

    /// Stop the run at the first failed step
    ///
    /// When false, a failed step is logged and recorded in the run outcome
    /// and the run continues with the next step.
    pub halt_on_step_error: bool,

    /// `tracing` filter directive used by the binary when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            steps: 10,
            halt_on_step_error: true,
            log_filter: "arbor=info".to_string(),
        }
    }
}

impl RunConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a standalone TOML run configuration
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load a standalone TOML run configuration from disk
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        Self::from_toml_str(&content).map_err(|e| format!("{}: Invalid TOML: {}", path.display(), e))
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<(), String> {
        if self.steps == 0 {
            return Err("steps must be at least 1".into());
        }
        if self.log_filter.trim().is_empty() {
            return Err("log_filter must not be empty".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(RunConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = RunConfig::from_toml_str("steps = 30").unwrap();
        assert_eq!(config.steps, 30);
        assert!(config.halt_on_step_error);
        assert_eq!(config.log_filter, "arbor=info");
    }

    #[test]
    fn test_zero_steps_rejected() {
        let config = RunConfig {
            steps: 0,
            ..RunConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
