use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Host editor limits. Zero values are replaced by defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub max_undo: usize,
    pub max_normalize_iterations: usize,
    /// How many applied steps are kept for path mapping.
    pub max_step_log: usize,
}

impl EditorConfig {
    pub fn with_defaults(mut self) -> Self {
        if self.max_undo == 0 {
            self.max_undo = 200;
        }
        if self.max_normalize_iterations == 0 {
            self.max_normalize_iterations = 100;
        }
        if self.max_step_log == 0 {
            self.max_step_log = 512;
        }
        self
    }

    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        Ok(config.with_defaults())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub debounce_ms: u64,
}

impl SearchConfig {
    pub fn with_defaults(mut self) -> Self {
        if self.debounce_ms == 0 {
            self.debounce_ms = 150;
        }
        self
    }

    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        Ok(config.with_defaults())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config = EditorConfig::from_json_str(r#"{ "max_undo": 5 }"#).unwrap();
        assert_eq!(config.max_undo, 5);
        assert_eq!(config.max_normalize_iterations, 100);
        assert_eq!(config.max_step_log, 512);

        let search = SearchConfig::from_json_str("{}").unwrap();
        assert_eq!(search.debounce(), Duration::from_millis(150));
    }

    #[test]
    fn malformed_json_is_reported() {
        let err = SearchConfig::from_json_str(r#"{ "debounce_ms": "soon" }"#).unwrap_err();
        assert!(err.to_string().starts_with("invalid config"));
    }
}
