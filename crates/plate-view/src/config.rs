use inkpress_plate_core::ConfigError;
use serde::{Deserialize, Serialize};

/// Image view geometry, in pixels. Zero values are replaced by defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageViewConfig {
    /// Floor applied to width and height independently while resizing.
    pub min_size: f32,
    pub wrap_margin: f32,
    pub tight_margin: f32,
}

impl ImageViewConfig {
    pub fn with_defaults(mut self) -> Self {
        if self.min_size <= 0.0 {
            self.min_size = 100.0;
        }
        if self.wrap_margin <= 0.0 {
            self.wrap_margin = 16.0;
        }
        if self.tight_margin <= 0.0 {
            self.tight_margin = 4.0;
        }
        self
    }

    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        Ok(config.with_defaults())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let config = ImageViewConfig::from_json_str(r#"{ "tight_margin": 2 }"#).unwrap();
        assert_eq!(config.min_size, 100.0);
        assert_eq!(config.wrap_margin, 16.0);
        assert_eq!(config.tight_margin, 2.0);
    }
}
