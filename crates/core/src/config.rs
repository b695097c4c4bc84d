use crate::cell::ERROR_MARKER;
use crate::error::{MatrixError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Projection and display settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectorConfig {
    /// Row title used when no Y axis is selected
    pub row_placeholder: String,

    /// Column label used when no X axis is selected
    pub column_placeholder: String,

    /// Rows shown before the display layer truncates
    pub max_display_rows: usize,

    /// Header width for text renderers
    pub label_max_chars: usize,

    /// Prefix that marks a stored value as an error
    pub error_marker: String,
}

impl Default for ProjectorConfig {
    fn default() -> Self {
        Self {
            row_placeholder: "result".to_string(),
            column_placeholder: "result".to_string(),
            max_display_rows: 20,
            label_max_chars: 24,
            error_marker: ERROR_MARKER.to_string(),
        }
    }
}

impl ProjectorConfig {
    /// Parse a TOML document; missing keys keep their defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)
            .map_err(|err| MatrixError::invalid_config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|err| {
            MatrixError::invalid_config(format!("{}: {err}", path.display()))
        })?;
        Self::from_toml_str(&raw)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_display_rows == 0 {
            return Err(MatrixError::invalid_config("max_display_rows must be > 0"));
        }

        if self.label_max_chars < 4 {
            return Err(MatrixError::invalid_config(format!(
                "label_max_chars ({}) must be at least 4",
                self.label_max_chars
            )));
        }

        if self.error_marker.is_empty() {
            return Err(MatrixError::invalid_config("error_marker must not be empty"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        assert!(ProjectorConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ProjectorConfig::from_toml_str("max_display_rows = 50\n").expect("config");
        assert_eq!(config.max_display_rows, 50);
        assert_eq!(config.row_placeholder, "result");
        assert_eq!(config.error_marker, "ERROR: ");
    }

    #[test]
    fn test_config_validation() {
        let mut config = ProjectorConfig {
            max_display_rows: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        config.max_display_rows = 5;
        config.label_max_chars = 2;
        assert!(config.validate().is_err());

        config.label_max_chars = 12;
        config.error_marker = String::new();
        assert!(config.validate().is_err());

        config.error_marker = "FAILED:".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let err = ProjectorConfig::from_toml_str("max_rows = 3\n").expect_err("unknown key");
        assert!(matches!(err, MatrixError::InvalidConfig(_)));
    }
}
