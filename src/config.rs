//! Configuration for validation reports and documentation output
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (typed-schemas.toml)
//! - Environment variables (TYPED_SCHEMAS__*)
//!
//! ## Example config file (typed-schemas.toml):
//! ```toml
//! [validation]
//! format_path = true
//! snake_case_type = true
//! strip_empty_paths = false
//! validate_response = true
//!
//! [openapi]
//! downgrade = true
//!
//! [formats]
//! slug = "^[a-z0-9-]+$"
//! ```

use std::collections::BTreeMap;

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use crate::enhance::EnhanceOptions;
use crate::error::Result;
use crate::formats;

/// Main configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolkitConfig {
    /// Error report settings
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Documentation output settings
    #[serde(default)]
    pub openapi: OpenApiConfig,

    /// Custom string formats
    #[serde(default)]
    pub formats: FormatsConfig,
}

/// Validation and error report configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Report dot paths (`a.b`) instead of JSON pointers (`/a/b`)
    #[serde(default = "default_true")]
    pub format_path: bool,

    /// Report `string_format` instead of `StringFormat`
    #[serde(default = "default_true")]
    pub snake_case_type: bool,

    /// Drop errors reported at the root path
    #[serde(default)]
    pub strip_empty_paths: bool,

    /// Check responses against their schema before sending
    #[serde(default = "default_true")]
    pub validate_response: bool,

    /// Prefix for every reported path
    #[serde(default)]
    pub prefix: Option<String>,
}

/// OpenAPI output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenApiConfig {
    /// Rewrite nullable unions and bare literals for OpenAPI 3.0
    #[serde(default = "default_true")]
    pub downgrade: bool,
}

/// Format name → regular expression
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormatsConfig {
    #[serde(flatten)]
    pub patterns: BTreeMap<String, String>,
}

fn default_true() -> bool {
    true
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            format_path: true,
            snake_case_type: true,
            strip_empty_paths: false,
            validate_response: true,
            prefix: None,
        }
    }
}

impl Default for OpenApiConfig {
    fn default() -> Self {
        Self { downgrade: true }
    }
}

impl ToolkitConfig {
    /// Load configuration from default locations
    pub fn load() -> std::result::Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, adding a specific file on top of the defaults
    pub fn load_from(config_path: Option<&str>) -> std::result::Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = [
            "typed-schemas.toml",
            ".typed-schemas.toml",
            "config/typed-schemas.toml",
        ];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // XDG config directory
        if let Some(dirs) = directories::ProjectDirs::from("dev", "typed-schemas", "typed-schemas") {
            let xdg_config = dirs.config_dir().join("typed-schemas.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // TYPED_SCHEMAS__VALIDATION__FORMAT_PATH=false
        builder = builder.add_source(
            Environment::with_prefix("TYPED_SCHEMAS")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Enhancement options for error reports
    pub fn enhance_options(&self) -> EnhanceOptions {
        EnhanceOptions {
            prefix: self.validation.prefix.clone(),
            format_path: self.validation.format_path,
            snake_case_type: self.validation.snake_case_type,
        }
    }

    /// Install every `[formats]` entry into the format registry
    pub fn register_formats(&self) -> Result<()> {
        for (name, pattern) in &self.formats.patterns {
            formats::register_pattern(name.clone(), pattern)?;
        }
        Ok(())
    }

    /// Check the configuration without installing anything
    pub fn validate(&self) -> Result<()> {
        for pattern in self.formats.patterns.values() {
            regex::Regex::new(pattern).map_err(|source| crate::error::SchemaError::InvalidPattern {
                pattern: pattern.clone(),
                source,
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = ToolkitConfig::default();
        assert!(config.validation.format_path);
        assert!(config.validation.validate_response);
        assert!(!config.validation.strip_empty_paths);
        assert!(config.openapi.downgrade);
        assert!(config.formats.patterns.is_empty());
    }

    #[test]
    fn test_serialize_config() {
        let config = ToolkitConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[validation]"));
        assert!(toml_str.contains("[openapi]"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[validation]\nsnake_case_type = false\nprefix = \"body\"\n\n[formats]\nslug = \"^[a-z-]+$\""
        )
        .unwrap();

        let config = ToolkitConfig::load_from(file.path().to_str()).unwrap();
        assert!(!config.validation.snake_case_type);
        assert!(config.validation.format_path);
        assert_eq!(config.formats.patterns["slug"], "^[a-z-]+$");

        let options = config.enhance_options();
        assert_eq!(options.prefix.as_deref(), Some("body"));
        assert!(!options.snake_case_type);
    }

    #[test]
    fn test_save_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("typed-schemas.toml");
        let mut config = ToolkitConfig::default();
        config.openapi.downgrade = false;
        config
            .formats
            .patterns
            .insert("config-test-code".into(), "^[A-Z]{3}$".into());
        config.save(path.to_str().unwrap()).unwrap();

        let loaded = ToolkitConfig::load_from(path.to_str()).unwrap();
        assert!(!loaded.openapi.downgrade);
        assert_eq!(loaded.formats, config.formats);
    }

    #[test]
    fn test_register_and_validate_formats() {
        let mut config = ToolkitConfig::default();
        config
            .formats
            .patterns
            .insert("config-test-sku".into(), "^SKU-[0-9]+$".into());
        config.validate().unwrap();
        config.register_formats().unwrap();
        assert_eq!(formats::check("config-test-sku", "SKU-12"), Some(true));

        config.formats.patterns.insert("config-test-bad".into(), "(".into());
        assert!(config.validate().is_err());
    }
}
