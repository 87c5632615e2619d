// =============================================================================
// CONFIGURATION - Load settings from config.toml
// =============================================================================
//
// This module handles loading and parsing configuration from config.toml.
// Provides sensible defaults if config file is missing or has errors.
// `ContextConfig` is the narrow record the lifecycle coordinator consumes.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::error::BootstrapError;
use crate::handles::ApiVersion;

/// Root configuration structure
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub application: ApplicationConfig,
    pub window: WindowConfig,
    pub graphics: GraphicsConfig,
    pub debug: DebugConfig,
}

/// Application identity reported to the driver
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    pub label: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            label: "GPU Bootstrap".to_string(),
        }
    }
}

/// Window settings (demo binary only)
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "GPU Bootstrap".to_string(),
            width: 1280,
            height: 720,
        }
    }
}

/// Graphics settings
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GraphicsConfig {
    /// Minimum Vulkan version as `[major, minor]`
    pub min_api_version: [u32; 2],
}

impl Default for GraphicsConfig {
    fn default() -> Self {
        Self {
            min_api_version: [1, 1],
        }
    }
}

/// Debug settings
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    pub validation_layers: bool,
    pub default_messenger: bool,
    /// Also forward info/verbose validation messages
    pub verbose_diagnostics: bool,
    pub log_level: String,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            validation_layers: true,
            default_messenger: true,
            verbose_diagnostics: false,
            log_level: "info".to_string(),
        }
    }
}

/// Inputs of the context bootstrap.
#[derive(Debug, Clone)]
pub struct ContextConfig {
    pub application_label: String,
    pub enable_validation: bool,
    pub min_api_version: ApiVersion,
    pub enable_default_diagnostics: bool,
    pub verbose_diagnostics: bool,
}

impl ContextConfig {
    pub fn new(application_label: impl Into<String>) -> Self {
        Self {
            application_label: application_label.into(),
            enable_validation: false,
            min_api_version: ApiVersion::V1_1,
            enable_default_diagnostics: false,
            verbose_diagnostics: false,
        }
    }

    pub fn with_validation(mut self, enable: bool) -> Self {
        self.enable_validation = enable;
        self
    }

    pub fn with_diagnostics(mut self, enable: bool) -> Self {
        self.enable_default_diagnostics = enable;
        self
    }

    pub fn with_min_api_version(mut self, version: impl Into<ApiVersion>) -> Self {
        self.min_api_version = version.into();
        self
    }

    /// Reject records no runtime can be handed.
    pub fn validate(&self) -> Result<(), BootstrapError> {
        if self.application_label.is_empty() {
            return Err(BootstrapError::InvalidConfiguration(
                "application label must not be empty".to_string(),
            ));
        }
        if self.application_label.contains('\0') {
            return Err(BootstrapError::InvalidConfiguration(
                "application label must not contain NUL bytes".to_string(),
            ));
        }
        Ok(())
    }
}

impl Config {
    /// Load configuration from file, falling back to defaults if not found
    pub fn load() -> Self {
        Self::load_from_path("config.toml").unwrap_or_else(|e| {
            log::warn!("Failed to load config.toml: {}. Using defaults.", e);
            Config::default()
        })
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            log::info!("Config file not found at {:?}, using defaults", path);
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let config = Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        log::info!("Loaded configuration from {:?}", path);
        log::debug!("Config: {:?}", config);

        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Build the bootstrap record. Validation is only honoured in debug builds.
    pub fn context_config(&self) -> ContextConfig {
        let [major, minor] = self.graphics.min_api_version;
        ContextConfig {
            application_label: self.application.label.clone(),
            enable_validation: cfg!(debug_assertions) && self.debug.validation_layers,
            min_api_version: ApiVersion::new(major, minor, 0),
            enable_default_diagnostics: cfg!(debug_assertions) && self.debug.default_messenger,
            verbose_diagnostics: self.debug.verbose_diagnostics,
        }
    }

    /// Get log level as a `log` filter
    pub fn get_log_level(&self) -> log::LevelFilter {
        match self.debug.log_level.to_lowercase().as_str() {
            "off" => log::LevelFilter::Off,
            "error" => log::LevelFilter::Error,
            "warn" => log::LevelFilter::Warn,
            "info" => log::LevelFilter::Info,
            "debug" => log::LevelFilter::Debug,
            "trace" => log::LevelFilter::Trace,
            _ => {
                log::warn!(
                    "Unknown log level '{}', defaulting to info",
                    self.debug.log_level
                );
                log::LevelFilter::Info
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.application.label, "GPU Bootstrap");
        assert_eq!(config.graphics.min_api_version, [1, 1]);
        assert!(config.debug.validation_layers);
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config = Config::parse(
            r#"
            [application]
            label = "viewer"

            [graphics]
            min_api_version = [1, 2]

            [debug]
            log_level = "debug"
            "#,
        )
        .unwrap();

        let ctx = config.context_config();
        assert_eq!(ctx.application_label, "viewer");
        assert_eq!(ctx.min_api_version, ApiVersion::V1_2);
        assert_eq!(config.window.width, 1280);
        assert_eq!(config.get_log_level(), log::LevelFilter::Debug);
    }

    #[test]
    fn malformed_version_is_a_parse_error() {
        assert!(Config::parse("[graphics]\nmin_api_version = \"1.2\"").is_err());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = Config::load_from_path("does/not/exist.toml").unwrap();
        assert_eq!(config.window.title, "GPU Bootstrap");
    }

    #[test]
    fn label_must_be_non_empty_and_nul_free() {
        assert!(ContextConfig::new("viewer").validate().is_ok());
        assert!(matches!(
            ContextConfig::new("").validate(),
            Err(BootstrapError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            ContextConfig::new("bad\0label").validate(),
            Err(BootstrapError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn builder_sets_bootstrap_flags() {
        let ctx = ContextConfig::new("test")
            .with_validation(true)
            .with_diagnostics(true)
            .with_min_api_version((1, 3));
        assert!(ctx.enable_validation);
        assert!(ctx.enable_default_diagnostics);
        assert_eq!(ctx.min_api_version, ApiVersion::V1_3);
    }
}
