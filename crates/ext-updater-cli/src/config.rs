//! Configuration management for the ext-updater CLI
//!
//! Configuration is stored in TOML format.
//!
//! # Configuration File Locations
//!
//! - Linux: `~/.config/ext-updater/config.toml`
//! - macOS: `~/Library/Application Support/dev.ext-updater.ext-updater/config.toml`
//! - Windows: `%APPDATA%\ext-updater\ext-updater\config\config.toml`

use std::path::{Path, PathBuf};

use ext_updater::{DownloaderConfig, RegistryConfig, UpdateOptions};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse config file
    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// CLI configuration
///
/// # Example TOML
///
/// ```toml
/// [extension]
/// manifest = "package.json"
///
/// [options]
/// show_up_to_date_confirmation = true
/// re_install = false
///
/// [registry]
/// kind = "gitlab"
/// host = "git.example.com"
/// project_id = 31775
/// package_type = "generic"
/// package_name = "dev-builds"
///
/// [download]
/// settle_delay_ms = 1000
///
/// [host]
/// install_command = ["code", "--install-extension", "{file}", "--force"]
///
/// [logging]
/// level = "warn"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Where to find the installed extension's manifest
    #[serde(default)]
    pub extension: ExtensionConfig,

    /// Update cycle options
    #[serde(default)]
    pub options: UpdateOptions,

    /// Registry backend; required to run a cycle
    #[serde(default)]
    pub registry: Option<RegistryConfig>,

    /// HTTP and download settings
    #[serde(default)]
    pub download: DownloaderConfig,

    /// Host commands
    #[serde(default)]
    pub host: HostConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Extension manifest location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtensionConfig {
    /// Path to the extension's `package.json`
    #[serde(default = "default_manifest")]
    pub manifest: PathBuf,
}

fn default_manifest() -> PathBuf {
    PathBuf::from("package.json")
}

impl Default for ExtensionConfig {
    fn default() -> Self {
        Self {
            manifest: default_manifest(),
        }
    }
}

/// Placeholder in host commands replaced by the artifact path
pub const FILE_PLACEHOLDER: &str = "{file}";

/// Commands used to act on the host editor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    /// Install command; `{file}` is replaced by the artifact path
    #[serde(default = "default_install_command")]
    pub install_command: Vec<String>,

    /// Reload command (empty = print a hint instead)
    #[serde(default)]
    pub reload_command: Vec<String>,
}

fn default_install_command() -> Vec<String> {
    ["code", "--install-extension", FILE_PLACEHOLDER, "--force"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            install_command: default_install_command(),
            reload_command: Vec::new(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Values given on the command line that take precedence over the file
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub manifest: Option<PathBuf>,
    pub re_install: bool,
    pub show_up_to_date_confirmation: bool,
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default location
    pub fn load_default() -> Result<Self, ConfigError> {
        if let Some(path) = Self::default_path() {
            if path.exists() {
                return Self::load(&path);
            }
        }
        Ok(Self::default())
    }

    /// Load configuration from custom path or default
    pub fn load_from(custom_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = custom_path {
            Self::load(path)
        } else {
            Self::load_default()
        }
    }

    /// Get default configuration file path
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("dev", "ext-updater", "ext-updater")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Apply command-line overrides. Flags can only switch options on.
    pub fn with_overrides(mut self, overrides: &CliOverrides) -> Self {
        if let Some(manifest) = &overrides.manifest {
            self.extension.manifest = manifest.clone();
        }
        self.options.re_install |= overrides.re_install;
        self.options.show_up_to_date_confirmation |= overrides.show_up_to_date_confirmation;
        self
    }

    /// The configured registry, or an error naming the missing section
    pub fn registry(&self) -> Result<&RegistryConfig, ConfigError> {
        self.registry.as_ref().ok_or_else(|| {
            ConfigError::ValidationError("no [registry] section configured".to_string())
        })
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.install_command.is_empty() {
            return Err(ConfigError::ValidationError(
                "host.install_command must not be empty".to_string(),
            ));
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid log level '{}'. Must be one of: {:?}",
                self.logging.level, valid_levels
            )));
        }

        Ok(())
    }
}
