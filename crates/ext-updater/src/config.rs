//! Configuration structures for the update system.
//!
//! Defines the per-cycle update options, the downloader settings and the
//! registry backend selection.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::registry::feed::FeedOptions;
use crate::registry::gitlab::GitLabOptions;

/// Options recognised by an update cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateOptions {
    /// Emit an informational notice when no newer version exists
    pub show_up_to_date_confirmation: bool,

    /// Skip the version comparison and the install prompt; always reinstall
    pub re_install: bool,
}

/// Settings for HTTP requests and artifact downloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloaderConfig {
    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Read timeout for streaming in seconds
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,

    /// User agent string
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Pause after the artifact stream completes and before it is handed to
    /// the installer. Some filesystems report a truncated file otherwise.
    #[serde(default = "default_settle_delay")]
    pub settle_delay_ms: u64,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout(),
            read_timeout_secs: default_read_timeout(),
            user_agent: default_user_agent(),
            settle_delay_ms: default_settle_delay(),
        }
    }
}

impl DownloaderConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Build an HTTP client with these timeouts.
    pub fn build_client(&self) -> Result<reqwest::Client, crate::error::UpdateError> {
        reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(self.connect_timeout_secs))
            .read_timeout(Duration::from_secs(self.read_timeout_secs))
            .user_agent(&self.user_agent)
            .build()
            .map_err(|e| crate::error::UpdateError::Config(format!("failed to create HTTP client: {}", e)))
    }
}

/// Registry backend selection.
///
/// # Example TOML
///
/// ```toml
/// [registry]
/// kind = "gitlab"
/// host = "git.example.com"
/// project_id = 31775
/// package_type = "generic"
/// package_name = "dev-builds"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RegistryConfig {
    /// GitLab package registry
    #[serde(rename = "gitlab")]
    GitLab(GitLabOptions),
    /// Static JSON release feed
    Feed(FeedOptions),
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_read_timeout() -> u64 {
    60
}

fn default_user_agent() -> String {
    format!("ext-updater/{}", env!("CARGO_PKG_VERSION"))
}

fn default_settle_delay() -> u64 {
    1000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_options_default() {
        let options = UpdateOptions::default();
        assert!(!options.show_up_to_date_confirmation);
        assert!(!options.re_install);
    }

    #[test]
    fn test_update_options_partial_toml() {
        let options: UpdateOptions = toml::from_str("re_install = true").unwrap();
        assert!(options.re_install);
        assert!(!options.show_up_to_date_confirmation);
    }

    #[test]
    fn test_downloader_config_default() {
        let config = DownloaderConfig::default();
        assert_eq!(config.connect_timeout_secs, 30);
        assert_eq!(config.read_timeout_secs, 60);
        assert_eq!(config.settle_delay(), Duration::from_secs(1));
        assert!(config.user_agent.starts_with("ext-updater/"));
    }

    #[test]
    fn test_registry_config_gitlab() {
        let config: RegistryConfig = toml::from_str(
            r#"
            kind = "gitlab"
            host = "git.example.com"
            project_id = 31775
            package_type = "generic"
            package_name = "dev-builds"
            "#,
        )
        .unwrap();

        match config {
            RegistryConfig::GitLab(options) => {
                assert_eq!(options.host, "git.example.com");
                assert_eq!(options.project_id, 31775);
                assert_eq!(options.package_name, "dev-builds");
                assert!(options.file_name.is_none());
            }
            other => panic!("unexpected backend: {:?}", other),
        }
    }

    #[test]
    fn test_registry_config_feed() {
        let config: RegistryConfig = toml::from_str(
            r#"
            kind = "feed"
            url = "https://updates.example.com/my-ext/releases.json"
            "#,
        )
        .unwrap();
        assert!(matches!(config, RegistryConfig::Feed(_)));
    }

    #[test]
    fn test_registry_config_unknown_kind() {
        let result: Result<RegistryConfig, _> = toml::from_str(r#"kind = "npm""#);
        assert!(result.is_err());
    }
}
