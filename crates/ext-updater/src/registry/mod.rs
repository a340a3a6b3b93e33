//! Registry backends.
//!
//! A registry answers one question: what is the newest release of this
//! extension, and where can its artifact be fetched? Backends implement
//! [`RegistryClient`] and are picked by [`RegistryConfig`].
//!
//! Contract for implementers:
//! - return the newest descriptor by the backend's own ordering; callers
//!   never re-sort
//! - the descriptor's download location must point straight at the artifact
//! - one call is one round trip, with no caching and no shared state
//! - unparsable publication times become epoch zero

pub mod feed;
pub mod gitlab;

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use tracing::debug;

use crate::config::{DownloaderConfig, RegistryConfig};
use crate::descriptor::{ExtensionIdentity, PackageRecord, VersionDescriptor};
use crate::error::UpdateError;

pub use feed::{FeedOptions, FeedRegistry};
pub use gitlab::{GitLabOptions, GitLabRegistry};

/// Source of the latest release of an extension.
#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// Query the backend for the newest release.
    async fn fetch_latest(&self, identity: &ExtensionIdentity) -> Result<VersionDescriptor, UpdateError>;

    /// File name of the artifact within the registry.
    fn file_name(&self, identity: &ExtensionIdentity) -> String {
        format!("{}.vsix", identity.name)
    }
}

/// Build the backend selected by configuration.
pub fn build_registry(
    config: &RegistryConfig,
    http: &DownloaderConfig,
) -> Result<Arc<dyn RegistryClient>, UpdateError> {
    let client = http.build_client()?;
    let registry: Arc<dyn RegistryClient> = match config {
        RegistryConfig::GitLab(options) => Arc::new(GitLabRegistry::new(client, options.clone())?),
        RegistryConfig::Feed(options) => Arc::new(FeedRegistry::new(client, options.clone())?),
    };
    Ok(registry)
}

/// GET a newest-first JSON array of package records and return its first
/// element.
pub(crate) async fn fetch_first_record(
    client: &reqwest::Client,
    url: &str,
) -> Result<PackageRecord, UpdateError> {
    debug!("Querying registry: {}", url);

    let response = client
        .get(url)
        .header(ACCEPT, "application/json")
        .send()
        .await?;

    let status = response.status();
    if status.as_u16() >= 300 {
        return Err(UpdateError::RegistryStatus {
            status: status.as_u16(),
        });
    }

    let body = response.text().await?;
    let records: Vec<PackageRecord> = match serde_json::from_str(&body) {
        Ok(records) => records,
        Err(e) => {
            debug!("Unexpected registry response: {}", body);
            return Err(UpdateError::Registry(format!(
                "unexpected response from registry: {}",
                e
            )));
        }
    };

    debug!("Registry listed {} package(s)", records.len());

    records
        .into_iter()
        .next()
        .ok_or_else(|| UpdateError::Registry("registry returned no packages".to_string()))
}
