//! GitLab package registry backend.
//!
//! Uses the project packages API (`/api/v4/projects/:id/packages`), sorted
//! by version descending so the newest package comes first. The listing does
//! not include a download link, so one is built from the package name,
//! version and artifact file name.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use crate::descriptor::{ExtensionIdentity, VersionDescriptor};
use crate::error::UpdateError;
use crate::registry::{fetch_first_record, RegistryClient};

/// Settings for the GitLab backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitLabOptions {
    /// GitLab host, e.g. `git.example.com`
    pub host: String,

    /// Numeric project ID (Settings > General > Project ID)
    pub project_id: u64,

    /// Package registry type, e.g. `generic`
    pub package_type: String,

    /// Package name, e.g. `dev-builds`
    pub package_name: String,

    /// Artifact file name (defaults to `<extension name>.vsix`)
    #[serde(default)]
    pub file_name: Option<String>,

    /// Override for `https://<host>`, for self-hosted instances behind a
    /// different scheme or port
    #[serde(default)]
    pub base_url: Option<String>,
}

/// Finds extension releases in a GitLab package registry.
pub struct GitLabRegistry {
    client: reqwest::Client,
    options: GitLabOptions,
    base_url: Url,
}

impl GitLabRegistry {
    pub fn new(client: reqwest::Client, options: GitLabOptions) -> Result<Self, UpdateError> {
        let base = match &options.base_url {
            Some(base) => base.clone(),
            None => format!("https://{}", options.host),
        };
        let base_url = Url::parse(base.trim_end_matches('/'))?;

        Ok(Self {
            client,
            options,
            base_url,
        })
    }

    /// `<base>/api/v4/projects/<id>` followed by `segments`, each one
    /// percent-encoded as a single path segment.
    fn project_url(&self, segments: &[&str]) -> Result<Url, UpdateError> {
        let mut url = self.base_url.clone();
        let project_id = self.options.project_id.to_string();
        url.path_segments_mut()
            .map_err(|_| UpdateError::Config(format!("cannot build URLs under {}", self.base_url)))?
            .pop_if_empty()
            .extend(["api", "v4", "projects", project_id.as_str()])
            .extend(segments);
        Ok(url)
    }

    /// Listing URL: fuzzy package name match, newest version first, packages
    /// in error or processing states skipped.
    pub fn version_url(&self) -> Result<Url, UpdateError> {
        let mut url = self.project_url(&["packages"])?;
        url.query_pairs_mut()
            .append_pair("sort", "desc")
            .append_pair("status", "default")
            .append_pair("order_by", "version")
            .append_pair("package_name", &self.options.package_name);
        Ok(url)
    }

    /// Download URL of one package file.
    pub fn download_url(&self, package_name: &str, version: &str, file_name: &str) -> Result<Url, UpdateError> {
        self.project_url(&[
            "packages",
            self.options.package_type.as_str(),
            package_name,
            version,
            file_name,
        ])
    }
}

#[async_trait]
impl RegistryClient for GitLabRegistry {
    async fn fetch_latest(&self, identity: &ExtensionIdentity) -> Result<VersionDescriptor, UpdateError> {
        let url = self.version_url()?;
        info!("Checking for new versions at {}", url);

        let record = fetch_first_record(&self.client, url.as_str()).await?;
        let name = record.required_name()?;
        let version = record.required_version()?;
        let download = self.download_url(name, version, &self.file_name(identity))?;
        debug!("Latest package {} {} at {}", name, version, download);

        VersionDescriptor::from_record(&record, download)
    }

    fn file_name(&self, identity: &ExtensionIdentity) -> String {
        self.options
            .file_name
            .clone()
            .unwrap_or_else(|| format!("{}.vsix", identity.name))
    }
}
