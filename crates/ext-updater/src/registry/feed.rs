//! Static release feed backend.
//!
//! The feed is a JSON document served from any web host, holding the same
//! newest-first record array the GitLab API returns. Records may carry their
//! own `download_url`; otherwise the artifact is expected next to the feed at
//! `<feed dir>/<name>/<version>/<file name>`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;
use url::Url;

use crate::descriptor::{ExtensionIdentity, VersionDescriptor};
use crate::error::UpdateError;
use crate::registry::{fetch_first_record, RegistryClient};

/// Settings for the feed backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedOptions {
    /// URL of the JSON feed
    pub url: String,

    /// Artifact file name (defaults to `<extension name>.vsix`)
    #[serde(default)]
    pub file_name: Option<String>,
}

pub struct FeedRegistry {
    client: reqwest::Client,
    feed_url: Url,
    file_name: Option<String>,
}

impl FeedRegistry {
    pub fn new(client: reqwest::Client, options: FeedOptions) -> Result<Self, UpdateError> {
        Ok(Self {
            client,
            feed_url: Url::parse(&options.url)?,
            file_name: options.file_name,
        })
    }

    fn resolve_download(
        &self,
        embedded: Option<&str>,
        name: &str,
        version: &str,
        file_name: &str,
    ) -> Result<Url, UpdateError> {
        match embedded {
            // Relative links resolve against the feed location
            Some(link) => Ok(self.feed_url.join(link)?),
            None => {
                let mut url = self.feed_url.clone();
                url.set_query(None);
                url.set_fragment(None);
                url.path_segments_mut()
                    .map_err(|_| UpdateError::Config(format!("cannot build URLs under {}", self.feed_url)))?
                    .pop()
                    .extend([name, version, file_name]);
                Ok(url)
            }
        }
    }
}

#[async_trait]
impl RegistryClient for FeedRegistry {
    async fn fetch_latest(&self, identity: &ExtensionIdentity) -> Result<VersionDescriptor, UpdateError> {
        info!("Checking for new versions at {}", self.feed_url);

        let record = fetch_first_record(&self.client, self.feed_url.as_str()).await?;
        let download = self.resolve_download(
            record.download_url.as_deref(),
            record.required_name()?,
            record.required_version()?,
            &self.file_name(identity),
        )?;

        VersionDescriptor::from_record(&record, download)
    }

    fn file_name(&self, identity: &ExtensionIdentity) -> String {
        self.file_name
            .clone()
            .unwrap_or_else(|| format!("{}.vsix", identity.name))
    }
}
