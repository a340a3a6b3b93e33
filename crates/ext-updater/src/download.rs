//! Artifact downloader.
//!
//! Streams the release artifact into a scoped temporary file, reports
//! progress, records the byte count and SHA-256 digest, and waits a short
//! settling delay before handing the file on.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use sha2::{Digest, Sha256};
use tempfile::TempPath;
use tracing::{debug, error, info};
use url::Url;

use crate::config::DownloaderConfig;
use crate::descriptor::{ExtensionIdentity, VersionDescriptor};
use crate::error::UpdateError;

/// Fetches the artifact a descriptor points at.
#[async_trait]
pub trait ArtifactFetcher: Send + Sync {
    async fn fetch(
        &self,
        descriptor: &VersionDescriptor,
        identity: &ExtensionIdentity,
    ) -> Result<DownloadedArtifact, UpdateError>;
}

/// A downloaded package on local disk.
///
/// The file lives in the system temp directory and is removed when this
/// handle is dropped.
#[derive(Debug)]
pub struct DownloadedArtifact {
    path: TempPath,
    size: u64,
    sha256: [u8; 32],
}

impl DownloadedArtifact {
    pub fn new(path: TempPath, size: u64, sha256: [u8; 32]) -> Self {
        Self { path, size, sha256 }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn sha256_hex(&self) -> String {
        hex::encode(self.sha256)
    }
}

/// Progress callback type for download progress reporting.
pub type ProgressCallback = Arc<dyn Fn(DownloadProgress) + Send + Sync>;

/// HTTP artifact downloader.
pub struct Downloader {
    /// HTTP client configured with timeouts.
    client: reqwest::Client,
    /// Delay between stream completion and returning the artifact.
    settle_delay: Duration,
    /// Optional progress callback for reporting download progress.
    progress_callback: Option<ProgressCallback>,
}

impl Downloader {
    pub fn with_config(config: &DownloaderConfig) -> Result<Self, UpdateError> {
        Ok(Self {
            client: config.build_client()?,
            settle_delay: config.settle_delay(),
            progress_callback: None,
        })
    }

    /// Set the progress callback.
    pub fn set_progress_callback<F>(&mut self, callback: F)
    where
        F: Fn(DownloadProgress) + Send + Sync + 'static,
    {
        self.progress_callback = Some(Arc::new(callback));
    }

    /// Download `url` into a fresh temporary file named after `label`.
    ///
    /// Any status of 300 or above fails the download before a file is
    /// created.
    pub async fn download(&self, url: &Url, label: &str) -> Result<DownloadedArtifact, UpdateError> {
        info!("Downloading extension from {}", url);

        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if status.as_u16() >= 300 {
            error!("Download of {} failed with status {}", url, status);
            return Err(UpdateError::Download {
                status: status.as_u16(),
            });
        }

        let total = response.content_length().unwrap_or(0);
        let prefix = file_prefix(label);
        let mut file = temp_builder(&prefix).tempfile()?;
        let mut hasher = Sha256::new();
        let mut downloaded = 0u64;

        self.report_progress(downloaded, total);

        let mut stream = response.bytes_stream();
        while let Some(chunk_result) = stream.next().await {
            let chunk = chunk_result.map_err(|e| UpdateError::DownloadStream(e.to_string()))?;

            file.write_all(&chunk)?;
            hasher.update(&chunk);
            downloaded += chunk.len() as u64;

            self.report_progress(downloaded, total);
        }

        file.flush()?;
        file.as_file().sync_all()?;
        let path = file.into_temp_path();

        // Installing straight away can pick up a truncated file
        if !self.settle_delay.is_zero() {
            debug!("Waiting {:?} for the artifact to settle", self.settle_delay);
            tokio::time::sleep(self.settle_delay).await;
        }

        let artifact = DownloadedArtifact::new(path, downloaded, hasher.finalize().into());
        info!(
            "Done downloading extension package to {:?} ({} bytes, sha256 {})",
            artifact.path(),
            artifact.size(),
            artifact.sha256_hex()
        );
        Ok(artifact)
    }

    /// Report download progress via the callback if set.
    fn report_progress(&self, downloaded: u64, total: u64) {
        if let Some(callback) = &self.progress_callback {
            callback(DownloadProgress { downloaded, total });
        }
    }
}

#[async_trait]
impl ArtifactFetcher for Downloader {
    async fn fetch(
        &self,
        descriptor: &VersionDescriptor,
        identity: &ExtensionIdentity,
    ) -> Result<DownloadedArtifact, UpdateError> {
        self.download(descriptor.download_location(), &identity.display_name)
            .await
    }
}

/// File name prefix for `label`: path separators and characters most
/// filesystems reject become `-`.
fn file_prefix(label: &str) -> String {
    let prefix: String = label
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
            c if c.is_control() => '-',
            c => c,
        })
        .collect();
    match prefix.trim_matches('.') {
        "" => "extension".to_string(),
        trimmed => trimmed.to_string(),
    }
}

fn temp_builder(prefix: &str) -> tempfile::Builder<'_, 'static> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(prefix).suffix(".vsix");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(0o644));
    }
    builder
}

/// Download progress information.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadProgress {
    /// Bytes downloaded so far.
    pub downloaded: u64,
    /// Total bytes to download, 0 when the server did not say.
    pub total: u64,
}

impl DownloadProgress {
    /// Get download progress as a percentage (0.0 to 100.0).
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.downloaded as f64 / self.total as f64) * 100.0
        }
    }

    pub fn is_complete(&self) -> bool {
        self.downloaded >= self.total && self.total > 0
    }
}

impl std::fmt::Display for DownloadProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{} bytes ({:.1}%)",
            self.downloaded,
            self.total,
            self.percentage()
        )
    }
}
