//! # ext-updater
//!
//! Self-update for editor extensions distributed outside a marketplace.
//!
//! This crate handles:
//! - Finding the newest release in a package registry (GitLab packages or a
//!   static JSON feed)
//! - Semantic-version comparison against the installed version
//! - Consent gating before download and before reload
//! - Streaming the package artifact to a scoped temporary file
//! - Handing the artifact to the host for installation
//!
//! The host environment (prompts, installation, reload) is injected through
//! [`ExtensionHost`], so the whole cycle runs without a real editor.

pub mod config;
pub mod descriptor;
pub mod download;
pub mod error;
pub mod host;
pub mod orchestrator;
#[cfg(test)]
mod proptests;
pub mod registry;
pub mod state;
pub mod version;

// Re-export main types for convenience
pub use config::{DownloaderConfig, RegistryConfig, UpdateOptions};
pub use descriptor::{ExtensionIdentity, PackageRecord, TagEntry, VersionDescriptor};
pub use download::{ArtifactFetcher, DownloadProgress, DownloadedArtifact, Downloader};
pub use error::UpdateError;
pub use host::{ExtensionHost, Prompt};
pub use orchestrator::{CycleOutcome, UpdateOrchestrator};
pub use registry::{
    build_registry, FeedOptions, FeedRegistry, GitLabOptions, GitLabRegistry, RegistryClient,
};
pub use state::{transition, CycleEvent, CycleState, Effect};
pub use version::compare;
