//! Host environment collaborators.
//!
//! The host owns everything this crate does not: showing prompts, installing
//! an extension package and reloading itself. The orchestrator only calls
//! these and awaits the answer.

use std::path::Path;

use async_trait::async_trait;

use crate::descriptor::{ExtensionIdentity, VersionDescriptor};
use crate::error::UpdateError;

/// Answer label offered to proceed with download and installation.
pub const DOWNLOAD_AND_INSTALL: &str = "Download and Install";
/// Answer label offered to reload the host.
pub const RELOAD: &str = "Reload";
/// Answer label offered to defer.
pub const LATER: &str = "Later";

/// A binary question for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub message: String,
    pub accept: &'static str,
    pub decline: &'static str,
}

impl Prompt {
    /// Ask whether to download and install a newer release.
    pub fn install(identity: &ExtensionIdentity, latest: &VersionDescriptor) -> Self {
        Self {
            message: format!(
                "New version {} of '{}' is available.",
                latest.version(),
                identity.display_name
            ),
            accept: DOWNLOAD_AND_INSTALL,
            decline: LATER,
        }
    }

    /// Ask whether to reload now that the release is installed.
    pub fn reload(identity: &ExtensionIdentity) -> Self {
        Self {
            message: format!("New version of '{}' was installed.", identity.display_name),
            accept: RELOAD,
            decline: LATER,
        }
    }
}

/// Notice shown when the installed version is current.
pub fn up_to_date_notice(identity: &ExtensionIdentity) -> String {
    format!(
        "Extension up to date: '{} v{}'",
        identity.display_name, identity.installed_version
    )
}

/// Side effects the host environment provides.
#[async_trait]
pub trait ExtensionHost: Send + Sync {
    /// Present a binary choice; `true` means the user accepted.
    async fn confirm(&self, prompt: &Prompt) -> bool;

    /// Show an informational message.
    async fn notify(&self, message: &str);

    /// Install the package at `artifact`.
    async fn install(&self, artifact: &Path) -> Result<(), UpdateError>;

    /// Ask the host to restart. Fire and forget.
    async fn reload(&self);
}
