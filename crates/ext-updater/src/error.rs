//! Error types for the update system.

use thiserror::Error;

/// Errors that can occur during an update cycle.
#[derive(Debug, Error)]
pub enum UpdateError {
    /// Registry returned an empty or malformed listing
    #[error("registry error: {0}")]
    Registry(String),

    /// Registry listing request answered with a non-success status
    #[error("registry query failed with status {status}")]
    RegistryStatus { status: u16 },

    /// Artifact download answered with a non-success status
    #[error("download failed with status {status}")]
    Download { status: u16 },

    /// Artifact stream broke off mid-transfer
    #[error("download stream error: {0}")]
    DownloadStream(String),

    /// Host rejected the artifact
    #[error("installation failed: {0}")]
    Install(String),

    /// Low-level network failure
    #[error("transport error: {0}")]
    Transport(String),

    /// Version string could not be parsed
    #[error("version parse error: {0}")]
    Version(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Another cycle is already running on this orchestrator
    #[error("an update cycle is already in progress")]
    CycleInProgress,

    /// Event does not apply to the current state
    #[error("invalid transition: {event} in state {state}")]
    InvalidTransition { state: String, event: String },

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl UpdateError {
    /// Whether this error belongs to the registry stage.
    pub fn is_registry(&self) -> bool {
        matches!(self, Self::Registry(_) | Self::RegistryStatus { .. })
    }

    /// Whether this error belongs to the download stage.
    pub fn is_download(&self) -> bool {
        matches!(self, Self::Download { .. } | Self::DownloadStream(_))
    }
}

impl From<reqwest::Error> for UpdateError {
    fn from(err: reqwest::Error) -> Self {
        UpdateError::Transport(err.to_string())
    }
}

impl From<semver::Error> for UpdateError {
    fn from(err: semver::Error) -> Self {
        UpdateError::Version(err.to_string())
    }
}

impl From<url::ParseError> for UpdateError {
    fn from(err: url::ParseError) -> Self {
        UpdateError::Config(format!("invalid URL: {}", err))
    }
}
