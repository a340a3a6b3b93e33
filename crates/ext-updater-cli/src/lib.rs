//! ext-updater CLI - runs extension update cycles from a terminal
//!
//! This crate provides:
//! - TOML configuration with command-line overrides
//! - A console host that prompts on stderr and installs through the
//!   editor's command line

pub mod cli;
pub mod config;
pub mod host;

pub use cli::Cli;
pub use config::{CliOverrides, Config};

/// Exit codes for CLI operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// Operation completed successfully (exit code 0)
    Success = 0,
    /// General error (exit code 1)
    GeneralError = 1,
    /// Registry query failed (exit code 2)
    RegistryError = 2,
    /// Artifact download failed (exit code 3)
    DownloadError = 3,
    /// Host rejected the package (exit code 4)
    InstallError = 4,
    /// Invalid arguments, config or manifest (exit code 5)
    InvalidInput = 5,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl ExitCode {
    /// Convert to process exit code
    pub fn to_exit_code(self) -> std::process::ExitCode {
        std::process::ExitCode::from(self as u8)
    }
}
