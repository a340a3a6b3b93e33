//! CLI command definitions and argument parsing

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use ext_updater::{CycleOutcome, ExtensionIdentity, UpdateError, UpdateOrchestrator};
use tracing::error;

use crate::config::{CliOverrides, Config};
use crate::host::CommandHost;
use crate::ExitCode;

/// Extension self-updater
#[derive(Parser, Debug)]
#[command(name = "ext-updater")]
#[command(version, about = "Check a package registry for a newer extension release and install it")]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Config file path
    #[arg(long, global = true, env = "EXT_UPDATER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Path to the extension's package.json
    #[arg(long, global = true)]
    pub manifest: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one update cycle: check, ask, download, install, offer reload
    Update(UpdateArgs),
    /// Only report the latest release, without downloading
    Check,
}

#[derive(clap::Args, Debug, Default)]
pub struct UpdateArgs {
    /// Reinstall the latest release whatever version is installed
    #[arg(long)]
    pub reinstall: bool,

    /// Print a notice when already up to date
    #[arg(long)]
    pub show_up_to_date: bool,

    /// Answer yes to every prompt
    #[arg(short = 'y', long)]
    pub yes: bool,
}

impl Cli {
    /// Overrides carried by the flags of this invocation
    pub fn overrides(&self) -> CliOverrides {
        let (re_install, show_up_to_date_confirmation) = match &self.command {
            Commands::Update(args) => (args.reinstall, args.show_up_to_date),
            Commands::Check => (false, false),
        };
        CliOverrides {
            manifest: self.manifest.clone(),
            re_install,
            show_up_to_date_confirmation,
        }
    }

    /// Execute the CLI command with a resolved configuration
    pub async fn execute_with_config(self, config: Config) -> anyhow::Result<ExitCode> {
        let identity = match ExtensionIdentity::from_manifest_file(&config.extension.manifest) {
            Ok(identity) => identity,
            Err(e) => {
                eprintln!(
                    "Error: cannot read extension manifest {}: {}",
                    config.extension.manifest.display(),
                    e
                );
                return Ok(ExitCode::InvalidInput);
            }
        };

        let registry = match config.registry() {
            Ok(registry) => registry.clone(),
            Err(e) => {
                eprintln!("Error: {}", e);
                return Ok(ExitCode::InvalidInput);
            }
        };

        match self.command {
            Commands::Update(args) => {
                let host = Arc::new(CommandHost::new(config.host.clone(), args.yes));
                let orchestrator = match UpdateOrchestrator::from_config(
                    identity,
                    config.options,
                    &registry,
                    &config.download,
                    host,
                ) {
                    Ok(orchestrator) => orchestrator,
                    Err(e) => {
                        eprintln!("Error: {}", e);
                        return Ok(ExitCode::from_update_error(&e));
                    }
                };

                match orchestrator.run_update_cycle().await {
                    Ok(outcome) => {
                        report(&outcome);
                        Ok(ExitCode::Success)
                    }
                    Err(e) => {
                        error!("Update failed: {}", e);
                        eprintln!("Error: failed to update {}: {}", orchestrator.identity().display_name, e);
                        Ok(ExitCode::from_update_error(&e))
                    }
                }
            }
            Commands::Check => {
                let registry = match ext_updater::build_registry(&registry, &config.download) {
                    Ok(registry) => registry,
                    Err(e) => {
                        eprintln!("Error: {}", e);
                        return Ok(ExitCode::from_update_error(&e));
                    }
                };
                let latest = registry
                    .fetch_latest(&identity)
                    .await
                    .and_then(|latest| {
                        let newer = ext_updater::version::is_newer(latest.version(), &identity.installed_version)?;
                        Ok((latest, newer))
                    });
                match latest {
                    Ok((latest, newer)) => {
                        println!("installed: {}", identity.installed_version);
                        println!("latest:    {}", latest);
                        println!("download:  {}", latest.download_location());
                        if newer {
                            println!("A newer version is available.");
                        }
                        Ok(ExitCode::Success)
                    }
                    Err(e) => {
                        eprintln!("Error: {}", e);
                        Ok(ExitCode::from_update_error(&e))
                    }
                }
            }
        }
    }
}

fn report(outcome: &CycleOutcome) {
    match outcome {
        CycleOutcome::UpToDate { .. } => {}
        CycleOutcome::InstallDeclined { latest } => {
            println!("Skipped version {}.", latest);
        }
        CycleOutcome::Installed { version, .. } => {
            println!("Installed version {}.", version);
        }
    }
}

impl ExitCode {
    /// Map a failed cycle to an exit code
    pub fn from_update_error(err: &UpdateError) -> Self {
        match err {
            e if e.is_registry() => ExitCode::RegistryError,
            e if e.is_download() => ExitCode::DownloadError,
            UpdateError::Install(_) => ExitCode::InstallError,
            UpdateError::Version(_) | UpdateError::Config(_) => ExitCode::InvalidInput,
            _ => ExitCode::GeneralError,
        }
    }
}
