//! Terminal host: prompts on the console and runs editor commands.

use std::io::{self, BufRead, Write};
use std::path::Path;

use async_trait::async_trait;
use ext_updater::{ExtensionHost, Prompt, UpdateError};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::config::{HostConfig, FILE_PLACEHOLDER};

/// Host backed by the console and external editor commands.
pub struct CommandHost {
    config: HostConfig,
    /// Answer every prompt with yes
    assume_yes: bool,
}

impl CommandHost {
    pub fn new(config: HostConfig, assume_yes: bool) -> Self {
        Self { config, assume_yes }
    }

    /// Substitute the artifact path into the install command.
    pub fn install_args(&self, artifact: &Path) -> Vec<String> {
        let file = artifact.to_string_lossy();
        let mut args: Vec<String> = self
            .config
            .install_command
            .iter()
            .map(|arg| arg.replace(FILE_PLACEHOLDER, &file))
            .collect();
        if !self.config.install_command.iter().any(|a| a.contains(FILE_PLACEHOLDER)) {
            args.push(file.into_owned());
        }
        args
    }
}

/// Read a `y/N` answer; anything but `y`/`yes` declines.
pub fn read_answer(input: &mut impl BufRead) -> io::Result<bool> {
    let mut line = String::new();
    input.read_line(&mut line)?;
    let answer = line.trim();
    Ok(answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes"))
}

#[async_trait]
impl ExtensionHost for CommandHost {
    async fn confirm(&self, prompt: &Prompt) -> bool {
        if self.assume_yes {
            info!("{} -> {}", prompt.message, prompt.accept);
            return true;
        }

        let question = format!("{} {}? [y/N] ", prompt.message, prompt.accept);
        let answer = tokio::task::spawn_blocking(move || {
            eprint!("{}", question);
            io::stderr().flush()?;
            read_answer(&mut io::stdin().lock())
        })
        .await;

        match answer {
            Ok(Ok(accepted)) => accepted,
            Ok(Err(e)) => {
                warn!("Could not read answer, treating as '{}': {}", prompt.decline, e);
                false
            }
            Err(e) => {
                warn!("Prompt task failed, treating as '{}': {}", prompt.decline, e);
                false
            }
        }
    }

    async fn notify(&self, message: &str) {
        println!("{}", message);
    }

    async fn install(&self, artifact: &Path) -> Result<(), UpdateError> {
        let args = self.install_args(artifact);
        let (program, rest) = args
            .split_first()
            .ok_or_else(|| UpdateError::Config("empty install command".to_string()))?;
        debug!("Running install command: {:?}", args);

        let output = Command::new(program)
            .args(rest)
            .output()
            .await
            .map_err(|e| UpdateError::Install(format!("failed to run {}: {}", program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(UpdateError::Install(format!(
                "{} exited with {}: {}",
                program,
                output.status,
                stderr.trim()
            )));
        }

        Ok(())
    }

    async fn reload(&self) {
        let Some((program, rest)) = self.config.reload_command.split_first() else {
            println!("Reload the editor window to activate the new version.");
            return;
        };

        match Command::new(program).args(rest).status().await {
            Ok(status) if status.success() => {}
            Ok(status) => warn!("Reload command exited with {}", status),
            Err(e) => warn!("Failed to run reload command {}: {}", program, e),
        }
    }
}
