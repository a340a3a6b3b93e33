//! Update orchestrator - drives one update cycle end to end.
//!
//! The orchestrator combines the injected collaborators:
//! - RegistryClient for finding the newest release
//! - ArtifactFetcher for downloading it
//! - ExtensionHost for prompts, installation and reload
//!
//! Every step is awaited before the next one starts. A failure at any step
//! aborts the cycle and is returned to the caller; nothing is retried.

use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info};

use crate::config::{DownloaderConfig, RegistryConfig, UpdateOptions};
use crate::descriptor::{ExtensionIdentity, VersionDescriptor};
use crate::download::{ArtifactFetcher, DownloadedArtifact, Downloader};
use crate::error::UpdateError;
use crate::host::{up_to_date_notice, ExtensionHost, Prompt};
use crate::registry::{build_registry, RegistryClient};
use crate::state::{transition, CycleEvent, CycleState, Effect};
use crate::version;

/// How a cycle ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// No newer release; `latest` is what the registry reported
    UpToDate { latest: String },
    /// A release was offered and the user deferred it
    InstallDeclined { latest: String },
    /// The release was installed
    Installed { version: String, reload_requested: bool },
}

/// Runs update cycles for one extension.
///
/// # Example
///
/// ```ignore
/// let orchestrator = UpdateOrchestrator::new(identity, options, registry, fetcher, host);
/// match orchestrator.run_update_cycle().await? {
///     CycleOutcome::Installed { version, .. } => println!("installed {}", version),
///     _ => {}
/// }
/// ```
pub struct UpdateOrchestrator {
    /// Snapshot of the installed extension
    identity: ExtensionIdentity,
    options: UpdateOptions,
    registry: Arc<dyn RegistryClient>,
    fetcher: Arc<dyn ArtifactFetcher>,
    host: Arc<dyn ExtensionHost>,
    /// Last state reached by the current or most recent cycle
    state: Arc<RwLock<CycleState>>,
    /// Held for the duration of a cycle
    in_flight: Mutex<()>,
}

/// Values carried between the steps of one cycle.
#[derive(Default)]
struct CycleContext {
    latest: Option<VersionDescriptor>,
    artifact: Option<DownloadedArtifact>,
    installed: bool,
    reload_requested: bool,
}

impl UpdateOrchestrator {
    pub fn new(
        identity: ExtensionIdentity,
        options: UpdateOptions,
        registry: Arc<dyn RegistryClient>,
        fetcher: Arc<dyn ArtifactFetcher>,
        host: Arc<dyn ExtensionHost>,
    ) -> Self {
        Self {
            identity,
            options,
            registry,
            fetcher,
            host,
            state: Arc::new(RwLock::new(CycleState::Idle)),
            in_flight: Mutex::new(()),
        }
    }

    /// Build an orchestrator with the configured registry backend and the
    /// HTTP downloader.
    pub fn from_config(
        identity: ExtensionIdentity,
        options: UpdateOptions,
        registry: &RegistryConfig,
        download: &DownloaderConfig,
        host: Arc<dyn ExtensionHost>,
    ) -> Result<Self, UpdateError> {
        let registry = build_registry(registry, download)?;
        let fetcher = Arc::new(Downloader::with_config(download)?);
        Ok(Self::new(identity, options, registry, fetcher, host))
    }

    pub fn identity(&self) -> &ExtensionIdentity {
        &self.identity
    }

    pub fn options(&self) -> &UpdateOptions {
        &self.options
    }

    /// Last state reached. After a failed cycle this is the state the
    /// failure happened in.
    pub async fn state(&self) -> CycleState {
        *self.state.read().await
    }

    async fn set_state(&self, state: CycleState) {
        debug!("Update cycle state: {}", state);
        *self.state.write().await = state;
    }

    /// Check for a newer release, and if the user agrees download it,
    /// install it and offer a reload.
    ///
    /// Only one cycle runs at a time per orchestrator; a concurrent call
    /// fails with [`UpdateError::CycleInProgress`].
    pub async fn run_update_cycle(&self) -> Result<CycleOutcome, UpdateError> {
        let _guard = self
            .in_flight
            .try_lock()
            .map_err(|_| UpdateError::CycleInProgress)?;

        let mut ctx = CycleContext::default();
        let mut state = CycleState::Idle;
        let mut event = CycleEvent::Start;
        self.set_state(state).await;

        loop {
            let (next, effect) = transition(state, event, &self.options)?;
            state = next;
            self.set_state(state).await;

            match self.perform(effect, &mut ctx).await {
                Ok(Some(next_event)) => event = next_event,
                Ok(None) => break,
                Err(e) => {
                    error!("Update of '{}' failed while {}: {}", self.identity.display_name, state, e);
                    return Err(e);
                }
            }
        }

        let latest = ctx
            .latest
            .as_ref()
            .map(|l| l.version().to_string())
            .unwrap_or_default();

        let outcome = match state {
            CycleState::UpToDate => {
                if !self.options.show_up_to_date_confirmation {
                    info!("No update found for '{}'", self.identity.display_name);
                }
                CycleOutcome::UpToDate { latest }
            }
            _ if ctx.installed => CycleOutcome::Installed {
                version: latest,
                reload_requested: ctx.reload_requested,
            },
            _ => CycleOutcome::InstallDeclined { latest },
        };

        info!("Update cycle for '{}' finished: {:?}", self.identity.display_name, outcome);
        Ok(outcome)
    }

    /// Carry out one effect and report the resulting event, if any.
    async fn perform(
        &self,
        effect: Effect,
        ctx: &mut CycleContext,
    ) -> Result<Option<CycleEvent>, UpdateError> {
        let event = match effect {
            Effect::FetchLatest => {
                info!("Checking for updates for {}", self.identity.display_name);
                let latest = self.registry.fetch_latest(&self.identity).await?;
                let ordering = version::compare(latest.version(), &self.identity.installed_version)?;
                debug!(
                    "Latest {} vs installed {}: {:?}",
                    latest, self.identity.installed_version, ordering
                );
                ctx.latest = Some(latest);
                Some(CycleEvent::LatestFetched { ordering })
            }

            Effect::NotifyUpToDate => {
                info!("Extension up to date");
                self.host.notify(&up_to_date_notice(&self.identity)).await;
                None
            }

            Effect::AskInstall { auto_accept } => {
                let latest = self.latest(ctx)?;
                let consent = if auto_accept {
                    info!("Reinstalling {}", latest);
                    true
                } else {
                    info!("Newer version found: {}", latest);
                    self.host.confirm(&Prompt::install(&self.identity, latest)).await
                };
                if !consent {
                    info!("Update to {} deferred by user", latest.version());
                }
                Some(CycleEvent::InstallConsent(consent))
            }

            Effect::Download => {
                let latest = self.latest(ctx)?;
                info!("Downloading {}", self.identity.display_name);
                let artifact = self.fetcher.fetch(latest, &self.identity).await?;
                ctx.artifact = Some(artifact);
                Some(CycleEvent::Downloaded)
            }

            Effect::Install => {
                let artifact = ctx.artifact.as_ref().ok_or_else(|| {
                    UpdateError::Install("no downloaded artifact to install".to_string())
                })?;
                info!("Installing extension from {:?}", artifact.path());
                self.host.install(artifact.path()).await?;
                info!("Done installing extension from {:?}", artifact.path());
                ctx.installed = true;
                Some(CycleEvent::Installed)
            }

            Effect::AskReload => {
                let consent = self.host.confirm(&Prompt::reload(&self.identity)).await;
                Some(CycleEvent::ReloadConsent(consent))
            }

            Effect::Reload => {
                info!("Requesting host reload");
                ctx.reload_requested = true;
                self.host.reload().await;
                None
            }

            Effect::None => None,
        };

        Ok(event)
    }

    fn latest<'a>(&self, ctx: &'a CycleContext) -> Result<&'a VersionDescriptor, UpdateError> {
        ctx.latest
            .as_ref()
            .ok_or_else(|| UpdateError::Registry("no release fetched".to_string()))
    }
}
