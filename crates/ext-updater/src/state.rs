//! Update cycle state machine.
//!
//! ```text
//! Idle -> Checking -> UpToDate
//!                  -> AwaitingInstallConsent -> Done (declined)
//!                                            -> Downloading -> Installing
//!                                               -> AwaitingReloadConsent -> Done
//! ```
//!
//! [`transition`] is a pure function of (state, event, options). It returns
//! the next state and the effect the driver must perform; performing the
//! effect yields the next event. Failures are not events: the driver aborts
//! the cycle and returns the error.

use std::cmp::Ordering;
use std::fmt;

use crate::config::UpdateOptions;
use crate::error::UpdateError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CycleState {
    #[default]
    Idle,
    Checking,
    UpToDate,
    AwaitingInstallConsent,
    Downloading,
    Installing,
    AwaitingReloadConsent,
    Done,
}

impl CycleState {
    /// Whether the cycle has finished.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::UpToDate | Self::Done)
    }
}

impl fmt::Display for CycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Checking => "checking",
            Self::UpToDate => "up_to_date",
            Self::AwaitingInstallConsent => "awaiting_install_consent",
            Self::Downloading => "downloading",
            Self::Installing => "installing",
            Self::AwaitingReloadConsent => "awaiting_reload_consent",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// Completed step reported back to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleEvent {
    Start,
    /// Registry answered; `ordering` is latest compared to installed
    LatestFetched { ordering: Ordering },
    InstallConsent(bool),
    Downloaded,
    Installed,
    ReloadConsent(bool),
}

/// Work the driver performs after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    FetchLatest,
    NotifyUpToDate,
    /// Ask for install consent; when `auto_accept` is set the answer is yes
    /// without asking
    AskInstall { auto_accept: bool },
    Download,
    Install,
    AskReload,
    Reload,
    None,
}

/// Advance the cycle by one event.
pub fn transition(
    state: CycleState,
    event: CycleEvent,
    options: &UpdateOptions,
) -> Result<(CycleState, Effect), UpdateError> {
    use CycleEvent as E;
    use CycleState as S;

    let next = match (state, event) {
        (S::Idle, E::Start) => (S::Checking, Effect::FetchLatest),

        (S::Checking, E::LatestFetched { .. }) if options.re_install => {
            (S::AwaitingInstallConsent, Effect::AskInstall { auto_accept: true })
        }
        (S::Checking, E::LatestFetched { ordering: Ordering::Greater }) => {
            (S::AwaitingInstallConsent, Effect::AskInstall { auto_accept: false })
        }
        (S::Checking, E::LatestFetched { .. }) if options.show_up_to_date_confirmation => {
            (S::UpToDate, Effect::NotifyUpToDate)
        }
        (S::Checking, E::LatestFetched { .. }) => (S::UpToDate, Effect::None),

        (S::AwaitingInstallConsent, E::InstallConsent(true)) => (S::Downloading, Effect::Download),
        (S::AwaitingInstallConsent, E::InstallConsent(false)) => (S::Done, Effect::None),

        (S::Downloading, E::Downloaded) => (S::Installing, Effect::Install),

        (S::Installing, E::Installed) => (S::AwaitingReloadConsent, Effect::AskReload),

        (S::AwaitingReloadConsent, E::ReloadConsent(true)) => (S::Done, Effect::Reload),
        (S::AwaitingReloadConsent, E::ReloadConsent(false)) => (S::Done, Effect::None),

        (state, event) => {
            return Err(UpdateError::InvalidTransition {
                state: state.to_string(),
                event: format!("{:?}", event),
            })
        }
    };

    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(re_install: bool, show_up_to_date_confirmation: bool) -> UpdateOptions {
        UpdateOptions {
            re_install,
            show_up_to_date_confirmation,
        }
    }

    fn fetched(ordering: Ordering) -> CycleEvent {
        CycleEvent::LatestFetched { ordering }
    }

    #[test]
    fn test_start() {
        let next = transition(CycleState::Idle, CycleEvent::Start, &opts(false, false)).unwrap();
        assert_eq!(next, (CycleState::Checking, Effect::FetchLatest));
    }

    #[test]
    fn test_newer_version_asks() {
        let next = transition(CycleState::Checking, fetched(Ordering::Greater), &opts(false, false)).unwrap();
        assert_eq!(
            next,
            (CycleState::AwaitingInstallConsent, Effect::AskInstall { auto_accept: false })
        );
    }

    #[test]
    fn test_reinstall_ignores_ordering() {
        for ordering in [Ordering::Less, Ordering::Equal, Ordering::Greater] {
            let next = transition(CycleState::Checking, fetched(ordering), &opts(true, true)).unwrap();
            assert_eq!(
                next,
                (CycleState::AwaitingInstallConsent, Effect::AskInstall { auto_accept: true })
            );
        }
    }

    #[test]
    fn test_up_to_date() {
        for ordering in [Ordering::Less, Ordering::Equal] {
            let silent = transition(CycleState::Checking, fetched(ordering), &opts(false, false)).unwrap();
            assert_eq!(silent, (CycleState::UpToDate, Effect::None));

            let noisy = transition(CycleState::Checking, fetched(ordering), &opts(false, true)).unwrap();
            assert_eq!(noisy, (CycleState::UpToDate, Effect::NotifyUpToDate));
        }
    }

    #[test]
    fn test_install_consent() {
        let o = opts(false, false);
        assert_eq!(
            transition(CycleState::AwaitingInstallConsent, CycleEvent::InstallConsent(true), &o).unwrap(),
            (CycleState::Downloading, Effect::Download)
        );
        assert_eq!(
            transition(CycleState::AwaitingInstallConsent, CycleEvent::InstallConsent(false), &o).unwrap(),
            (CycleState::Done, Effect::None)
        );
    }

    #[test]
    fn test_download_install_reload() {
        let o = opts(false, false);
        assert_eq!(
            transition(CycleState::Downloading, CycleEvent::Downloaded, &o).unwrap(),
            (CycleState::Installing, Effect::Install)
        );
        assert_eq!(
            transition(CycleState::Installing, CycleEvent::Installed, &o).unwrap(),
            (CycleState::AwaitingReloadConsent, Effect::AskReload)
        );
        assert_eq!(
            transition(CycleState::AwaitingReloadConsent, CycleEvent::ReloadConsent(true), &o).unwrap(),
            (CycleState::Done, Effect::Reload)
        );
        assert_eq!(
            transition(CycleState::AwaitingReloadConsent, CycleEvent::ReloadConsent(false), &o).unwrap(),
            (CycleState::Done, Effect::None)
        );
    }

    #[test]
    fn test_invalid_transitions() {
        let o = opts(false, false);
        assert!(matches!(
            transition(CycleState::Idle, CycleEvent::Downloaded, &o),
            Err(UpdateError::InvalidTransition { .. })
        ));
        assert!(transition(CycleState::Done, CycleEvent::Start, &o).is_err());
        assert!(transition(CycleState::UpToDate, CycleEvent::InstallConsent(true), &o).is_err());
        assert!(transition(CycleState::Downloading, CycleEvent::Installed, &o).is_err());
    }

    #[test]
    fn test_terminal_states() {
        assert!(CycleState::UpToDate.is_terminal());
        assert!(CycleState::Done.is_terminal());
        assert!(!CycleState::AwaitingReloadConsent.is_terminal());
        assert_eq!(CycleState::default(), CycleState::Idle);
    }
}
