use crate::installer::{InstallOutcome, InstallState};
use crate::update::{UpdateCheck, VersionInfo};

/// What the update flows last reported. Starts empty; relaunch resets it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateSession {
    pub checking: bool,
    pub installing: bool,
    pub available: Option<VersionInfo>,
    pub message: String,
    pub install_state: InstallState,
    pub ready_to_relaunch: bool,
}

impl UpdateSession {
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.checking || self.installing
    }

    pub fn start_check(&mut self) {
        self.checking = true;
        self.message = "Checking for updates...".to_string();
    }

    pub fn apply_check(&mut self, check: &UpdateCheck) {
        self.checking = false;
        match check {
            UpdateCheck::Available(info) => {
                self.message = format!("Update available: v{}", info.latest_version);
                self.available = Some(info.clone());
            }
            UpdateCheck::UpToDate { current } => {
                self.message = format!("You're up to date (v{current})");
                self.available = None;
            }
            // Keep whatever was known before; a failed check says nothing new.
            UpdateCheck::Failed(failure) => {
                self.message = format!("Update check failed: {failure}");
            }
        }
    }

    /// Mark an install as started. `false` when one is already running.
    pub fn start_install(&mut self) -> bool {
        if self.installing {
            return false;
        }
        self.installing = true;
        self.ready_to_relaunch = false;
        self.install_state = InstallState::Idle;
        self.message = "Updating...".to_string();
        true
    }

    pub fn apply_progress(&mut self, state: InstallState) {
        self.install_state = state;
        self.message = state.to_string();
    }

    pub fn finish_install(&mut self, outcome: &InstallOutcome) {
        match outcome {
            InstallOutcome::Succeeded => {
                self.installing = false;
                self.install_state = InstallState::Succeeded;
                self.available = None;
                self.ready_to_relaunch = true;
                self.message = "Updated! Relaunch to use the new version.".to_string();
            }
            InstallOutcome::Failed { .. } => {
                self.installing = false;
                self.install_state = InstallState::Failed;
                self.message =
                    "Homebrew update failed. Download the new version manually.".to_string();
            }
            InstallOutcome::AlreadyRunning => {
                self.installing = false;
                self.message = "An update is already in progress".to_string();
            }
        }
    }

    /// Release page of the known available version, if any.
    #[must_use]
    pub fn release_url(&self) -> Option<&str> {
        self.available
            .as_ref()
            .map(|info| info.release_url.as_str())
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
