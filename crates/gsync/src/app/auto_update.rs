//! Update checks, Homebrew install and relaunch.
//!
//! Handles messages: `CheckForUpdates`, `UpdateCheckFinished`, `StartUpdate`,
//! `UpdateProgress`, `UpdateFinished`, `Relaunch`

use std::fmt::Write as _;
use std::time::Duration;

use gsync_core::{InstallOutcome, RELEASES_PAGE, UpdateCheck};
use log::{debug, info, warn};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::AppError;
use crate::message::Message;
use crate::state::{Alert, PendingCheck};

use super::App;

impl App {
    /// Start a check unless one that should win is already pending.
    ///
    /// An interactive request replaces a pending silent one; every other
    /// overlap keeps the pending check.
    pub(super) fn handle_check_for_updates(&mut self, interactive: bool) {
        if self.state.update.installing {
            return;
        }
        if let Some(pending) = &self.state.pending_check {
            if pending.interactive || !interactive {
                return;
            }
            debug!("Replacing silent update check {}", pending.generation);
            pending.cancel.cancel();
        }

        self.state.check_generation += 1;
        let generation = self.state.check_generation;
        let cancel = CancellationToken::new();
        self.state.pending_check = Some(PendingCheck {
            generation,
            interactive,
            cancel: cancel.clone(),
        });
        self.state.update.start_check();

        let checker = self.checker.clone();
        self.perform(async move {
            tokio::select! {
                () = cancel.cancelled() => Message::NoOp,
                check = checker.check() => Message::UpdateCheckFinished {
                    generation,
                    interactive,
                    check,
                },
            }
        });
    }

    pub(super) fn handle_update_check_finished(
        &mut self,
        generation: u64,
        interactive: bool,
        check: UpdateCheck,
    ) {
        let is_current = self
            .state
            .pending_check
            .as_ref()
            .is_some_and(|pending| pending.generation == generation);
        if !is_current {
            debug!("Dropping stale update check {generation}");
            return;
        }
        self.state.pending_check = None;
        self.state.update.apply_check(&check);

        match &check {
            UpdateCheck::Available(info) => {
                info!(
                    "Update available: {} -> {}",
                    info.current_version, info.latest_version
                );
                if interactive {
                    self.state.alert = Some(Alert::new(
                        "Update Available",
                        format!(
                            "Granola Sync v{} is available. You have v{}.",
                            info.latest_version, info.current_version
                        ),
                    ));
                }
            }
            UpdateCheck::UpToDate { current } => {
                if interactive {
                    self.state.alert = Some(Alert::new(
                        "Up to Date",
                        format!("You're running the latest version (v{current})."),
                    ));
                }
            }
            UpdateCheck::Failed(failure) => {
                warn!("Update check failed: {failure}");
                if interactive {
                    self.state.last_error = Some(AppError::from(failure.clone()));
                    self.state.alert = Some(Alert::new(
                        "Update Check Failed",
                        "Could not check for updates. Try again later.",
                    ));
                }
            }
        }
        self.state.last_check = Some(check);
    }

    pub(super) fn handle_start_update(&mut self) {
        if !self.state.update.start_install() {
            return;
        }
        if let Some(pending) = self.state.pending_check.take() {
            pending.cancel.cancel();
            self.state.update.checking = false;
        }
        self.state.manual_download_url = None;
        self.state.export_output.clear();

        let release_url = self
            .state
            .update
            .release_url()
            .unwrap_or(RELEASES_PAGE)
            .to_string();
        let installer = self.installer.clone();
        let sender = self.sender();

        tokio::spawn(async move {
            let (progress_tx, mut progress_rx) = mpsc::channel(8);
            let run = installer.run(Some(&release_url), Some(progress_tx));
            let forward = async {
                while let Some(state) = progress_rx.recv().await {
                    let _ = sender.send(Message::UpdateProgress(state));
                }
            };
            let (outcome, ()) = tokio::join!(run, forward);
            let _ = sender.send(Message::UpdateFinished(outcome));
        });
    }

    pub(super) fn handle_update_finished(&mut self, outcome: InstallOutcome) {
        self.state.update.finish_install(&outcome);

        let InstallOutcome::Failed { release_url } = outcome else {
            return;
        };
        let url = release_url.unwrap_or_else(|| RELEASES_PAGE.to_string());

        let mut opened = false;
        if self.settings.open_release_page_on_failure {
            match open::that(&url) {
                Ok(()) => opened = true,
                Err(error) => warn!("Failed to open {url}: {error}"),
            }
        }
        let output = &mut self.state.export_output;
        if opened {
            output.push_str("Homebrew update failed. Opened the release page.\n");
        } else {
            let _ = writeln!(output, "Homebrew update failed. Download it from {url}");
        }
        self.state.manual_download_url = Some(url);
    }

    pub(super) fn handle_relaunch(&mut self) {
        if !self.state.update.ready_to_relaunch {
            return;
        }
        let delay = Duration::from_secs(self.settings.relaunch_delay_secs);
        match gsync_core::relaunch(&self.settings.app_bundle_path, delay) {
            Ok(()) => {
                info!("Relaunching in {}s", delay.as_secs());
                self.state.update.reset();
                self.state.should_exit = true;
            }
            Err(error) => {
                warn!("Relaunch failed: {error}");
                self.state.last_error = Some(AppError::RelaunchFailed(error.to_string()));
            }
        }
    }
}
