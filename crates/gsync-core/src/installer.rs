use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Local;
use gsync_platform::{ProcessInvoker, is_executable_file};
use log::{debug, info, warn};
use tokio::sync::mpsc;

use crate::log_sink::LogSink;

pub const DEFAULT_PACKAGE_MANAGER_PATHS: [&str; 2] =
    ["/opt/homebrew/bin/brew", "/usr/local/bin/brew"];
pub const DEFAULT_CASK: &str = "granola-sync";
pub const DEFAULT_TAP: &str = "mahmoudSalim/granola";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InstallState {
    #[default]
    Idle,
    Upgrading,
    FallingBack,
    Reinstalling,
    Uninstalling,
    Installing,
    Succeeded,
    Failed,
}

impl InstallState {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

impl fmt::Display for InstallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Idle => "Idle",
            Self::Upgrading => "Upgrading via Homebrew...",
            Self::FallingBack => "Upgrade failed, refreshing the tap...",
            Self::Reinstalling => "Reinstalling...",
            Self::Uninstalling => "Removing the installed copy...",
            Self::Installing => "Installing...",
            Self::Succeeded => "Update installed",
            Self::Failed => "Update failed",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    Succeeded,
    /// Every strategy failed; the caller should offer the release page.
    Failed { release_url: Option<String> },
    /// Another chain was already running. Nothing was attempted or logged.
    AlreadyRunning,
}

/// Applies an update through the package manager, falling back from
/// `upgrade` to `reinstall` to `uninstall` + `install`.
///
/// Clones share the busy flag, so at most one chain runs per installer.
#[derive(Clone)]
pub struct UpdateInstaller {
    invoker: Arc<dyn ProcessInvoker>,
    log: Arc<LogSink>,
    package_manager_paths: Vec<PathBuf>,
    cask: String,
    tap: String,
    running: Arc<AtomicBool>,
}

impl UpdateInstaller {
    #[must_use]
    pub fn new(invoker: Arc<dyn ProcessInvoker>, log: Arc<LogSink>) -> Self {
        Self {
            invoker,
            log,
            package_manager_paths: DEFAULT_PACKAGE_MANAGER_PATHS
                .iter()
                .map(PathBuf::from)
                .collect(),
            cask: DEFAULT_CASK.to_string(),
            tap: DEFAULT_TAP.to_string(),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    #[must_use]
    pub fn with_package_manager_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.package_manager_paths = paths;
        self
    }

    #[must_use]
    pub fn with_cask(mut self, cask: &str) -> Self {
        self.cask = cask.to_string();
        self
    }

    #[must_use]
    pub fn with_tap(mut self, tap: &str) -> Self {
        self.tap = tap.to_string();
        self
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn log(&self) -> &Arc<LogSink> {
        &self.log
    }

    /// Run the whole fallback chain to completion.
    ///
    /// Returns [`InstallOutcome::AlreadyRunning`] immediately when another run
    /// holds the busy flag.
    pub async fn run(
        &self,
        release_url: Option<&str>,
        progress: Option<mpsc::Sender<InstallState>>,
    ) -> InstallOutcome {
        let Some(_guard) = RunGuard::acquire(&self.running) else {
            info!("Update already in progress, ignoring request");
            return InstallOutcome::AlreadyRunning;
        };

        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        self.append(&format!("\n--- Update started at {timestamp} ---\n"));

        let succeeded = self.run_chain(progress.as_ref()).await;

        if succeeded {
            info!("Update chain succeeded");
            report(progress.as_ref(), InstallState::Succeeded).await;
            InstallOutcome::Succeeded
        } else {
            warn!("Update chain failed");
            report(progress.as_ref(), InstallState::Failed).await;
            InstallOutcome::Failed {
                release_url: release_url.map(str::to_string),
            }
        }
    }

    async fn run_chain(&self, progress: Option<&mpsc::Sender<InstallState>>) -> bool {
        let Some(package_manager) = self.locate_package_manager() else {
            warn!(
                "No package manager found in {:?}",
                self.package_manager_paths
            );
            self.append("Homebrew not found\n");
            return false;
        };
        let cask = self.cask.as_str();

        report(progress, InstallState::Upgrading).await;
        if self.step(&package_manager, &["upgrade", "--cask", cask]).await {
            return true;
        }

        report(progress, InstallState::FallingBack).await;
        self.step(&package_manager, &["tap", &self.tap]).await;

        report(progress, InstallState::Reinstalling).await;
        if self.step(&package_manager, &["reinstall", "--cask", cask]).await {
            return true;
        }

        // If uninstall succeeds and install fails the app is left removed;
        // the caller's manual-download fallback covers that case.
        report(progress, InstallState::Uninstalling).await;
        self.step(&package_manager, &["uninstall", "--cask", cask, "--force"])
            .await;

        report(progress, InstallState::Installing).await;
        self.step(&package_manager, &["install", "--cask", cask]).await
    }

    fn locate_package_manager(&self) -> Option<PathBuf> {
        self.package_manager_paths
            .iter()
            .find(|path| is_executable_file(path))
            .cloned()
    }

    /// Log the command line, run it, log its output, then report success.
    async fn step(&self, program: &Path, args: &[&str]) -> bool {
        let args: Vec<String> = args.iter().map(|arg| (*arg).to_string()).collect();
        let name = match program.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => program.display().to_string(),
        };

        info!("Running {name} {}", args.join(" "));
        self.append(&format!("$ {name} {}\n", args.join(" ")));

        match self.invoker.run(program, &args).await {
            Ok(result) => {
                let output = String::from_utf8_lossy(&result.output);
                self.append(&with_trailing_newline(&output));
                debug!("{name} {} exited with {:?}", args[0], result.code);
                result.success()
            }
            Err(error) => {
                self.append(&format!("{error}\n"));
                false
            }
        }
    }

    fn append(&self, text: &str) {
        let _ = self.log.append(text);
    }
}

async fn report(progress: Option<&mpsc::Sender<InstallState>>, state: InstallState) {
    if let Some(progress) = progress {
        let _ = progress.send(state).await;
    }
}

fn with_trailing_newline(text: &str) -> String {
    if text.is_empty() || text.ends_with('\n') {
        text.to_string()
    } else {
        format!("{text}\n")
    }
}

struct RunGuard<'a>(&'a AtomicBool);

impl<'a> RunGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
