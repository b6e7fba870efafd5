//! Update subsystem for Granola Sync.
//!
//! - Release discovery against the GitHub releases API and version comparison.
//! - The package-manager fallback chain that applies an update.
//! - The append-only log every installer step writes to.
//! - Transient session state and the post-update relaunch.

mod installer;
mod log_sink;
mod relaunch;
mod session;
mod update;

/// Package-manager fallback chain and its progress/outcome types.
pub use installer::{
    DEFAULT_CASK, DEFAULT_PACKAGE_MANAGER_PATHS, DEFAULT_TAP, InstallOutcome, InstallState,
    UpdateInstaller,
};
/// Append-only file log with an in-memory mirror.
pub use log_sink::LogSink;
/// Detached relaunch of the freshly installed app.
pub use relaunch::{RelaunchError, relaunch, relaunch_command};
/// Transient update state shared by the check and install flows.
pub use session::UpdateSession;
/// Release lookup and version comparison.
pub use update::{
    CHECK_TIMEOUT, CheckFailure, RELEASES_ENDPOINT, RELEASES_PAGE, UpdateCheck, UpdateChecker,
    VersionInfo, evaluate_release, is_newer_version, normalize_tag,
};
