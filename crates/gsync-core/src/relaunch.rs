use std::path::Path;
use std::process::Command;
use std::time::Duration;

use gsync_platform::HideWindow;
use log::info;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelaunchError {
    #[error("failed to get current executable: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("failed to spawn relaunch helper: {0}")]
    Spawn(#[source] std::io::Error),
}

/// A detached helper that waits `delay`, then starts `target`.
///
/// On macOS `target` is an app bundle handed to `open`; elsewhere it is the
/// executable itself.
#[must_use]
pub fn relaunch_command(target: &Path, delay: Duration) -> Command {
    let secs = delay.as_secs();

    #[cfg(windows)]
    {
        let mut command = Command::new("cmd");
        command
            .args([
                "/C",
                &format!(
                    "timeout /T {secs} /NOBREAK > NUL && start \"\" \"{}\"",
                    target.display()
                ),
            ])
            .hide_window();
        command
    }

    #[cfg(not(windows))]
    {
        let launch = if cfg!(target_os = "macos") {
            format!("open {}", shell_quote(&target.to_string_lossy()))
        } else {
            shell_quote(&target.to_string_lossy())
        };
        let mut command = Command::new("/bin/sh");
        command
            .args(["-c", &format!("sleep {secs} && {launch}")])
            .hide_window();
        command
    }
}

/// Spawn the relaunch helper. The caller exits right after.
///
/// # Errors
/// Returns an error if the executable path cannot be resolved or the helper
/// cannot be spawned.
pub fn relaunch(app_bundle: &Path, delay: Duration) -> Result<(), RelaunchError> {
    let target = if cfg!(target_os = "macos") {
        app_bundle.to_path_buf()
    } else {
        std::env::current_exe().map_err(RelaunchError::CurrentExe)?
    };

    info!("Relaunching {} in {}s", target.display(), delay.as_secs());
    relaunch_command(&target, delay)
        .spawn()
        .map_err(RelaunchError::Spawn)?;
    Ok(())
}

#[cfg(not(windows))]
fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}
