use std::path::{Path, PathBuf};

use gsync_bridge::TOOL_NAME;
use gsync_core::{DEFAULT_CASK, DEFAULT_PACKAGE_MANAGER_PATHS, DEFAULT_TAP, RELEASES_ENDPOINT};
use gsync_platform::AppPaths;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_tool_name")]
    pub tool_name: String,

    #[serde(default)]
    pub extra_tool_paths: Vec<PathBuf>,

    #[serde(default = "default_release_endpoint")]
    pub release_endpoint: String,

    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,

    #[serde(default = "default_cask_name")]
    pub cask_name: String,

    #[serde(default = "default_tap_name")]
    pub tap_name: String,

    #[serde(default = "default_package_manager_paths")]
    pub package_manager_paths: Vec<PathBuf>,

    /// Defaults to `export.log` in the data directory.
    #[serde(default)]
    pub log_path: Option<PathBuf>,

    #[serde(default = "default_relaunch_delay")]
    pub relaunch_delay_secs: u64,

    #[serde(default = "default_app_bundle_path")]
    pub app_bundle_path: PathBuf,

    #[serde(default)]
    pub debug_logging: bool,

    #[serde(default = "default_max_log_size_bytes")]
    pub max_log_size_bytes: u64,

    #[serde(default = "default_true")]
    pub open_release_page_on_failure: bool,
}

fn default_true() -> bool {
    true
}

fn default_tool_name() -> String {
    TOOL_NAME.to_string()
}

fn default_release_endpoint() -> String {
    RELEASES_ENDPOINT.to_string()
}

fn default_http_timeout() -> u64 {
    10
}

fn default_cask_name() -> String {
    DEFAULT_CASK.to_string()
}

fn default_tap_name() -> String {
    DEFAULT_TAP.to_string()
}

fn default_package_manager_paths() -> Vec<PathBuf> {
    DEFAULT_PACKAGE_MANAGER_PATHS
        .iter()
        .map(PathBuf::from)
        .collect()
}

fn default_relaunch_delay() -> u64 {
    1
}

fn default_app_bundle_path() -> PathBuf {
    PathBuf::from("/Applications/Granola Sync.app")
}

fn default_max_log_size_bytes() -> u64 {
    5 * 1024 * 1024
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            tool_name: default_tool_name(),
            extra_tool_paths: Vec::new(),
            release_endpoint: default_release_endpoint(),
            http_timeout_secs: default_http_timeout(),
            cask_name: default_cask_name(),
            tap_name: default_tap_name(),
            package_manager_paths: default_package_manager_paths(),
            log_path: None,
            relaunch_delay_secs: default_relaunch_delay(),
            app_bundle_path: default_app_bundle_path(),
            debug_logging: false,
            max_log_size_bytes: default_max_log_size_bytes(),
            open_release_page_on_failure: true,
        }
    }
}

impl AppSettings {
    /// Settings from the default location. Never fails: anything unreadable
    /// falls back to defaults.
    pub fn load() -> Self {
        let Ok(paths) = AppPaths::new() else {
            return Self::default();
        };
        Self::load_from(&paths.settings_file())
    }

    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|error| {
                log::warn!("Ignoring malformed settings at {}: {error}", path.display());
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn save(&self) -> Result<(), std::io::Error> {
        let paths = AppPaths::new().map_err(std::io::Error::other)?;
        paths.ensure_dirs()?;
        self.save_to(&paths.settings_file())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
    }

    /// The configured export log, or the default one under `paths`.
    pub fn export_log_path(&self, paths: &AppPaths) -> PathBuf {
        self.log_path
            .clone()
            .unwrap_or_else(|| paths.export_log_file())
    }
}
