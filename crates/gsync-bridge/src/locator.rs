use std::ffi::OsString;
use std::path::{Path, PathBuf};

use gsync_platform::is_executable_file;
use log::debug;

use crate::error::BridgeError;

pub const TOOL_NAME: &str = "granola-sync";

/// Resolves the tool binary from a fixed, ordered candidate list with a
/// search-path lookup as the last resort.
///
/// Nothing is cached: the updater can install or remove the tool between
/// two calls, so every bridge call locates it again.
#[derive(Debug, Clone)]
pub struct ToolLocator {
    name: String,
    app_relative: Vec<PathBuf>,
    extra: Vec<PathBuf>,
    system: Vec<PathBuf>,
    search_path: Option<OsString>,
}

impl ToolLocator {
    /// Candidates derived from where the running executable lives.
    #[must_use]
    pub fn new(name: &str) -> Self {
        let exe = std::env::current_exe().ok();
        Self {
            name: name.to_string(),
            app_relative: app_relative_candidates(name, exe.as_deref()),
            extra: Vec::new(),
            system: system_candidates(name),
            search_path: None,
        }
    }

    /// Use exactly `candidates`, in order, before the search-path lookup.
    #[must_use]
    pub fn with_candidates(name: &str, candidates: Vec<PathBuf>) -> Self {
        Self {
            name: name.to_string(),
            app_relative: Vec::new(),
            extra: Vec::new(),
            system: candidates,
            search_path: None,
        }
    }

    /// Extra user-configured locations, tried after the bundled and
    /// development locations but before the common system directories.
    #[must_use]
    pub fn with_extra_paths(mut self, extra: Vec<PathBuf>) -> Self {
        self.extra = extra;
        self
    }

    /// Replace `PATH` for the final lookup.
    #[must_use]
    pub fn with_search_path(mut self, search_path: impl Into<OsString>) -> Self {
        self.search_path = Some(search_path.into());
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Every fixed candidate in the order `locate` probes them.
    #[must_use]
    pub fn candidates(&self) -> Vec<PathBuf> {
        self.app_relative
            .iter()
            .chain(&self.extra)
            .chain(&self.system)
            .cloned()
            .collect()
    }

    /// Return the first executable candidate, else the search-path match.
    ///
    /// # Errors
    /// Returns [`BridgeError::NotFound`] listing every location tried, in order.
    pub fn locate(&self) -> Result<PathBuf, BridgeError> {
        let candidates = self.candidates();
        let mut searched = Vec::with_capacity(candidates.len() + 1);

        for candidate in &candidates {
            searched.push(candidate.display().to_string());
            if is_executable_file(candidate) {
                debug!("Found {} at {}", self.name, candidate.display());
                return Ok(candidate.clone());
            }
        }

        searched.push(format!("which {}", self.name));
        if let Some(path) = self.search() {
            debug!("Found {} on search path: {}", self.name, path.display());
            return Ok(path);
        }

        Err(BridgeError::NotFound {
            tool: self.name.clone(),
            searched,
        })
    }

    fn search(&self) -> Option<PathBuf> {
        match &self.search_path {
            Some(paths) => {
                let cwd = std::env::current_dir().ok()?;
                which::which_in(&self.name, Some(paths), cwd).ok()
            }
            None => which::which(&self.name).ok(),
        }
    }
}

/// The bundled location, then the development checkout's virtualenv.
fn app_relative_candidates(name: &str, exe: Option<&Path>) -> Vec<PathBuf> {
    let Some(root) = exe.and_then(app_root) else {
        return Vec::new();
    };

    let mut paths = vec![bundled_tool_path(&root, name)];
    if let Some(checkout) = root.parent().and_then(Path::parent) {
        paths.push(checkout.join(".venv").join("bin").join(name));
    }
    paths
}

fn system_candidates(name: &str) -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".local").join("bin").join(name));
    }

    #[cfg(unix)]
    {
        paths.push(PathBuf::from("/usr/local/bin").join(name));
        paths.push(PathBuf::from("/opt/homebrew/bin").join(name));
    }

    paths
}

/// The enclosing `.app` bundle, or the executable's directory when unbundled.
fn app_root(exe: &Path) -> Option<PathBuf> {
    exe.ancestors()
        .find(|ancestor| ancestor.extension().is_some_and(|ext| ext == "app"))
        .or_else(|| exe.parent())
        .map(Path::to_path_buf)
}

fn bundled_tool_path(root: &Path, name: &str) -> PathBuf {
    let env_dir = if root.extension().is_some_and(|ext| ext == "app") {
        root.join("Contents").join("Resources").join("python-env")
    } else {
        root.join("python-env")
    };
    env_dir.join("bin").join(name)
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use super::{ToolLocator, app_relative_candidates, app_root, bundled_tool_path};
    use crate::error::BridgeError;

    fn write_tool(path: &Path, executable: bool) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("parent dir should be created");
        }
        std::fs::write(path, "#!/bin/sh\necho ok\n").expect("tool should be written");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = if executable { 0o755 } else { 0o644 };
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
                .expect("permissions should be set");
        }
        #[cfg(not(unix))]
        let _ = executable;
    }

    #[test]
    fn returns_first_existing_executable_in_priority_order() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let missing = temp.path().join("bundle/granola-sync");
        let second = temp.path().join("dev/granola-sync");
        let third = temp.path().join("system/granola-sync");
        write_tool(&second, true);
        write_tool(&third, true);

        let locator = ToolLocator::with_candidates(
            "granola-sync",
            vec![missing, second.clone(), third],
        )
        .with_search_path(temp.path().join("empty"));

        assert_eq!(locator.locate(), Ok(second));
    }

    #[cfg(unix)]
    #[test]
    fn skips_candidates_that_are_not_executable() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let plain = temp.path().join("a/granola-sync");
        let runnable = temp.path().join("b/granola-sync");
        write_tool(&plain, false);
        write_tool(&runnable, true);

        let locator = ToolLocator::with_candidates("granola-sync", vec![plain, runnable.clone()])
            .with_search_path(temp.path().join("empty"));

        assert_eq!(locator.locate(), Ok(runnable));
    }

    #[test]
    fn not_found_preserves_full_search_order() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let first = temp.path().join("one/granola-sync");
        let second = temp.path().join("two/granola-sync");

        let locator =
            ToolLocator::with_candidates("granola-sync", vec![first.clone(), second.clone()])
                .with_search_path(temp.path().join("empty"));

        assert_eq!(
            locator.locate(),
            Err(BridgeError::NotFound {
                tool: "granola-sync".to_string(),
                searched: vec![
                    first.display().to_string(),
                    second.display().to_string(),
                    "which granola-sync".to_string(),
                ],
            })
        );
    }

    #[cfg(unix)]
    #[test]
    fn falls_back_to_search_path_lookup() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let bin_dir = temp.path().join("bin");
        let on_path = bin_dir.join("granola-sync");
        write_tool(&on_path, true);

        let locator = ToolLocator::with_candidates(
            "granola-sync",
            vec![temp.path().join("missing/granola-sync")],
        )
        .with_search_path(&bin_dir);

        let found = locator.locate().expect("search path should resolve the tool");
        assert_eq!(
            found.canonicalize().expect("found path should exist"),
            on_path.canonicalize().expect("tool path should exist")
        );
    }

    #[test]
    fn is_re_resolved_on_every_call() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let tool = temp.path().join("granola-sync");
        let locator = ToolLocator::with_candidates("granola-sync", vec![tool.clone()])
            .with_search_path(temp.path().join("empty"));

        assert!(locator.locate().is_err());
        write_tool(&tool, true);
        assert_eq!(locator.locate(), Ok(tool.clone()));
        std::fs::remove_file(&tool).expect("tool should be removed");
        assert!(locator.locate().is_err());
    }

    #[test]
    fn extra_paths_sit_between_dev_checkout_and_system_dirs() {
        let custom = PathBuf::from("/custom/granola-sync");

        let locator = ToolLocator::new("granola-sync").with_extra_paths(vec![custom.clone()]);
        let candidates = locator.candidates();

        let position = candidates
            .iter()
            .position(|candidate| candidate == &custom)
            .expect("extra path should be a candidate");
        assert_eq!(position, 2);
        assert!(candidates[0].ends_with("python-env/bin/granola-sync"));
        assert!(candidates[1].ends_with(".venv/bin/granola-sync"));
    }

    #[test]
    fn app_bundle_resolves_to_resources_env() {
        let exe = Path::new("/proj/build/Granola Sync.app/Contents/MacOS/GranolaSync");

        let root = app_root(exe).expect("bundle root should be found");

        assert_eq!(root, PathBuf::from("/proj/build/Granola Sync.app"));
        assert_eq!(
            bundled_tool_path(&root, "granola-sync"),
            PathBuf::from(
                "/proj/build/Granola Sync.app/Contents/Resources/python-env/bin/granola-sync"
            )
        );
    }

    #[test]
    fn app_relative_candidates_are_bundle_then_checkout() {
        let exe = Path::new("/proj/build/Granola Sync.app/Contents/MacOS/GranolaSync");

        let candidates = app_relative_candidates("granola-sync", Some(exe));

        assert_eq!(candidates.len(), 2);
        assert_eq!(
            candidates[0],
            PathBuf::from(
                "/proj/build/Granola Sync.app/Contents/Resources/python-env/bin/granola-sync"
            )
        );
        assert_eq!(candidates[1], PathBuf::from("/proj/.venv/bin/granola-sync"));
    }
}
