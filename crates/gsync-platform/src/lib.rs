//! Operating-system glue shared by the bridge, the updater and the front-end.
//!
//! - Per-platform application directories.
//! - Executable probing for candidate binaries.
//! - The process invoker seam every external command goes through.

mod paths;
mod process;

pub use paths::{AppPaths, AppPathsError, is_executable_file};
pub use process::{HideWindow, InvocationResult, ProcessInvoker, SpawnError, SystemInvoker};
