use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use log::{debug, trace};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};

#[cfg(windows)]
use std::os::windows::process::CommandExt;

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

const READ_CHUNK: usize = 8192;

/// Keeps spawned console programs from flashing a window on Windows.
pub trait HideWindow {
    fn hide_window(&mut self) -> &mut Self;
}

impl HideWindow for tokio::process::Command {
    #[cfg(windows)]
    fn hide_window(&mut self) -> &mut Self {
        self.creation_flags(CREATE_NO_WINDOW)
    }

    #[cfg(not(windows))]
    fn hide_window(&mut self) -> &mut Self {
        self
    }
}

impl HideWindow for std::process::Command {
    #[cfg(windows)]
    fn hide_window(&mut self) -> &mut Self {
        self.creation_flags(CREATE_NO_WINDOW)
    }

    #[cfg(not(windows))]
    fn hide_window(&mut self) -> &mut Self {
        self
    }
}

/// The program could not be started or waited on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("failed to run {program}: {message}")]
pub struct SpawnError {
    pub program: String,
    pub kind: std::io::ErrorKind,
    pub message: String,
}

impl SpawnError {
    fn new(program: &Path, error: &std::io::Error) -> Self {
        Self {
            program: program.display().to_string(),
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// Outcome of a single external process run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationResult {
    /// Exit code, `None` when the process was terminated by a signal.
    pub code: Option<i32>,
    /// Standard output and standard error, interleaved in arrival order.
    pub output: Vec<u8>,
    /// Always 1: the invoker never retries on its own.
    pub attempts: u32,
}

impl InvocationResult {
    #[must_use]
    pub fn new(code: Option<i32>, output: impl Into<Vec<u8>>) -> Self {
        Self {
            code,
            output: output.into(),
            attempts: 1,
        }
    }

    #[must_use]
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Captured output as UTF-8. Malformed bytes yield an empty string.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8(self.output.clone()).unwrap_or_default()
    }
}

/// Runs an external program to completion and captures its combined output.
///
/// There is no timeout and no cancellation: a run ends when the child exits.
/// Implementations do not serialize concurrent runs.
#[async_trait]
pub trait ProcessInvoker: Send + Sync {
    async fn run(&self, program: &Path, args: &[String]) -> Result<InvocationResult, SpawnError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemInvoker;

impl SystemInvoker {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProcessInvoker for SystemInvoker {
    async fn run(&self, program: &Path, args: &[String]) -> Result<InvocationResult, SpawnError> {
        debug!("Spawning {} {}", program.display(), args.join(" "));

        let mut child = tokio::process::Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .hide_window()
            .spawn()
            .map_err(|error| SpawnError::new(program, &error))?;

        let mut stdout = child.stdout.take();
        let mut stderr = child.stderr.take();
        let mut out_buf = [0_u8; READ_CHUNK];
        let mut err_buf = [0_u8; READ_CHUNK];
        let mut output = Vec::new();

        while stdout.is_some() || stderr.is_some() {
            let chunk = tokio::select! {
                read = read_some(&mut stdout, &mut out_buf) => Chunk::Stdout(read),
                read = read_some(&mut stderr, &mut err_buf) => Chunk::Stderr(read),
            };

            match chunk {
                Chunk::Stdout(Ok(0)) => stdout = None,
                Chunk::Stderr(Ok(0)) => stderr = None,
                Chunk::Stdout(Ok(n)) => output.extend_from_slice(&out_buf[..n]),
                Chunk::Stderr(Ok(n)) => output.extend_from_slice(&err_buf[..n]),
                Chunk::Stdout(Err(error)) => {
                    debug!("stdout read failed, closing pipe: {error}");
                    stdout = None;
                }
                Chunk::Stderr(Err(error)) => {
                    debug!("stderr read failed, closing pipe: {error}");
                    stderr = None;
                }
            }
        }

        let status = child
            .wait()
            .await
            .map_err(|error| SpawnError::new(program, &error))?;

        debug!(
            "{} exited with {:?}, {} bytes captured",
            program.display(),
            status.code(),
            output.len()
        );
        trace!("output: {}", String::from_utf8_lossy(&output));

        Ok(InvocationResult::new(status.code(), output))
    }
}

enum Chunk {
    Stdout(std::io::Result<usize>),
    Stderr(std::io::Result<usize>),
}

async fn read_some<R>(pipe: &mut Option<R>, buf: &mut [u8]) -> std::io::Result<usize>
where
    R: AsyncRead + Unpin,
{
    match pipe {
        Some(reader) => reader.read(buf).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::{HideWindow, InvocationResult, ProcessInvoker, SystemInvoker};

    #[test]
    fn std_command_hide_window_is_chainable() {
        let mut cmd = std::process::Command::new("echo");
        let before = &raw mut cmd;
        let after = cmd.hide_window() as *mut std::process::Command;
        assert_eq!(before, after);
    }

    #[test]
    fn invocation_result_reports_success_only_for_zero() {
        assert!(InvocationResult::new(Some(0), "ok").success());
        assert!(!InvocationResult::new(Some(2), "bad").success());
        assert!(!InvocationResult::new(None, "").success());
        assert_eq!(InvocationResult::new(Some(0), "").attempts, 1);
    }

    #[test]
    fn invalid_utf8_output_degrades_to_empty_text() {
        let result = InvocationResult::new(Some(1), vec![0xff, 0xfe, 0x00]);

        assert_eq!(result.text(), "");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn system_invoker_merges_stdout_and_stderr() {
        let args = vec![
            "-c".to_string(),
            "printf out; printf err >&2; exit 3".to_string(),
        ];

        let result = SystemInvoker::new()
            .run(Path::new("/bin/sh"), &args)
            .await
            .expect("sh should spawn");

        assert_eq!(result.code, Some(3));
        let text = result.text();
        assert!(text.contains("out"));
        assert!(text.contains("err"));
        assert_eq!(text.len(), 6);
    }

    #[tokio::test]
    async fn system_invoker_reports_missing_program() {
        let error = SystemInvoker::new()
            .run(Path::new("/definitely/not/a/real/binary"), &[])
            .await
            .expect_err("missing binary should fail to spawn");

        assert_eq!(error.kind, std::io::ErrorKind::NotFound);
        assert!(error.program.contains("binary"));
    }
}
