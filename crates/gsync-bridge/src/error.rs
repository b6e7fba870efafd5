use gsync_platform::SpawnError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// No candidate location held an executable tool.
    #[error("{tool} binary not found. Searched:\n{}", .searched.join("\n"))]
    NotFound { tool: String, searched: Vec<String> },

    /// The tool exited non-zero (or could not be started); carries its output.
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    /// The output did not match the expected shape; carries the raw output.
    #[error("Decoding failed: {0}")]
    DecodingFailed(String),
}

impl From<SpawnError> for BridgeError {
    fn from(error: SpawnError) -> Self {
        BridgeError::ExecutionFailed(error.to_string())
    }
}
