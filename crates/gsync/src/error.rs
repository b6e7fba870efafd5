use gsync_bridge::BridgeError;
use gsync_core::CheckFailure;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    Message(String),
    ToolNotFound {
        searched: Vec<String>,
    },
    ToolFailed {
        operation: &'static str,
        output: String,
    },
    UnexpectedOutput {
        operation: &'static str,
        raw: String,
    },
    UpdateCheckFailed(CheckFailure),
    RelaunchFailed(String),
    Io {
        context: &'static str,
        kind: std::io::ErrorKind,
        message: String,
    },
}

impl AppError {
    pub fn bridge(operation: &'static str, error: BridgeError) -> Self {
        match error {
            BridgeError::NotFound { searched, .. } => Self::ToolNotFound { searched },
            BridgeError::ExecutionFailed(output) => Self::ToolFailed { operation, output },
            BridgeError::DecodingFailed(raw) => Self::UnexpectedOutput { operation, raw },
        }
    }

    pub fn io(context: &'static str, error: &std::io::Error) -> Self {
        Self::Io {
            context,
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

impl From<String> for AppError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}

impl From<&str> for AppError {
    fn from(value: &str) -> Self {
        Self::Message(value.to_string())
    }
}

impl From<CheckFailure> for AppError {
    fn from(value: CheckFailure) -> Self {
        Self::UpdateCheckFailed(value)
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Message(message) => write!(f, "{message}"),
            Self::ToolNotFound { searched } => write!(
                f,
                "granola-sync is not installed. Searched:\n{}",
                searched.join("\n")
            ),
            Self::ToolFailed { operation, output } => {
                write!(f, "{operation} failed: {}", output.trim_end())
            }
            Self::UnexpectedOutput { operation, raw } => {
                write!(f, "{operation} returned unexpected output:\n{raw}")
            }
            Self::UpdateCheckFailed(failure) => write!(f, "Update check failed: {failure}"),
            Self::RelaunchFailed(details) => write!(f, "Relaunch failed: {details}"),
            Self::Io {
                context, message, ..
            } => write!(f, "{context}: {message}"),
        }
    }
}

impl std::error::Error for AppError {}
