use std::path::PathBuf;
use thiserror::Error;

/// Failure modes of the hook sidecar.
///
/// None of these ever reach the host agent as a hard failure. Callers log them
/// and degrade to "no telemetry this time".
#[derive(Debug, Error)]
pub enum HookError {
    /// Persisted record is missing or unreadable; callers fall back to a fresh record.
    #[error("state unavailable at {}: {reason}", path.display())]
    StateUnavailable { path: PathBuf, reason: String },
    /// A persistence write could not complete.
    #[error("failed to write {}: {reason}", path.display())]
    WriteFailed { path: PathBuf, reason: String },
    /// An event payload or annotation block could not be parsed.
    #[error("malformed input: {0}")]
    MalformedInput(String),
    /// A single setting failed validation and was replaced by its default.
    #[error("invalid setting `{setting}` ({reason}); using default")]
    ConfigInvalid { setting: String, reason: String },
}

impl HookError {
    pub fn state_unavailable(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::StateUnavailable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn write_failed(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::WriteFailed {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn config_invalid(setting: impl Into<String>, reason: impl ToString) -> Self {
        Self::ConfigInvalid {
            setting: setting.into(),
            reason: reason.to_string(),
        }
    }

    /// Short machine-readable tag used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::StateUnavailable { .. } => "state_unavailable",
            Self::WriteFailed { .. } => "write_failed",
            Self::MalformedInput(_) => "malformed_input",
            Self::ConfigInvalid { .. } => "config_invalid",
        }
    }
}
