use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProcessingError>;

#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Cannot parse {}: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },

    #[error("Unusable structure in {}: {reason}", path.display())]
    Structural { path: PathBuf, reason: String },

    #[error("No usable rows for statistics in {}", path.display())]
    EmptyInput { path: PathBuf },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Settings error: {0}")]
    Settings(#[from] config::ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Chart rendering error: {0}")]
    Chart(String),

    #[error("Async task error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

/// Per-file failure taxonomy carried in the folder summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Unreadable, empty, or undelimitable file.
    Parse,
    /// Row/column shape that cannot be interpreted.
    Structural,
    /// Nothing left to compute statistics on.
    EmptyInput,
    /// Anything else (should not happen for a single file).
    Internal,
}

impl FailureKind {
    pub fn label(&self) -> &'static str {
        match self {
            FailureKind::Parse => "parse error",
            FailureKind::Structural => "structural error",
            FailureKind::EmptyInput => "empty input",
            FailureKind::Internal => "internal error",
        }
    }
}

impl ProcessingError {
    pub fn parse(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        ProcessingError::Parse {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn structural(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        ProcessingError::Structural {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Classify the error for per-file outcome reporting.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            ProcessingError::Io(_) | ProcessingError::Csv(_) | ProcessingError::Parse { .. } => {
                FailureKind::Parse
            }
            ProcessingError::Structural { .. } => FailureKind::Structural,
            ProcessingError::EmptyInput { .. } => FailureKind::EmptyInput,
            _ => FailureKind::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_kind_mapping() {
        let io = ProcessingError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "missing",
        ));
        assert_eq!(io.failure_kind(), FailureKind::Parse);
        assert_eq!(
            ProcessingError::structural("a.dat", "ragged").failure_kind(),
            FailureKind::Structural
        );
        assert_eq!(
            ProcessingError::EmptyInput {
                path: PathBuf::from("a.dat")
            }
            .failure_kind(),
            FailureKind::EmptyInput
        );
        assert_eq!(
            ProcessingError::Chart("no drawing area".to_string()).failure_kind(),
            FailureKind::Internal
        );
    }

    #[test]
    fn test_error_messages_name_the_file() {
        let err = ProcessingError::parse("data/precip.dat", "no consistent delimiter");
        assert_eq!(
            err.to_string(),
            "Cannot parse data/precip.dat: no consistent delimiter"
        );
    }
}
