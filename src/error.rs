//! Error types for centerline extraction and scoring.
//!
//! Codes follow the pattern `CL-XXXX`:
//! - 1xxx = I/O and file format errors
//! - 2xxx = data and argument errors
//! - 3xxx = evaluation errors
//! - 4xxx = ground truth errors

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for core operations.
pub type CenterlineResult<T> = Result<T, CenterlineError>;

#[derive(Debug, Error)]
pub enum CenterlineError {
    /// Fewer points than an operation needs.
    #[error("{operation} needs at least {required} points, got {actual}")]
    InsufficientData {
        operation: &'static str,
        required: usize,
        actual: usize,
    },

    /// A parameter outside its valid domain.
    #[error("invalid argument `{name}`: {reason}")]
    InvalidArgument { name: &'static str, reason: String },

    /// A distance metric was asked to compare against an empty curve.
    #[error("{which} curve is empty")]
    EmptyCurve { which: &'static str },

    #[error("no ground truth for model `{model}` under {path:?}")]
    MissingGroundTruth { model: String, path: PathBuf },

    #[error("failed to read {path:?}: {source}")]
    IoRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path:?}: {source}")]
    IoWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path:?}: {details}")]
    Parse { path: PathBuf, details: String },

    #[error("unsupported file format: {extension:?}")]
    UnsupportedFormat { extension: Option<String> },
}

impl CenterlineError {
    /// Machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            CenterlineError::IoRead { .. } => "CL-1001",
            CenterlineError::IoWrite { .. } => "CL-1002",
            CenterlineError::Parse { .. } => "CL-1003",
            CenterlineError::UnsupportedFormat { .. } => "CL-1004",
            CenterlineError::InsufficientData { .. } => "CL-2001",
            CenterlineError::InvalidArgument { .. } => "CL-2002",
            CenterlineError::EmptyCurve { .. } => "CL-3001",
            CenterlineError::MissingGroundTruth { .. } => "CL-4001",
        }
    }

    pub fn invalid_argument(name: &'static str, reason: impl Into<String>) -> Self {
        CenterlineError::InvalidArgument {
            name,
            reason: reason.into(),
        }
    }

    pub fn parse(path: impl Into<PathBuf>, details: impl Into<String>) -> Self {
        CenterlineError::Parse {
            path: path.into(),
            details: details.into(),
        }
    }
}
