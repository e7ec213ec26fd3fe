//! Error types for MBO → MBP reconstruction.
//!
//! Clean error handling using `thiserror` for ergonomic error definitions.
//! Book mutations themselves never fail (unknown orders and empty events are
//! silent no-ops), so these errors surface at the I/O boundary and from the
//! consistency audit.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for reconstruction operations.
pub type Result<T> = std::result::Result<T, MbpError>;

/// Main error type for reconstruction operations.
#[derive(Error, Debug)]
pub enum MbpError {
    /// Input header lacks one or more required columns
    #[error("Missing required columns in CSV header: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    /// File could not be opened or created
    #[error("Cannot open {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CSV read/write failure mid-stream
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Order not found in the registry
    #[error("Order not found: {0}")]
    OrderNotFound(u64),

    /// Registry and ledger disagree
    #[error("Book inconsistency: {0}")]
    InconsistentState(String),

    /// Bad command-line usage
    #[error("Usage: {0}")]
    Usage(String),

    /// Generic error with context
    #[error("Error: {0}")]
    Generic(String),
}

impl MbpError {
    /// Create a generic error from any string-like type.
    pub fn generic(msg: impl Into<String>) -> Self {
        MbpError::Generic(msg.into())
    }

    /// Attach a path to an I/O failure.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MbpError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<std::io::Error> for MbpError {
    fn from(err: std::io::Error) -> Self {
        MbpError::Generic(format!("IO error: {err}"))
    }
}

impl From<String> for MbpError {
    fn from(err: String) -> Self {
        MbpError::Generic(err)
    }
}

impl From<&str> for MbpError {
    fn from(err: &str) -> Self {
        MbpError::Generic(err.to_string())
    }
}
