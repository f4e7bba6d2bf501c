//! Error types for rollcall-erp.

use std::path::PathBuf;

use thiserror::Error;

/// Failures reported by an [`crate::ErpClient`].
#[derive(Debug, Error)]
pub enum ErpError {
    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A payload that does not match the expected shape.
    #[error("malformed ERP payload at {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The ERP has no such resource.
    #[error("ERP resource not found: {resource}")]
    NotFound { resource: String },

    /// Any other upstream failure (transport, status code, auth).
    #[error("ERP request {operation} failed: {message}")]
    Request {
        operation: &'static str,
        message: String,
    },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ErpError {
    ErpError::Io {
        path: path.into(),
        source,
    }
}

pub(crate) fn json_err(path: impl Into<PathBuf>, source: serde_json::Error) -> ErpError {
    ErpError::Json {
        path: path.into(),
        source,
    }
}
