//! Error types for rollcall-sync.

use std::path::PathBuf;

use thiserror::Error;

use rollcall_core::VisitorId;
use rollcall_erp::ErpError;

/// All errors that can arise from store and sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// An error from the ERP.
    #[error("ERP error: {0}")]
    Erp(#[from] ErpError),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error (visitor store).
    #[error("visitor store JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("visitor {id} not found")]
    VisitorNotFound { id: VisitorId },

    #[error("key {key} is already assigned to visitor {owner}")]
    KeyInUse { key: String, owner: VisitorId },

    #[error("could not determine home directory")]
    HomeNotFound,
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
