//! Error types for rollcall-tracking.

use thiserror::Error;

use rollcall_core::AttendanceError;
use rollcall_erp::ErpError;

/// All errors that end a tracking session.
#[derive(Debug, Error)]
pub enum TrackingError {
    /// An ERP call failed; the session stops where it was.
    #[error("ERP error: {0}")]
    Erp(#[from] ErpError),

    /// A period or code the deployment relies on is missing.
    #[error(transparent)]
    Attendance(#[from] AttendanceError),

    /// A timestamp the ERP sent could not be read.
    #[error("invalid ERP timestamp {value:?}")]
    InvalidTimestamp { value: String },
}
