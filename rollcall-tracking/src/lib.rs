//! # rollcall-tracking
//!
//! Turns a check-in into ERP registration writes.
//!
//! [`StudentTracker::track`] loads the visitor's schedule from the ERP,
//! hydrates current attendance, runs the main-registration and forward-fill
//! rules, and writes back every item they changed.

pub mod error;
pub mod hydrate;
pub mod payload;
pub mod session;

pub use error::TrackingError;
pub use session::{LoadedSchedule, RegistrationWrite, SessionState, StudentTracker, TrackingReport};
