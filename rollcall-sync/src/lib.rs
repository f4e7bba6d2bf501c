//! # rollcall-sync
//!
//! Local visitor storage and ERP → local reconciliation.
//!
//! Call [`StudentSync::run`] to pull every ERP student into a
//! [`VisitorStore`], writing only records whose content changed, or
//! [`refresh_codes`] to reload the registration-code dictionaries.

pub mod codes;
pub mod diff;
pub mod error;
pub mod store;
pub mod students;

pub use codes::{refresh_codes, CodesRefreshed};
pub use diff::{Freshness, LocalSnapshot};
pub use error::SyncError;
pub use store::{JsonVisitorStore, VisitorStore};
pub use students::{StudentSync, SyncOutcome, SyncReport};
