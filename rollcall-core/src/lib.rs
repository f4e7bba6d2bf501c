//! Rollcall core library: attendance domain, registration codes, schedule
//! model and the attendance engine.
//!
//! - [`clock`]: ERP-local time source
//! - [`config`]: YAML configuration and [`AttendancePolicy`]
//! - [`codes`]: registration code dictionaries and the shared [`CodeCatalog`]
//! - [`schedule`]: registration periods and the day [`Schedule`]
//! - [`attendance`]: per-period marks and the [`StudentAttendance`] engine
//! - [`types`]: newtypes and the [`Visitor`] record
//! - [`error`]: [`AttendanceError`], [`ConfigError`]

pub mod attendance;
pub mod clock;
pub mod codes;
pub mod config;
pub mod error;
pub mod schedule;
pub mod types;

pub use attendance::{
    AttendanceFlags, AttendanceItem, AttendanceMark, AttendanceSlot, StudentAttendance,
};
pub use clock::{Clock, ErpTime, FixedClock, SystemClock};
pub use codes::{CodeCatalog, RegistrationCode, RegistrationCodeDictionary};
pub use config::{AttendancePolicy, Config};
pub use error::{AttendanceError, ConfigError};
pub use schedule::{RegistrationPeriod, Schedule};
pub use types::{CodeId, PeriodId, VisitDetails, Visitor, VisitorId};
