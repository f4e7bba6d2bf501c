//! # rollcall-erp
//!
//! The narrow ERP surface rollcall depends on.
//!
//! - [`ErpClient`]: the calls the tracker and the student sync make
//! - [`dto`]: wire payloads as the ERP serialises them (camelCase JSON)
//! - [`export`]: [`JsonExportErp`], an `ErpClient` over a directory of JSON
//!   exports, for offline runs and tests

pub mod dto;
pub mod error;
pub mod export;

pub use dto::{
    AbsenceCode, Division, PresentCode, RegistrationAbsenceCodesResponse,
    RegistrationPeriodDto, RegistrationPeriodsResponse, RegistrationPresentCodesResponse,
    RegistrationStatus, RegistrationStatusUpdate, Student, StudentsResponse,
    YearGroupDivisionsResponse,
};
pub use error::ErpError;
pub use export::{JsonExportErp, OutboxEntry};

/// Calls made against the ERP.
///
/// Implementations block the caller; retries and timeouts belong to the
/// implementation, not to rollcall.
pub trait ErpClient {
    /// One page of students (1-based `page`).
    fn get_students(&self, page: i32, page_size: i32) -> Result<StudentsResponse, ErpError>;

    fn get_year_group_divisions(
        &self,
        year_group_id: i32,
    ) -> Result<YearGroupDivisionsResponse, ErpError>;

    /// Today's registration periods for one division.
    fn get_current_registration_periods_for_division(
        &self,
        division_id: i32,
    ) -> Result<RegistrationPeriodsResponse, ErpError>;

    fn get_registration_status_for_student(
        &self,
        school_id: &str,
        period_id: i32,
    ) -> Result<RegistrationStatus, ErpError>;

    fn put_registration(
        &self,
        school_id: &str,
        period_id: i32,
        update: &RegistrationStatusUpdate,
    ) -> Result<(), ErpError>;

    fn get_registration_absence_codes(&self) -> Result<RegistrationAbsenceCodesResponse, ErpError>;

    fn get_registration_present_codes(&self) -> Result<RegistrationPresentCodesResponse, ErpError>;
}
