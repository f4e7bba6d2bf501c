//! Domain items → outbound registration writes.

use chrono::SecondsFormat;

use rollcall_core::AttendanceItem;
use rollcall_erp::RegistrationStatusUpdate;

/// The ERP write that records `item`.
///
/// The leaving time is sent as RFC 3339 in the timezone the item carries,
/// which for hydrated items is the ERP timezone.
pub fn registration_update(item: &AttendanceItem) -> RegistrationStatusUpdate {
    let mark = item.mark;
    RegistrationStatusUpdate {
        is_present: mark.is_present(),
        is_late: mark.is_late(),
        present_code_id: mark.present_code_id().map(|c| c.0),
        absence_code_id: mark.absence_code_id().map(|c| c.0),
        leaving_or_left_date_time: item
            .leaving_or_left
            .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, false)),
        number_of_minutes_late: mark.minutes_late(),
        registration_comment: item.registration_comment.clone(),
    }
}
