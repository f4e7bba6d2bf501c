//! ERP payloads → domain values.

use chrono::{DateTime, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use tracing::warn;

use rollcall_core::{
    AttendanceFlags, AttendanceItem, AttendanceMark, CodeId, ErpTime, PeriodId, RegistrationPeriod,
};
use rollcall_erp::{RegistrationPeriodDto, RegistrationStatus};

use crate::error::TrackingError;

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Read an ERP timestamp into the ERP timezone.
///
/// RFC 3339 values keep their instant. Values without an offset are wall
/// times in `tz`; an ambiguous wall time takes the earlier instant.
pub fn parse_erp_time(raw: &str, tz: Tz) -> Result<ErpTime, TrackingError> {
    let invalid = || TrackingError::InvalidTimestamp {
        value: raw.to_string(),
    };
    let raw_trimmed = raw.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(raw_trimmed) {
        return Ok(t.with_timezone(&tz));
    }
    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw_trimmed, fmt).ok())
        .ok_or_else(invalid)?;
    tz.from_local_datetime(&naive).earliest().ok_or_else(invalid)
}

/// Build a [`RegistrationPeriod`] from its wire form.
pub fn period_from_dto(dto: &RegistrationPeriodDto, tz: Tz) -> Result<RegistrationPeriod, TrackingError> {
    Ok(RegistrationPeriod {
        id: PeriodId(dto.id),
        name: dto.friendly_name.clone(),
        start: parse_erp_time(&dto.start, tz)?,
        time: parse_erp_time(&dto.time, tz)?,
        finish: parse_erp_time(&dto.finish, tz)?,
    })
}

/// Map an ERP registration status onto the student's item for `period_id`.
///
/// `isRegistered == 0` is undecided whatever the other flags say. An
/// unreadable leaving time is dropped.
pub fn item_from_status(
    status: &RegistrationStatus,
    period_id: PeriodId,
    school_id: &str,
    tz: Tz,
) -> AttendanceItem {
    let present_code = status.present_code_id.map(CodeId);
    let mark = if status.is_registered == 0 {
        AttendanceMark::Undecided
    } else if status.is_present && status.is_late {
        AttendanceMark::Late {
            minutes_late: status.number_of_minutes_late.unwrap_or(0),
            code: present_code,
        }
    } else if status.is_present {
        AttendanceMark::Present { code: present_code }
    } else {
        AttendanceMark::Absent {
            code: status.absence_code_id.map(CodeId),
        }
    };

    let leaving_or_left = status
        .leaving_or_left_date_time
        .as_deref()
        .filter(|raw| !raw.is_empty())
        .and_then(|raw| match parse_erp_time(raw, tz) {
            Ok(t) => Some(t),
            Err(e) => {
                warn!(period = %period_id, error = %e, "leaving time dropped");
                None
            }
        });

    AttendanceItem {
        period_id,
        school_id: if status.school_id.is_empty() {
            school_id.to_string()
        } else {
            status.school_id.clone()
        },
        mark,
        leaving_or_left,
        registration_comment: status.registration_comment.clone(),
        flags: AttendanceFlags {
            alert_sent: status.alert_sent,
            is_future_absence: status.is_future_absence,
            is_out_of_school: status.is_out_of_school,
            parent_notification_sent: status.parent_notification_sent,
        },
    }
}
