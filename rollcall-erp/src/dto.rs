//! ERP wire payloads.
//!
//! Field names follow the ERP's camelCase JSON. Timestamps stay strings here;
//! turning them into instants is the caller's job because only the caller
//! knows the ERP timezone.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Students
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct StudentsResponse {
    pub count: i32,
    pub page: i32,
    pub page_size: i32,
    pub students: Vec<Student>,
    pub total_count: i32,
    pub total_pages: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: i64,
    #[serde(default)]
    pub school_id: String,
    #[serde(default)]
    pub forename: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub year_group: Option<i32>,
    /// RFC 3339; kept as text, may be absent or malformed.
    #[serde(default)]
    pub last_updated: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Division {
    pub id: i32,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct YearGroupDivisionsResponse {
    pub divisions: Vec<Division>,
}

// ---------------------------------------------------------------------------
// Registration periods and statuses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct RegistrationPeriodsResponse {
    pub registration_periods: Vec<RegistrationPeriodDto>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationPeriodDto {
    pub id: i32,
    #[serde(default)]
    pub divisions: Vec<Division>,
    pub friendly_name: String,
    pub start: String,
    pub time: String,
    pub finish: String,
    #[serde(default)]
    pub registration_type: String,
}

/// A student's current registration for one period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct RegistrationStatus {
    pub absence_code_id: Option<i32>,
    pub alert_sent: bool,
    pub is_future_absence: bool,
    pub is_late: bool,
    pub is_out_of_school: bool,
    pub is_present: bool,
    /// 0 = not yet registered, anything else = registered.
    pub is_registered: i32,
    pub leaving_or_left_date_time: Option<String>,
    pub number_of_minutes_late: Option<i32>,
    pub parent_notification_sent: bool,
    pub present_code_id: Option<i32>,
    pub registration_comment: Option<String>,
    pub registration_period_id: i32,
    pub school_id: String,
}

/// Body of a registration write.
///
/// Everything but `isPresent` / `isLate` is omitted when empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationStatusUpdate {
    pub is_present: bool,
    pub is_late: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub present_code_id: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub absence_code_id: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leaving_or_left_date_time: Option<String>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub number_of_minutes_late: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_comment: Option<String>,
}

fn is_zero(v: &i32) -> bool {
    *v == 0
}

impl RegistrationStatus {
    /// Fold a written update back into the status, as the ERP would.
    pub fn apply(&mut self, update: &RegistrationStatusUpdate) {
        self.is_registered = 1;
        self.is_present = update.is_present;
        self.is_late = update.is_late;
        self.present_code_id = update.present_code_id;
        self.absence_code_id = update.absence_code_id;
        self.number_of_minutes_late = Some(update.number_of_minutes_late);
        self.leaving_or_left_date_time = update.leaving_or_left_date_time.clone();
        self.registration_comment = update.registration_comment.clone();
    }
}

// ---------------------------------------------------------------------------
// Registration codes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct RegistrationAbsenceCodesResponse {
    pub absence_codes: Vec<AbsenceCode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AbsenceCode {
    pub id: i32,
    pub code: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub display_order: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct RegistrationPresentCodesResponse {
    pub present_codes: Vec<PresentCode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PresentCode {
    pub id: i32,
    pub code: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub display_order: i32,
    #[serde(default)]
    pub show_on_register: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn update_omits_empty_fields() {
        let update = RegistrationStatusUpdate {
            is_present: true,
            is_late: false,
            present_code_id: Some(1),
            ..RegistrationStatusUpdate::default()
        };
        let value = serde_json::to_value(&update).unwrap();
        assert_eq!(
            value,
            json!({ "isPresent": true, "isLate": false, "presentCodeId": 1 })
        );
    }

    #[test]
    fn update_keeps_presence_flags_even_when_false() {
        let value = serde_json::to_value(RegistrationStatusUpdate::default()).unwrap();
        assert_eq!(value, json!({ "isPresent": false, "isLate": false }));
    }

    #[test]
    fn late_update_carries_minutes() {
        let update = RegistrationStatusUpdate {
            is_present: true,
            is_late: true,
            number_of_minutes_late: 15,
            ..RegistrationStatusUpdate::default()
        };
        let value = serde_json::to_value(&update).unwrap();
        assert_eq!(value["numberOfMinutesLate"], 15);
        assert!(value.get("presentCodeId").is_none());
        assert!(value.get("absenceCodeId").is_none());
    }

    #[test]
    fn status_parses_nulls_and_missing_fields() {
        let status: RegistrationStatus = serde_json::from_value(json!({
            "absenceCodeId": null,
            "isPresent": true,
            "isRegistered": 1,
            "presentCodeId": 4,
            "registrationPeriodId": 100,
            "schoolId": "S123"
        }))
        .unwrap();
        assert_eq!(status.absence_code_id, None);
        assert_eq!(status.present_code_id, Some(4));
        assert!(!status.is_late);
        assert_eq!(status.number_of_minutes_late, None);
    }

    #[test]
    fn apply_registers_status() {
        let mut status = RegistrationStatus {
            registration_period_id: 1,
            school_id: "S1".to_string(),
            absence_code_id: Some(11),
            ..RegistrationStatus::default()
        };
        status.apply(&RegistrationStatusUpdate {
            is_present: true,
            is_late: true,
            number_of_minutes_late: 10,
            ..RegistrationStatusUpdate::default()
        });
        assert_eq!(status.is_registered, 1);
        assert!(status.is_present && status.is_late);
        assert_eq!(status.absence_code_id, None);
        assert_eq!(status.number_of_minutes_late, Some(10));
    }

    #[test]
    fn students_page_parses() {
        let page: StudentsResponse = serde_json::from_value(json!({
            "page": 1,
            "totalPages": 3,
            "students": [{ "id": 123, "schoolId": "S123", "fullName": "John Doe", "yearGroup": 10 }]
        }))
        .unwrap();
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.students[0].full_name.as_deref(), Some("John Doe"));
        assert_eq!(page.students[0].last_updated, None);
    }
}
