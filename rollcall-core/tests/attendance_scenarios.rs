//! End-to-end attendance decisions over a three-period school day:
//!
//! ```text
//! AM        07:37 start · 07:40 time · 07:55 finish
//! Period 1  08:00 start · 08:00 time · 08:59 finish
//! Period 2  09:00 start · 09:00 time · 09:59 finish
//! ```

use chrono::{TimeZone, Utc};
use chrono_tz::UTC;
use rollcall_core::{
    AttendanceError, AttendanceItem, AttendanceMark, AttendancePolicy, CodeCatalog, CodeId,
    ErpTime, PeriodId, RegistrationCode, RegistrationCodeDictionary, RegistrationPeriod, Schedule,
    StudentAttendance, Visitor,
};
use rstest::rstest;

fn at(h: u32, m: u32, s: u32) -> ErpTime {
    UTC.with_ymd_and_hms(2024, 9, 2, h, m, s).unwrap()
}

fn school_day() -> Schedule {
    let period = |id: i32, name: &str, start, time, finish| RegistrationPeriod {
        id: PeriodId(id),
        name: name.to_string(),
        start,
        time,
        finish,
    };
    [
        period(100, "AM", at(7, 37, 0), at(7, 40, 0), at(7, 55, 0)),
        period(1, "Period 1", at(8, 0, 0), at(8, 0, 0), at(8, 59, 0)),
        period(2, "Period 2", at(9, 0, 0), at(9, 0, 0), at(9, 59, 0)),
    ]
    .into_iter()
    .collect()
}

fn student() -> Visitor {
    Visitor {
        erp_id: 12345,
        erp_school_id: "S123".to_string(),
        erp_year_group_id: 10,
        erp_divisions: vec![101, 102],
        ..Visitor::default()
    }
}

fn catalog() -> CodeCatalog {
    let catalog = CodeCatalog::new();
    catalog.replace_present(RegistrationCodeDictionary::new(
        [RegistrationCode {
            id: CodeId(1),
            code: "/".to_string(),
            name: "Present".to_string(),
            is_absence_code: false,
        }],
        Utc::now(),
    ));
    catalog.replace_absence(RegistrationCodeDictionary::new(
        [RegistrationCode {
            id: CodeId(11),
            code: "C".to_string(),
            name: "Lesson absence".to_string(),
            is_absence_code: true,
        }],
        Utc::now(),
    ));
    catalog
}

fn policy() -> AttendancePolicy {
    AttendancePolicy::default()
}

// ---------------------------------------------------------------------------
// 1. Main registration
// ---------------------------------------------------------------------------

#[rstest]
#[case::before_am_period(at(7, 35, 0))]
#[case::during_am_period(at(7, 45, 0))]
#[case::exactly_at_finish(at(7, 55, 0))]
fn on_time_check_in_is_present_with_default_code(#[case] track_time: ErpTime) {
    let mut sa = StudentAttendance::new(student(), school_day());
    let updated = sa
        .track_in_main_registration(track_time, &policy(), &catalog())
        .expect("no error")
        .expect("update required");

    assert_eq!(updated.period.id, PeriodId(100));
    let mark = updated.item.mark;
    assert!(mark.is_registered());
    assert!(mark.is_present());
    assert!(!mark.is_late());
    assert_eq!(mark.minutes_late(), 0);
    assert_eq!(mark.present_code_id(), Some(CodeId(1)));
    assert_eq!(mark.absence_code_id(), None);
}

#[rstest]
#[case::one_second_after_finish(at(7, 55, 1), 15)]
#[case::five_minutes_after_finish(at(8, 0, 0), 20)]
#[case::just_short_of_a_minute(at(8, 0, 59), 20)]
fn late_check_in_counts_from_nominal_time(#[case] track_time: ErpTime, #[case] minutes: i32) {
    let mut sa = StudentAttendance::new(student(), school_day());
    let updated = sa
        .track_in_main_registration(track_time, &policy(), &catalog())
        .unwrap()
        .unwrap();

    assert_eq!(
        updated.item.mark,
        AttendanceMark::Late {
            minutes_late: minutes,
            code: None
        }
    );
    assert_eq!(updated.item.mark.present_code_id(), None);
    assert_eq!(updated.item.mark.absence_code_id(), None);
}

#[test]
fn registered_absent_flips_to_late_and_clears_codes() {
    let mut sa = StudentAttendance::new(student(), school_day());
    let mut item = AttendanceItem::undecided(PeriodId(100), "S123");
    item.mark = AttendanceMark::Absent {
        code: Some(CodeId(11)),
    };
    assert!(sa.set_attendance_status(item));

    let updated = sa
        .track_in_main_registration(at(8, 10, 0), &policy(), &catalog())
        .unwrap()
        .unwrap();
    assert_eq!(
        updated.item.mark,
        AttendanceMark::Late {
            minutes_late: 30,
            code: None
        }
    );
}

#[test]
fn registered_absent_before_nominal_time_is_late_by_zero_minutes() {
    let mut sa = StudentAttendance::new(student(), school_day());
    let mut item = AttendanceItem::undecided(PeriodId(100), "S123");
    item.mark = AttendanceMark::Absent {
        code: Some(CodeId(11)),
    };
    assert!(sa.set_attendance_status(item));

    let updated = sa
        .track_in_main_registration(at(7, 39, 30), &policy(), &catalog())
        .unwrap()
        .unwrap();
    assert_eq!(
        updated.item.mark,
        AttendanceMark::Late {
            minutes_late: 0,
            code: None
        }
    );
}

#[rstest]
#[case::present(AttendanceMark::Present { code: Some(CodeId(1)) })]
#[case::late(AttendanceMark::Late { minutes_late: 4, code: None })]
fn already_present_is_not_updated(#[case] mark: AttendanceMark) {
    let mut sa = StudentAttendance::new(student(), school_day());
    let mut item = AttendanceItem::undecided(PeriodId(100), "S123");
    item.mark = mark;
    sa.set_attendance_status(item.clone());

    let result = sa
        .track_in_main_registration(at(8, 10, 0), &policy(), &catalog())
        .unwrap();
    assert!(result.is_none());
    assert_eq!(sa.slot(PeriodId(100)).unwrap().item, item);
}

#[test]
fn unknown_main_period_is_reported_with_its_name() {
    let mut sa = StudentAttendance::new(student(), school_day());
    let policy = AttendancePolicy {
        main_period_name: "TT".to_string(),
        ..policy()
    };
    let err = sa
        .track_in_main_registration(at(7, 45, 0), &policy, &catalog())
        .unwrap_err();
    assert_eq!(
        err,
        AttendanceError::MainPeriodNotFound {
            name: "TT".to_string()
        }
    );
    assert!(err.to_string().contains("expected default period TT"));
}

#[test]
fn missing_present_dictionary_is_reported() {
    let mut sa = StudentAttendance::new(student(), school_day());
    let codes = catalog();
    codes.clear_present();
    let err = sa
        .track_in_main_registration(at(7, 45, 0), &policy(), &codes)
        .unwrap_err();
    assert!(matches!(err, AttendanceError::DefaultPresentCodeNotFound { .. }));
    assert_eq!(
        sa.slot(PeriodId(100)).unwrap().item.mark,
        AttendanceMark::Undecided
    );
}

// ---------------------------------------------------------------------------
// 2. Forward fill
// ---------------------------------------------------------------------------

#[test]
fn late_for_second_period_marks_first_absent_and_second_late() {
    let mut sa = StudentAttendance::new(student(), school_day());
    let updated = sa
        .track_forby_periods_for_present(at(9, 10, 0), &policy(), &catalog())
        .unwrap();
    assert_eq!(updated.len(), 2);

    let first = updated.iter().find(|s| s.period.id == PeriodId(1)).unwrap();
    assert_eq!(
        first.item.mark,
        AttendanceMark::Absent {
            code: Some(CodeId(11))
        }
    );
    assert!(!first.item.mark.is_late());
    assert_eq!(first.item.mark.present_code_id(), None);

    let second = updated.iter().find(|s| s.period.id == PeriodId(2)).unwrap();
    assert_eq!(
        second.item.mark,
        AttendanceMark::Late {
            minutes_late: 10,
            code: None
        }
    );
}

#[test]
fn late_within_first_period_counts_from_start() {
    let mut sa = StudentAttendance::new(student(), school_day());
    let updated = sa
        .track_forby_periods_for_present(at(8, 15, 0), &policy(), &catalog())
        .unwrap();
    assert_eq!(updated.len(), 1);
    assert_eq!(updated[0].period.id, PeriodId(1));
    assert_eq!(
        updated[0].item.mark,
        AttendanceMark::Late {
            minutes_late: 15,
            code: None
        }
    );
}

#[test]
fn on_time_for_second_period_marks_only_first_absent() {
    let mut sa = StudentAttendance::new(student(), school_day());
    let updated = sa
        .track_forby_periods_for_present(at(9, 0, 0), &policy(), &catalog())
        .unwrap();
    assert_eq!(updated.len(), 1);
    assert_eq!(updated[0].period.id, PeriodId(1));
    assert_eq!(updated[0].item.mark.absence_code_id(), Some(CodeId(11)));
}

#[test]
fn exactly_at_finish_leaves_period_untouched() {
    let mut sa = StudentAttendance::new(student(), school_day());
    let updated = sa
        .track_forby_periods_for_present(at(8, 59, 0), &policy(), &catalog())
        .unwrap();
    assert!(updated.is_empty(), "got {updated:?}");
}

#[test]
fn registered_periods_are_left_alone() {
    let mut sa = StudentAttendance::new(student(), school_day());
    let mut item = AttendanceItem::undecided(PeriodId(1), "S123");
    item.mark = AttendanceMark::Present {
        code: Some(CodeId(1)),
    };
    sa.set_attendance_status(item);

    let updated = sa
        .track_forby_periods_for_present(at(9, 10, 0), &policy(), &catalog())
        .unwrap();
    let ids: Vec<_> = updated.iter().map(|s| s.period.id).collect();
    assert_eq!(ids, vec![PeriodId(2)]);
}

#[test]
fn main_period_is_never_backfilled() {
    let mut sa = StudentAttendance::new(student(), school_day());
    let updated = sa
        .track_forby_periods_for_present(at(12, 0, 0), &policy(), &catalog())
        .unwrap();
    let ids: Vec<_> = updated.iter().map(|s| s.period.id).collect();
    assert_eq!(ids, vec![PeriodId(1), PeriodId(2)]);
    assert_eq!(
        sa.slot(PeriodId(100)).unwrap().item.mark,
        AttendanceMark::Undecided
    );
}

#[test]
fn forward_fill_requires_main_period() {
    let mut sa = StudentAttendance::new(student(), school_day());
    let policy = AttendancePolicy {
        main_period_name: "TT".to_string(),
        ..policy()
    };
    let err = sa
        .track_forby_periods_for_present(at(9, 10, 0), &policy, &catalog())
        .unwrap_err();
    assert!(matches!(err, AttendanceError::MainPeriodNotFound { .. }));
}

#[test]
fn full_day_main_then_forward_fill() {
    let mut sa = StudentAttendance::new(student(), school_day());
    let codes = catalog();

    let main = sa
        .track_in_main_registration(at(9, 10, 0), &policy(), &codes)
        .unwrap()
        .unwrap();
    assert_eq!(main.item.mark.minutes_late(), 90);

    let filled = sa
        .track_forby_periods_for_present(at(9, 10, 0), &policy(), &codes)
        .unwrap();
    assert_eq!(filled.len(), 2);

    // A second pass finds nothing left to decide.
    assert!(sa
        .track_forby_periods_for_present(at(9, 10, 0), &policy(), &codes)
        .unwrap()
        .is_empty());
}
