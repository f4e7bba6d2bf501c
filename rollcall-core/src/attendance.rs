//! Per-period attendance and the two transition rules.
//!
//! A [`StudentAttendance`] binds one student to one day's [`Schedule`] and
//! holds one [`AttendanceSlot`] per scheduled period. Slots start
//! [`AttendanceMark::Undecided`], are hydrated from ERP statuses, and are then
//! moved forward by:
//!
//! - [`StudentAttendance::track_in_main_registration`]: decides the main
//!   (first-of-day) period from the check-in time;
//! - [`StudentAttendance::track_forby_periods_for_present`]: once presence is
//!   known, marks elapsed periods absent and running periods late.
//!
//! Both return the slots that changed; an empty answer means there is nothing
//! to write back.
//!
//! Lateness in the main period counts from the period's nominal `time`;
//! lateness in a forward-filled period counts from its `start`.

use std::collections::HashMap;

use tracing::debug;

use crate::clock::ErpTime;
use crate::codes::CodeCatalog;
use crate::config::AttendancePolicy;
use crate::error::AttendanceError;
use crate::schedule::{RegistrationPeriod, Schedule};
use crate::types::{CodeId, PeriodId, Visitor};

// ---------------------------------------------------------------------------
// Marks
// ---------------------------------------------------------------------------

/// The attendance decision for one period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttendanceMark {
    /// Not registered yet.
    #[default]
    Undecided,
    /// Present on time.
    Present { code: Option<CodeId> },
    /// Present, arrived late.
    Late {
        minutes_late: i32,
        code: Option<CodeId>,
    },
    /// Registered absent.
    Absent { code: Option<CodeId> },
}

impl AttendanceMark {
    pub fn is_registered(&self) -> bool {
        !matches!(self, AttendanceMark::Undecided)
    }

    pub fn is_present(&self) -> bool {
        matches!(self, AttendanceMark::Present { .. } | AttendanceMark::Late { .. })
    }

    pub fn is_late(&self) -> bool {
        matches!(self, AttendanceMark::Late { .. })
    }

    pub fn minutes_late(&self) -> i32 {
        match self {
            AttendanceMark::Late { minutes_late, .. } => *minutes_late,
            _ => 0,
        }
    }

    pub fn present_code_id(&self) -> Option<CodeId> {
        match self {
            AttendanceMark::Present { code } | AttendanceMark::Late { code, .. } => *code,
            _ => None,
        }
    }

    pub fn absence_code_id(&self) -> Option<CodeId> {
        match self {
            AttendanceMark::Absent { code } => *code,
            _ => None,
        }
    }
}

/// ERP flags carried through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AttendanceFlags {
    pub alert_sent: bool,
    pub is_future_absence: bool,
    pub is_out_of_school: bool,
    pub parent_notification_sent: bool,
}

/// One student's record for one period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceItem {
    pub period_id: PeriodId,
    pub school_id: String,
    pub mark: AttendanceMark,
    pub leaving_or_left: Option<ErpTime>,
    pub registration_comment: Option<String>,
    pub flags: AttendanceFlags,
}

impl AttendanceItem {
    pub fn undecided(period_id: PeriodId, school_id: impl Into<String>) -> Self {
        Self {
            period_id,
            school_id: school_id.into(),
            mark: AttendanceMark::Undecided,
            leaving_or_left: None,
            registration_comment: None,
            flags: AttendanceFlags::default(),
        }
    }
}

/// A period paired with the student's item for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceSlot {
    pub period: RegistrationPeriod,
    pub item: AttendanceItem,
}

// ---------------------------------------------------------------------------
// StudentAttendance
// ---------------------------------------------------------------------------

/// One student's attendance for one day.
#[derive(Debug, Clone)]
pub struct StudentAttendance {
    student: Visitor,
    schedule: Schedule,
    slots: Vec<AttendanceSlot>,
    index: HashMap<PeriodId, usize>,
}

enum Backfill {
    Absent,
    Late { minutes_late: i32 },
}

impl StudentAttendance {
    /// Bind `student` to `schedule` with one undecided slot per period.
    pub fn new(student: Visitor, schedule: Schedule) -> Self {
        let slots = schedule
            .periods()
            .map(|period| AttendanceSlot {
                period: period.clone(),
                item: AttendanceItem::undecided(period.id, student.erp_school_id.clone()),
            })
            .collect();
        let mut attendance = Self {
            student,
            schedule,
            slots,
            index: HashMap::new(),
        };
        attendance.reindex();
        attendance
    }

    fn reindex(&mut self) {
        self.index = self
            .slots
            .iter()
            .enumerate()
            .map(|(pos, slot)| (slot.period.id, pos))
            .collect();
    }

    pub fn student(&self) -> &Visitor {
        &self.student
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// Slots in schedule order.
    pub fn slots(&self) -> &[AttendanceSlot] {
        &self.slots
    }

    pub fn slot(&self, period_id: PeriodId) -> Option<&AttendanceSlot> {
        self.index.get(&period_id).map(|&pos| &self.slots[pos])
    }

    /// Replace the item of the slot for `item.period_id`.
    ///
    /// Returns `false` (and drops the item) when the student has no slot for
    /// that period.
    pub fn set_attendance_status(&mut self, item: AttendanceItem) -> bool {
        match self.index.get(&item.period_id) {
            Some(&pos) => {
                self.slots[pos].item = item;
                true
            }
            None => {
                debug!(period = %item.period_id, "no slot for attendance status; ignored");
                false
            }
        }
    }

    #[cfg(test)]
    fn remove_slot(&mut self, period_id: PeriodId) -> Option<AttendanceSlot> {
        let pos = self.index.get(&period_id).copied()?;
        let slot = self.slots.remove(pos);
        self.reindex();
        Some(slot)
    }

    /// Decide the main registration period for a check-in at `track_time`.
    ///
    /// Returns the updated slot when the ERP must be written, `None` when the
    /// student is already registered present.
    pub fn track_in_main_registration(
        &mut self,
        track_time: ErpTime,
        policy: &AttendancePolicy,
        codes: &CodeCatalog,
    ) -> Result<Option<AttendanceSlot>, AttendanceError> {
        let pos = self.main_slot_position(policy)?;
        let present_code = codes.default_present_code(&policy.present_code)?;

        let slot = &mut self.slots[pos];
        let period = &slot.period;
        let next = match slot.item.mark {
            AttendanceMark::Undecided if track_time <= period.finish => AttendanceMark::Present {
                code: Some(present_code),
            },
            AttendanceMark::Undecided | AttendanceMark::Absent { .. } => AttendanceMark::Late {
                minutes_late: whole_minutes(period.time, track_time),
                code: None,
            },
            AttendanceMark::Present { .. } | AttendanceMark::Late { .. } => {
                debug!(period = %period.name, "already registered present; nothing to update");
                return Ok(None);
            }
        };

        debug!(
            period = %period.name,
            from = ?slot.item.mark,
            to = ?next,
            "main registration decided"
        );
        slot.item.mark = next;
        Ok(Some(slot.clone()))
    }

    /// Backfill every non-main period whose window has elapsed or is running.
    ///
    /// Undecided periods that finished before `track_time` become absent with
    /// the lesson-absence code; undecided periods running past their nominal
    /// time become late, counted from the period start. Nothing is mutated
    /// when the lesson-absence code is needed but missing.
    pub fn track_forby_periods_for_present(
        &mut self,
        track_time: ErpTime,
        policy: &AttendancePolicy,
        codes: &CodeCatalog,
    ) -> Result<Vec<AttendanceSlot>, AttendanceError> {
        let main_id = self.main_period(policy)?.id;

        let plan: Vec<(usize, Backfill)> = self
            .slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.period.id != main_id)
            .filter_map(|(pos, slot)| {
                let period = &slot.period;
                let mark = slot.item.mark;
                if mark.is_registered() {
                    return None;
                }
                if track_time > period.finish {
                    Some((pos, Backfill::Absent))
                } else if track_time > period.time
                    && track_time < period.finish
                    && !mark.is_present()
                {
                    Some((
                        pos,
                        Backfill::Late {
                            minutes_late: whole_minutes(period.start, track_time),
                        },
                    ))
                } else {
                    None
                }
            })
            .collect();

        let absence_code = if plan.iter().any(|(_, b)| matches!(b, Backfill::Absent)) {
            Some(codes.default_lesson_absence_code(&policy.lesson_absence_code)?)
        } else {
            None
        };

        let mut updated = Vec::with_capacity(plan.len());
        for (pos, backfill) in plan {
            let slot = &mut self.slots[pos];
            slot.item.mark = match backfill {
                Backfill::Absent => AttendanceMark::Absent { code: absence_code },
                Backfill::Late { minutes_late } => AttendanceMark::Late {
                    minutes_late,
                    code: None,
                },
            };
            debug!(period = %slot.period.name, mark = ?slot.item.mark, "period backfilled");
            updated.push(slot.clone());
        }
        Ok(updated)
    }

    fn main_period(&self, policy: &AttendancePolicy) -> Result<&RegistrationPeriod, AttendanceError> {
        self.schedule
            .period_by_name(&policy.main_period_name)
            .ok_or_else(|| AttendanceError::MainPeriodNotFound {
                name: policy.main_period_name.clone(),
            })
    }

    fn main_slot_position(&self, policy: &AttendancePolicy) -> Result<usize, AttendanceError> {
        let main = self.main_period(policy)?;
        self.index
            .get(&main.id)
            .copied()
            .ok_or_else(|| AttendanceError::StudentSchedulePeriodNotFound {
                name: policy.main_period_name.clone(),
            })
    }
}

/// Whole minutes from `from` to `to`, rounded down; never negative.
fn whole_minutes(from: ErpTime, to: ErpTime) -> i32 {
    let minutes = (to - from).num_seconds().div_euclid(60).max(0);
    i32::try_from(minutes).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codes::{RegistrationCode, RegistrationCodeDictionary};
    use chrono::{TimeZone, Utc};
    use chrono_tz::UTC;

    fn at(h: u32, m: u32, s: u32) -> ErpTime {
        UTC.with_ymd_and_hms(2024, 9, 2, h, m, s).unwrap()
    }

    fn period(id: i32, name: &str, start: ErpTime, time: ErpTime, finish: ErpTime) -> RegistrationPeriod {
        RegistrationPeriod {
            id: PeriodId(id),
            name: name.to_string(),
            start,
            time,
            finish,
        }
    }

    fn attendance() -> StudentAttendance {
        let student = Visitor {
            id: Some(crate::types::VisitorId(1)),
            erp_id: 12345,
            erp_school_id: "S123".to_string(),
            erp_year_group_id: 10,
            erp_divisions: vec![101, 102],
            ..Visitor::default()
        };
        let schedule = [
            period(100, "AM", at(7, 37, 0), at(7, 40, 0), at(7, 55, 0)),
            period(1, "Period 1", at(8, 0, 0), at(8, 0, 0), at(8, 59, 0)),
            period(2, "Period 2", at(9, 0, 0), at(9, 0, 0), at(9, 59, 0)),
        ]
        .into_iter()
        .collect();
        StudentAttendance::new(student, schedule)
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

    #[test]
    fn new_prepopulates_one_undecided_slot_per_period() {
        let sa = attendance();
        assert_eq!(sa.slots().len(), 3);
        for slot in sa.slots() {
            assert_eq!(slot.item.mark, AttendanceMark::Undecided);
            assert_eq!(slot.item.school_id, "S123");
            assert_eq!(slot.item.period_id, slot.period.id);
        }
    }

    #[test]
    fn set_attendance_status_replaces_existing_and_ignores_unknown() {
        let mut sa = attendance();
        let mut item = AttendanceItem::undecided(PeriodId(1), "S123");
        item.mark = AttendanceMark::Present { code: Some(CodeId(1)) };
        item.flags.is_future_absence = true;
        assert!(sa.set_attendance_status(item.clone()));
        assert_eq!(sa.slot(PeriodId(1)).unwrap().item, item);

        assert!(!sa.set_attendance_status(AttendanceItem::undecided(PeriodId(999), "S123")));
        assert!(sa.slot(PeriodId(999)).is_none());
    }

    #[test]
    fn mark_accessors() {
        let late = AttendanceMark::Late { minutes_late: 7, code: None };
        assert!(late.is_registered() && late.is_present() && late.is_late());
        assert_eq!(late.minutes_late(), 7);

        let absent = AttendanceMark::Absent { code: Some(CodeId(11)) };
        assert!(absent.is_registered() && !absent.is_present());
        assert_eq!(absent.absence_code_id(), Some(CodeId(11)));
        assert_eq!(absent.present_code_id(), None);

        assert!(!AttendanceMark::Undecided.is_registered());
    }

    #[test]
    fn main_registration_late_after_finish_counts_from_nominal_time() {
        let mut sa = attendance();
        let updated = sa
            .track_in_main_registration(at(8, 0, 0), &AttendancePolicy::default(), &catalog())
            .unwrap()
            .expect("update required");
        assert_eq!(
            updated.item.mark,
            AttendanceMark::Late { minutes_late: 20, code: None }
        );
        assert_eq!(sa.slot(PeriodId(100)).unwrap().item.mark, updated.item.mark);
    }

    #[test]
    fn main_registration_second_call_is_a_noop() {
        let mut sa = attendance();
        let policy = AttendancePolicy::default();
        let codes = catalog();
        assert!(sa.track_in_main_registration(at(7, 45, 0), &policy, &codes).unwrap().is_some());
        assert!(sa.track_in_main_registration(at(8, 30, 0), &policy, &codes).unwrap().is_none());
        assert_eq!(
            sa.slot(PeriodId(100)).unwrap().item.mark,
            AttendanceMark::Present { code: Some(CodeId(1)) }
        );
    }

    #[test]
    fn main_registration_missing_slot() {
        let mut sa = attendance();
        sa.remove_slot(PeriodId(100));
        let err = sa
            .track_in_main_registration(at(7, 45, 0), &AttendancePolicy::default(), &catalog())
            .unwrap_err();
        assert!(matches!(err, AttendanceError::StudentSchedulePeriodNotFound { .. }));
        assert!(err.to_string().contains("expected default period AM"));
    }

    #[test]
    fn forward_fill_missing_absence_code_leaves_items_untouched() {
        let mut sa = attendance();
        let codes = catalog();
        codes.clear_absence();
        let err = sa
            .track_forby_periods_for_present(at(9, 10, 0), &AttendancePolicy::default(), &codes)
            .unwrap_err();
        assert!(matches!(err, AttendanceError::DefaultLessonAbsenceCodeNotFound { .. }));
        assert!(sa.slots().iter().all(|s| s.item.mark == AttendanceMark::Undecided));
    }

    #[test]
    fn forward_fill_without_absences_does_not_need_absence_code() {
        let mut sa = attendance();
        let codes = catalog();
        codes.clear_absence();
        let updated = sa
            .track_forby_periods_for_present(at(8, 15, 0), &AttendancePolicy::default(), &codes)
            .unwrap();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].period.id, PeriodId(1));
    }

    #[test]
    fn whole_minutes_rounds_down_and_clamps_at_zero() {
        assert_eq!(whole_minutes(at(7, 40, 0), at(7, 55, 59)), 15);
        assert_eq!(whole_minutes(at(7, 40, 0), at(7, 40, 59)), 0);
        assert_eq!(whole_minutes(at(7, 40, 0), at(7, 39, 30)), 0);
        assert_eq!(whole_minutes(at(7, 40, 0), at(6, 0, 0)), 0);
    }
}
