//! Tracking session: one check-in, start to finish.
//!
//! ```text
//! Idle → PeriodsLoaded → AttendanceHydrated → MainRegistrationEvaluated
//!      → ForwardFillEvaluated → Done
//! ```
//!
//! Any state may end in `Error`. The clock is read once per session so every
//! decision in it sees the same instant.

use chrono_tz::Tz;
use tracing::{debug, info, warn};

use rollcall_core::{
    AttendanceMark, AttendancePolicy, AttendanceSlot, Clock, CodeCatalog, ErpTime, PeriodId,
    Schedule, StudentAttendance, Visitor,
};
use rollcall_erp::{ErpClient, RegistrationStatusUpdate};

use crate::error::TrackingError;
use crate::hydrate::{item_from_status, period_from_dto};
use crate::payload::registration_update;

/// Where a session is, or where it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    PeriodsLoaded,
    AttendanceHydrated,
    MainRegistrationEvaluated,
    ForwardFillEvaluated,
    Done,
    Error,
}

/// One registration written to the ERP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationWrite {
    pub period_id: PeriodId,
    pub period_name: String,
    pub mark: AttendanceMark,
    pub update: RegistrationStatusUpdate,
}

/// A schedule as assembled from the visitor's divisions.
#[derive(Debug, Clone, Default)]
pub struct LoadedSchedule {
    pub schedule: Schedule,
    /// Divisions whose period listing failed.
    pub skipped_divisions: Vec<i32>,
    /// Periods dropped for unreadable timestamps.
    pub skipped_periods: Vec<PeriodId>,
}

/// Everything a finished session did.
#[derive(Debug, Clone)]
pub struct TrackingReport {
    pub tracked_at: ErpTime,
    pub periods: usize,
    pub skipped_divisions: Vec<i32>,
    pub skipped_periods: Vec<PeriodId>,
    pub writes: Vec<RegistrationWrite>,
}

impl TrackingReport {
    pub fn is_noop(&self) -> bool {
        self.writes.is_empty()
    }
}

/// Drives [`StudentAttendance`] for one check-in against the ERP.
pub struct StudentTracker<'a, E: ?Sized, C: ?Sized> {
    erp: &'a E,
    codes: &'a CodeCatalog,
    clock: &'a C,
    policy: AttendancePolicy,
    tz: Tz,
    state: SessionState,
}

impl<'a, E, C> StudentTracker<'a, E, C>
where
    E: ErpClient + ?Sized,
    C: Clock + ?Sized,
{
    pub fn new(erp: &'a E, codes: &'a CodeCatalog, clock: &'a C) -> Self {
        Self {
            erp,
            codes,
            clock,
            policy: AttendancePolicy::default(),
            tz: chrono_tz::UTC,
            state: SessionState::Idle,
        }
    }

    pub fn with_policy(mut self, policy: AttendancePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Timezone ERP timestamps without an offset are read in.
    pub fn with_timezone(mut self, tz: Tz) -> Self {
        self.tz = tz;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Run one tracking session for `visitor`.
    pub fn track(&mut self, visitor: &Visitor) -> Result<TrackingReport, TrackingError> {
        self.state = SessionState::Idle;
        let result = self.run(visitor);
        if result.is_err() {
            self.state = SessionState::Error;
        }
        result
    }

    fn run(&mut self, visitor: &Visitor) -> Result<TrackingReport, TrackingError> {
        let now = self.clock.now();
        debug!(visitor = %visitor.display_name(), %now, "tracking session started");

        let loaded = self.load_schedule(visitor);
        let mut report = TrackingReport {
            tracked_at: now,
            periods: loaded.schedule.len(),
            skipped_divisions: loaded.skipped_divisions,
            skipped_periods: loaded.skipped_periods,
            writes: Vec::new(),
        };
        self.state = SessionState::PeriodsLoaded;

        let mut attendance = StudentAttendance::new(visitor.clone(), loaded.schedule);
        self.hydrate(&mut attendance)?;
        self.state = SessionState::AttendanceHydrated;

        let main = attendance.track_in_main_registration(now, &self.policy, self.codes)?;
        self.state = SessionState::MainRegistrationEvaluated;

        match main {
            Some(slot) => {
                report.writes.push(self.write(&visitor.erp_school_id, &slot)?);

                let filled = attendance.track_forby_periods_for_present(now, &self.policy, self.codes)?;
                for slot in &filled {
                    report.writes.push(self.write(&visitor.erp_school_id, slot)?);
                }
            }
            None => debug!("main registration unchanged; forward fill skipped"),
        }
        self.state = SessionState::ForwardFillEvaluated;

        info!(
            visitor = %visitor.display_name(),
            periods = report.periods,
            writes = report.writes.len(),
            "tracking session finished"
        );
        self.state = SessionState::Done;
        Ok(report)
    }

    /// Today's periods across every division of `visitor`.
    ///
    /// A division whose listing fails, and a period with an unreadable
    /// timestamp, are skipped rather than fatal.
    pub fn load_schedule(&self, visitor: &Visitor) -> LoadedSchedule {
        let mut loaded = LoadedSchedule::default();
        for &division in &visitor.erp_divisions {
            let resp = match self.erp.get_current_registration_periods_for_division(division) {
                Ok(resp) => resp,
                Err(e) => {
                    warn!(division, error = %e, "registration periods unavailable; division skipped");
                    loaded.skipped_divisions.push(division);
                    continue;
                }
            };
            for dto in &resp.registration_periods {
                match period_from_dto(dto, self.tz) {
                    Ok(period) => loaded.schedule.add_period(period),
                    Err(e) => {
                        warn!(period = dto.id, error = %e, "registration period skipped");
                        loaded.skipped_periods.push(PeriodId(dto.id));
                    }
                }
            }
        }
        debug!(periods = loaded.schedule.len(), "schedule loaded");
        loaded
    }

    fn hydrate(&self, attendance: &mut StudentAttendance) -> Result<(), TrackingError> {
        let school_id = attendance.student().erp_school_id.clone();
        let period_ids: Vec<PeriodId> = attendance.schedule().periods().map(|p| p.id).collect();
        for period_id in period_ids {
            let status = self
                .erp
                .get_registration_status_for_student(&school_id, period_id.0)?;
            attendance.set_attendance_status(item_from_status(&status, period_id, &school_id, self.tz));
        }
        Ok(())
    }

    fn write(&self, school_id: &str, slot: &AttendanceSlot) -> Result<RegistrationWrite, TrackingError> {
        let update = registration_update(&slot.item);
        self.erp.put_registration(school_id, slot.period.id.0, &update)?;
        info!(
            school_id,
            period = %slot.period.name,
            mark = ?slot.item.mark,
            "registration updated"
        );
        Ok(RegistrationWrite {
            period_id: slot.period.id,
            period_name: slot.period.name.clone(),
            mark: slot.item.mark,
            update,
        })
    }
}
