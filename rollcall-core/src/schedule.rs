//! One school day's registration periods.
//!
//! Periods are kept as a sequence sorted by `(start, id)` plus an ID → position
//! index. Every query walks that order, so first/last and "first match"
//! answers are deterministic even when the ERP lists periods in a different
//! order or several divisions repeat the same period.

use std::collections::HashMap;

use crate::clock::ErpTime;
use crate::types::PeriodId;

/// A named registration window.
///
/// `start <= time <= finish` is expected but not enforced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationPeriod {
    pub id: PeriodId,
    pub name: String,
    /// Window opens.
    pub start: ErpTime,
    /// Nominal on-time instant.
    pub time: ErpTime,
    /// Window closes (inclusive).
    pub finish: ErpTime,
}

impl RegistrationPeriod {
    /// Inclusive `[start, finish]` containment.
    pub fn contains(&self, t: ErpTime) -> bool {
        self.start <= t && t <= self.finish
    }
}

/// The periods of one day.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schedule {
    periods: Vec<RegistrationPeriod>,
    index: HashMap<PeriodId, usize>,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `period`, overwriting any period with the same ID.
    pub fn add_period(&mut self, period: RegistrationPeriod) {
        match self.index.get(&period.id) {
            Some(&pos) => self.periods[pos] = period,
            None => self.periods.push(period),
        }
        self.periods
            .sort_by(|a, b| a.start.cmp(&b.start).then(a.id.cmp(&b.id)));
        self.reindex();
    }

    fn reindex(&mut self) {
        self.index = self
            .periods
            .iter()
            .enumerate()
            .map(|(pos, p)| (p.id, pos))
            .collect();
    }

    pub fn get(&self, id: PeriodId) -> Option<&RegistrationPeriod> {
        self.index.get(&id).map(|&pos| &self.periods[pos])
    }

    /// First period (in start order) called `name`.
    pub fn period_by_name(&self, name: &str) -> Option<&RegistrationPeriod> {
        self.periods.iter().find(|p| p.name == name)
    }

    /// The period a check-in at `t` belongs to.
    ///
    /// Anything before the first period's start belongs to the first period.
    /// Otherwise the first period whose inclusive window contains `t`, or
    /// `None` for a gap between periods or a time after the last finish.
    pub fn period_by_time(&self, t: ErpTime) -> Option<&RegistrationPeriod> {
        if let Some(first) = self.first_period() {
            if t < first.start {
                return Some(first);
            }
        }
        self.periods.iter().find(|p| p.contains(t))
    }

    /// Earliest start; ties go to the lowest ID.
    pub fn first_period(&self) -> Option<&RegistrationPeriod> {
        self.periods.first()
    }

    /// Latest finish; ties go to the period that starts last.
    pub fn last_period(&self) -> Option<&RegistrationPeriod> {
        self.periods
            .iter()
            .reduce(|last, p| if p.finish >= last.finish { p } else { last })
    }

    pub fn is_before_first_period(&self, t: ErpTime) -> bool {
        self.first_period().is_some_and(|p| t < p.start)
    }

    pub fn is_after_last_period(&self, t: ErpTime) -> bool {
        self.last_period().is_some_and(|p| t > p.finish)
    }

    /// Periods in `(start, id)` order.
    pub fn periods(&self) -> impl Iterator<Item = &RegistrationPeriod> {
        self.periods.iter()
    }

    pub fn len(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }
}

impl FromIterator<RegistrationPeriod> for Schedule {
    fn from_iter<I: IntoIterator<Item = RegistrationPeriod>>(iter: I) -> Self {
        let mut schedule = Schedule::new();
        for period in iter {
            schedule.add_period(period);
        }
        schedule
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::UTC;

    fn at(h: u32, m: u32, s: u32) -> ErpTime {
        UTC.with_ymd_and_hms(2024, 9, 2, h, m, s).unwrap()
    }

    fn period(id: i32, name: &str, start: (u32, u32), time: (u32, u32), finish: (u32, u32)) -> RegistrationPeriod {
        RegistrationPeriod {
            id: PeriodId(id),
            name: name.to_string(),
            start: at(start.0, start.1, 0),
            time: at(time.0, time.1, 0),
            finish: at(finish.0, finish.1, 0),
        }
    }

    fn school_day() -> Schedule {
        // Deliberately inserted out of order.
        [
            period(2, "Period 2", (9, 0), (9, 0), (9, 59)),
            period(100, "AM", (7, 37), (7, 40), (7, 55)),
            period(1, "Period 1", (8, 0), (8, 0), (8, 59)),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn add_period_overwrites_by_id() {
        let mut s = Schedule::new();
        s.add_period(period(1, "P1", (8, 0), (8, 0), (8, 59)));
        s.add_period(period(2, "P2", (9, 0), (9, 0), (9, 59)));
        assert_eq!(s.len(), 2);

        s.add_period(period(1, "P1 moved", (10, 0), (10, 0), (10, 59)));
        assert_eq!(s.len(), 2);
        assert_eq!(s.get(PeriodId(1)).unwrap().name, "P1 moved");
        assert_eq!(s.first_period().unwrap().id, PeriodId(2));
    }

    #[test]
    fn periods_iterate_in_start_order() {
        let ids: Vec<_> = school_day().periods().map(|p| p.id.0).collect();
        assert_eq!(ids, vec![100, 1, 2]);
    }

    #[test]
    fn period_by_name_found_and_missing() {
        let s = school_day();
        assert_eq!(s.period_by_name("Period 1").unwrap().id, PeriodId(1));
        assert!(s.period_by_name("Period 3").is_none());
        assert!(Schedule::new().period_by_name("AM").is_none());
    }

    #[test]
    fn before_first_start_belongs_to_first_period() {
        let s = school_day();
        assert_eq!(s.period_by_time(at(6, 0, 0)).unwrap().id, PeriodId(100));
        assert!(s.is_before_first_period(at(7, 36, 59)));
        assert!(!s.is_before_first_period(at(7, 37, 0)));
    }

    #[test]
    fn period_by_time_bounds_are_inclusive() {
        let s = school_day();
        assert_eq!(s.period_by_time(at(7, 37, 0)).unwrap().id, PeriodId(100));
        assert_eq!(s.period_by_time(at(7, 55, 0)).unwrap().id, PeriodId(100));
        assert_eq!(s.period_by_time(at(8, 59, 0)).unwrap().id, PeriodId(1));
        assert_eq!(s.period_by_time(at(9, 0, 0)).unwrap().id, PeriodId(2));
    }

    #[test]
    fn period_by_time_gap_and_after_last_are_none() {
        let s = school_day();
        assert!(s.period_by_time(at(7, 58, 0)).is_none());
        assert!(s.period_by_time(at(8, 59, 30)).is_none());
        assert!(s.period_by_time(at(10, 0, 0)).is_none());
        assert!(s.is_after_last_period(at(10, 0, 0)));
        assert!(!s.is_after_last_period(at(9, 59, 0)));
    }

    #[test]
    fn first_and_last_period() {
        let s = school_day();
        assert_eq!(s.first_period().unwrap().id, PeriodId(100));
        assert_eq!(s.last_period().unwrap().id, PeriodId(2));

        let empty = Schedule::new();
        assert!(empty.first_period().is_none());
        assert!(empty.last_period().is_none());
        assert!(empty.period_by_time(at(8, 0, 0)).is_none());
        assert!(!empty.is_before_first_period(at(8, 0, 0)));
        assert!(!empty.is_after_last_period(at(8, 0, 0)));
    }

    #[test]
    fn ties_break_deterministically() {
        let s: Schedule = [
            period(7, "B", (8, 0), (8, 0), (9, 0)),
            period(3, "A", (8, 0), (8, 0), (9, 0)),
        ]
        .into_iter()
        .collect();
        assert_eq!(s.first_period().unwrap().id, PeriodId(3));
        assert_eq!(s.last_period().unwrap().id, PeriodId(7));
        assert_eq!(s.period_by_time(at(8, 30, 0)).unwrap().id, PeriodId(3));
    }
}
