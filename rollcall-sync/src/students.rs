//! Bulk student sync: ERP student export → local visitor store.
//!
//! ## Run protocol
//!
//! 1. Snapshot every local visitor.
//! 2. Page through `get_students` from page 1 until `page >= totalPages`.
//! 3. Map each student to a [`Visitor`], resolving its divisions through
//!    `get_year_group_divisions` (cached per year group for the run).
//! 4. Classify against the snapshot; write only new or changed records.
//!
//! Any ERP or store error aborts the run.

use std::collections::HashMap;

use chrono::{DateTime, SubsecRound, Utc};
use tracing::{debug, info};

use rollcall_core::{Visitor, VisitorId};
use rollcall_erp::{ErpClient, Student};

use crate::diff::{Freshness, LocalSnapshot};
use crate::error::SyncError;
use crate::store::VisitorStore;

/// Page size used when none is configured.
pub const DEFAULT_PAGE_SIZE: i32 = 100;

/// Outcome of syncing a single student.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Inserted { id: VisitorId, erp_id: i64 },
    Updated { id: VisitorId, erp_id: i64 },
    Unchanged { erp_id: i64 },
}

/// Per-student outcomes of one run, in ERP order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub outcomes: Vec<SyncOutcome>,
    pub pages: i32,
}

impl SyncReport {
    pub fn inserted(&self) -> usize {
        self.count(|o| matches!(o, SyncOutcome::Inserted { .. }))
    }

    pub fn updated(&self) -> usize {
        self.count(|o| matches!(o, SyncOutcome::Updated { .. }))
    }

    pub fn unchanged(&self) -> usize {
        self.count(|o| matches!(o, SyncOutcome::Unchanged { .. }))
    }

    fn count(&self, f: impl Fn(&SyncOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| f(o)).count()
    }
}

/// One bulk sync run over an ERP and a store.
///
/// The run owns its snapshot and division cache; both are rebuilt by every
/// call to [`StudentSync::run`].
pub struct StudentSync<'a, E: ?Sized, S: ?Sized> {
    erp: &'a E,
    store: &'a mut S,
    page_size: i32,
    snapshot: LocalSnapshot,
    divisions: HashMap<i32, Vec<i32>>,
}

impl<'a, E, S> StudentSync<'a, E, S>
where
    E: ErpClient + ?Sized,
    S: VisitorStore + ?Sized,
{
    pub fn new(erp: &'a E, store: &'a mut S) -> Self {
        Self {
            erp,
            store,
            page_size: DEFAULT_PAGE_SIZE,
            snapshot: LocalSnapshot::default(),
            divisions: HashMap::new(),
        }
    }

    /// Override the page size; non-positive values fall back to the default.
    pub fn with_page_size(mut self, page_size: i32) -> Self {
        self.page_size = if page_size > 0 {
            page_size
        } else {
            DEFAULT_PAGE_SIZE
        };
        self
    }

    /// Sync every ERP student. `now` stamps new records the ERP left unstamped.
    pub fn run(&mut self, now: DateTime<Utc>) -> Result<SyncReport, SyncError> {
        self.snapshot = LocalSnapshot::new(self.store.get_all()?);
        self.divisions.clear();
        debug!(local = self.snapshot.len(), "sync snapshot taken");

        let mut report = SyncReport::default();
        let mut page = 1;
        loop {
            let resp = self.erp.get_students(page, self.page_size)?;
            debug!(page, total_pages = resp.total_pages, students = resp.students.len(), "students page fetched");
            for student in &resp.students {
                let outcome = self.save_student(student, now)?;
                report.outcomes.push(outcome);
            }
            report.pages = page;
            if resp.total_pages <= page {
                break;
            }
            page += 1;
        }

        info!(
            inserted = report.inserted(),
            updated = report.updated(),
            unchanged = report.unchanged(),
            "student sync finished"
        );
        Ok(report)
    }

    fn save_student(&mut self, student: &Student, now: DateTime<Utc>) -> Result<SyncOutcome, SyncError> {
        let mut visitor = Visitor {
            surname: student.full_name.clone().unwrap_or_default(),
            grade: student.year_group.unwrap_or_default(),
            is_student: true,
            erp_id: student.id,
            erp_school_id: student.school_id.clone(),
            erp_year_group_id: student.year_group.unwrap_or_default(),
            updated_at: parse_last_updated(student.last_updated.as_deref()),
            ..Visitor::default()
        };
        if let Some(year_group) = student.year_group {
            visitor.erp_divisions = self.divisions_for(year_group)?;
        }

        let freshness = self.snapshot.classify(&mut visitor, now);
        if !freshness.needs_write() {
            return Ok(SyncOutcome::Unchanged {
                erp_id: student.id,
            });
        }

        let stored = self.store.add_visitor(visitor)?;
        let erp_id = stored.erp_id;
        let id = stored.id.unwrap_or(VisitorId(0));
        info!(
            visitor = %id,
            erp_id,
            name = %stored.display_name(),
            hash = %stored.sync_hash_hex(),
            ?freshness,
            "visitor stored"
        );
        self.snapshot.upsert(stored);

        Ok(match freshness {
            Freshness::New => SyncOutcome::Inserted { id, erp_id },
            _ => SyncOutcome::Updated { id, erp_id },
        })
    }

    fn divisions_for(&mut self, year_group: i32) -> Result<Vec<i32>, SyncError> {
        if let Some(ids) = self.divisions.get(&year_group) {
            return Ok(ids.clone());
        }
        let resp = self.erp.get_year_group_divisions(year_group)?;
        let ids: Vec<i32> = resp.divisions.iter().map(|d| d.id).collect();
        self.divisions.insert(year_group, ids.clone());
        Ok(ids)
    }
}

/// Parse the ERP's RFC 3339 `lastUpdated`, truncated to whole seconds.
///
/// Absent or malformed values are the zero timestamp (`None`).
pub fn parse_last_updated(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = raw?;
    match DateTime::parse_from_rfc3339(raw) {
        Ok(t) => Some(t.with_timezone(&Utc).trunc_subsecs(0)),
        Err(e) => {
            debug!(value = raw, error = %e, "unparseable lastUpdated; treated as unset");
            None
        }
    }
}
