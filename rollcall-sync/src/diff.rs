//! Write-or-skip decisions for records fetched from the ERP.
//!
//! Incoming visitors are matched to a [`LocalSnapshot`] by ERP ID. A match
//! lends its local ID to the incoming record; the record is then up to date
//! when the ERP sent no timestamp, or when both the timestamp and the
//! [`Visitor::sync_hash`] agree with the stored copy.

use std::collections::HashMap;

use chrono::{DateTime, SubsecRound, Utc};

use rollcall_core::Visitor;

/// Outcome of comparing one incoming record against the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// No local record with this ERP ID.
    New,
    /// Local record exists but differs.
    Changed,
    UpToDate,
}

impl Freshness {
    pub fn needs_write(self) -> bool {
        !matches!(self, Freshness::UpToDate)
    }
}

/// Local visitors keyed by ERP ID, captured once per sync run.
#[derive(Debug, Clone, Default)]
pub struct LocalSnapshot {
    by_erp_id: HashMap<i64, Visitor>,
}

impl LocalSnapshot {
    pub fn new(visitors: impl IntoIterator<Item = Visitor>) -> Self {
        let mut by_erp_id = HashMap::new();
        for visitor in visitors {
            // First stored record wins when ERP IDs repeat.
            by_erp_id.entry(visitor.erp_id).or_insert(visitor);
        }
        Self { by_erp_id }
    }

    pub fn get(&self, erp_id: i64) -> Option<&Visitor> {
        self.by_erp_id.get(&erp_id)
    }

    pub fn len(&self) -> usize {
        self.by_erp_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_erp_id.is_empty()
    }

    /// Record a visitor just written so later duplicates in the same run match it.
    pub fn upsert(&mut self, visitor: Visitor) {
        self.by_erp_id.insert(visitor.erp_id, visitor);
    }

    /// Classify `incoming`, filling in its local ID (on a match) or its
    /// timestamp (for an unstamped new record, `now` truncated to seconds).
    pub fn classify(&self, incoming: &mut Visitor, now: DateTime<Utc>) -> Freshness {
        let Some(local) = self.get(incoming.erp_id) else {
            if incoming.updated_at.is_none() {
                incoming.updated_at = Some(now.trunc_subsecs(0));
            }
            return Freshness::New;
        };

        incoming.id = local.id;
        match incoming.updated_at {
            None => Freshness::UpToDate,
            Some(stamp)
                if local.updated_at == Some(stamp)
                    && local.sync_hash() == incoming.sync_hash() =>
            {
                Freshness::UpToDate
            }
            Some(_) => Freshness::Changed,
        }
    }

    /// `true` when `incoming` needs no write. See [`LocalSnapshot::classify`].
    pub fn is_up_to_date(&self, incoming: &mut Visitor, now: DateTime<Utc>) -> bool {
        !self.classify(incoming, now).needs_write()
    }
}
