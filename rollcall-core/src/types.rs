//! Domain types shared across the rollcall crates.
//!
//! Local identifiers get newtypes; ERP identifiers stay as the raw integers
//! the ERP hands out.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Local (store-assigned) identifier of a visitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VisitorId(pub i32);

impl fmt::Display for VisitorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<i32> for VisitorId {
    fn from(v: i32) -> Self {
        Self(v)
    }
}

/// ERP identifier of a registration period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PeriodId(pub i32);

impl fmt::Display for PeriodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<i32> for PeriodId {
    fn from(v: i32) -> Self {
        Self(v)
    }
}

/// Provider numeric ID of a registration (present/absence) code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CodeId(pub i32);

impl fmt::Display for CodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<i32> for CodeId {
    fn from(v: i32) -> Self {
        Self(v)
    }
}

// ---------------------------------------------------------------------------
// Visitor
// ---------------------------------------------------------------------------

/// A person who checks in, with their ERP linkage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Visitor {
    /// `None` until the store has assigned an ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<VisitorId>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub surname: String,
    #[serde(default)]
    pub grade: i32,
    #[serde(default)]
    pub is_student: bool,
    pub erp_id: i64,
    #[serde(default)]
    pub erp_school_id: String,
    #[serde(default)]
    pub erp_year_group_id: i32,
    #[serde(default)]
    pub erp_divisions: Vec<i32>,
    /// Upstream "last updated" stamp; `None` is the zero timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Visitor {
    /// 64-bit content digest of the ERP linkage.
    ///
    /// Covers `erp_id`, `erp_school_id`, `erp_year_group_id` and the sorted
    /// divisions. Every field is length-prefixed or fixed-width, so the value
    /// is stable across restarts and shifts when the division list grows or
    /// shrinks.
    pub fn sync_hash(&self) -> u64 {
        let mut divisions = self.erp_divisions.clone();
        divisions.sort_unstable();

        let mut h = Sha256::new();
        h.update(self.erp_id.to_be_bytes());
        h.update((self.erp_school_id.len() as u64).to_be_bytes());
        h.update(self.erp_school_id.as_bytes());
        h.update(self.erp_year_group_id.to_be_bytes());
        h.update((divisions.len() as u64).to_be_bytes());
        for division in &divisions {
            h.update(division.to_be_bytes());
        }
        let digest = h.finalize();

        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);
        u64::from_be_bytes(head)
    }

    /// [`Visitor::sync_hash`] as 16 lowercase hex digits.
    pub fn sync_hash_hex(&self) -> String {
        hex::encode(self.sync_hash().to_be_bytes())
    }

    pub fn display_name(&self) -> String {
        match (self.name.is_empty(), self.surname.is_empty()) {
            (true, _) => self.surname.clone(),
            (false, true) => self.name.clone(),
            (false, false) => format!("{} {}", self.name, self.surname),
        }
    }
}

/// A visitor resolved through one of its access keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitDetails {
    pub visitor: Visitor,
    pub key: String,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
