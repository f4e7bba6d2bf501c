//! Registration code dictionaries.
//!
//! The ERP publishes two code lists: present codes and absence codes. A
//! refresh job rebuilds each list as a fresh [`RegistrationCodeDictionary`]
//! and swaps it into the shared [`CodeCatalog`]. Readers clone the `Arc`
//! under a read lock, so a refresh never exposes a half-built dictionary and
//! a dictionary is never mutated once published.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AttendanceError;
use crate::types::CodeId;

/// A business attendance-reason code mapped to its provider ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationCode {
    pub id: CodeId,
    /// Business code string, e.g. `/` or `C`.
    pub code: String,
    pub name: String,
    pub is_absence_code: bool,
}

/// One complete code list as fetched at `uploaded_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationCodeDictionary {
    codes: HashMap<CodeId, RegistrationCode>,
    uploaded_at: DateTime<Utc>,
}

impl RegistrationCodeDictionary {
    pub fn new(
        codes: impl IntoIterator<Item = RegistrationCode>,
        uploaded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            codes: codes.into_iter().map(|c| (c.id, c)).collect(),
            uploaded_at,
        }
    }

    /// Exact match on the business code string.
    ///
    /// When the ERP lists the same code twice, the lowest ID wins.
    pub fn find_by_code(&self, code: &str) -> Option<&RegistrationCode> {
        self.codes
            .values()
            .filter(|c| c.code == code)
            .min_by_key(|c| c.id)
    }

    pub fn get(&self, id: CodeId) -> Option<&RegistrationCode> {
        self.codes.get(&id)
    }

    /// Codes sorted by ID.
    pub fn codes(&self) -> Vec<&RegistrationCode> {
        let mut codes: Vec<_> = self.codes.values().collect();
        codes.sort_by_key(|c| c.id);
        codes
    }

    pub fn uploaded_at(&self) -> DateTime<Utc> {
        self.uploaded_at
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

type Slot = RwLock<Option<Arc<RegistrationCodeDictionary>>>;

/// The process-wide pair of code dictionaries.
///
/// Both start unset; lookups against an unset dictionary fail with the
/// matching "default code not found" error.
#[derive(Debug, Default)]
pub struct CodeCatalog {
    present: Slot,
    absence: Slot,
}

impl CodeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the present-code dictionary.
    pub fn present(&self) -> Option<Arc<RegistrationCodeDictionary>> {
        read(&self.present)
    }

    /// Snapshot of the absence-code dictionary.
    pub fn absence(&self) -> Option<Arc<RegistrationCodeDictionary>> {
        read(&self.absence)
    }

    /// Publish a new present-code dictionary, replacing the old one whole.
    pub fn replace_present(&self, dictionary: RegistrationCodeDictionary) {
        replace(&self.present, dictionary);
    }

    /// Publish a new absence-code dictionary, replacing the old one whole.
    pub fn replace_absence(&self, dictionary: RegistrationCodeDictionary) {
        replace(&self.absence, dictionary);
    }

    /// Drop the present-code dictionary.
    pub fn clear_present(&self) {
        *self.present.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Drop the absence-code dictionary.
    pub fn clear_absence(&self) {
        *self.absence.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn default_present_code(&self, name: &str) -> Result<CodeId, AttendanceError> {
        lookup(self.present(), name).ok_or_else(|| AttendanceError::DefaultPresentCodeNotFound {
            code: name.to_string(),
        })
    }

    pub fn default_late_code(&self, name: &str) -> Result<CodeId, AttendanceError> {
        lookup(self.present(), name).ok_or_else(|| AttendanceError::DefaultLateCodeNotFound {
            code: name.to_string(),
        })
    }

    pub fn default_lesson_absence_code(&self, name: &str) -> Result<CodeId, AttendanceError> {
        lookup(self.absence(), name).ok_or_else(|| {
            AttendanceError::DefaultLessonAbsenceCodeNotFound {
                code: name.to_string(),
            }
        })
    }
}

fn read(slot: &Slot) -> Option<Arc<RegistrationCodeDictionary>> {
    slot.read().unwrap_or_else(PoisonError::into_inner).clone()
}

fn replace(slot: &Slot, dictionary: RegistrationCodeDictionary) {
    let fresh = Arc::new(dictionary);
    *slot.write().unwrap_or_else(PoisonError::into_inner) = Some(fresh);
}

fn lookup(dictionary: Option<Arc<RegistrationCodeDictionary>>, name: &str) -> Option<CodeId> {
    dictionary.and_then(|d| d.find_by_code(name).map(|c| c.id))
}
