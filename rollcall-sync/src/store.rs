//! Local visitor storage.
//!
//! [`VisitorStore`] is the seam the sync and the tracker use. The shipped
//! implementation, [`JsonVisitorStore`], keeps every visitor and access key in
//! one JSON document:
//!
//! ```text
//! ~/.rollcall/
//!   visitors.json
//! ```
//!
//! Writes use the `.tmp` + rename pattern so a crash never leaves a torn file.
//! Like the config loader, the store opens either with an explicit home
//! (`open_at`, used by tests) or from `dirs::home_dir()` (`open`).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use rollcall_core::config::rollcall_root;
use rollcall_core::{VisitDetails, Visitor, VisitorId};

use crate::error::{io_err, SyncError};

/// Persistence of visitors and their access keys.
pub trait VisitorStore {
    fn get_all(&self) -> Result<Vec<Visitor>, SyncError>;

    fn find_by_id(&self, id: VisitorId) -> Result<Option<Visitor>, SyncError>;

    /// Resolve a visitor through one of its access keys.
    fn find_by_key(&self, key: &str) -> Result<Option<VisitDetails>, SyncError>;

    fn add_key_to_visitor(&mut self, id: VisitorId, key: &str) -> Result<(), SyncError>;

    /// Insert when `visitor.id` is `None`, otherwise update in place.
    ///
    /// Returns the stored record, carrying its assigned ID.
    fn add_visitor(&mut self, visitor: Visitor) -> Result<Visitor, SyncError>;

    /// Latest `updated_at` across all visitors, `None` when nothing is stamped.
    fn get_max_updated_at(&self) -> Result<Option<DateTime<Utc>>, SyncError>;
}

/// On-disk store payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct VisitorStoreFile {
    #[serde(default)]
    pub visitors: Vec<Visitor>,
    /// Access key → owning visitor.
    #[serde(default)]
    pub keys: BTreeMap<String, VisitorId>,
}

/// `<home>/.rollcall/visitors.json`: pure, no I/O.
pub fn store_path_at(home: &Path) -> PathBuf {
    rollcall_root(home).join("visitors.json")
}

/// [`VisitorStore`] persisted as a single JSON document.
#[derive(Debug)]
pub struct JsonVisitorStore {
    path: PathBuf,
    file: VisitorStoreFile,
}

impl JsonVisitorStore {
    /// Open the store rooted at `home`; a missing file is an empty store.
    pub fn open_at(home: &Path) -> Result<Self, SyncError> {
        let path = store_path_at(home);
        let file = if path.exists() {
            let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
            serde_json::from_str(&contents)?
        } else {
            VisitorStoreFile::default()
        };
        debug!(path = %path.display(), visitors = file.visitors.len(), "visitor store opened");
        Ok(Self { path, file })
    }

    /// `open_at` convenience wrapper.
    pub fn open() -> Result<Self, SyncError> {
        let home = dirs::home_dir().ok_or(SyncError::HomeNotFound)?;
        Self::open_at(&home)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> Result<(), SyncError> {
        let Some(dir) = self.path.parent() else {
            return Err(io_err(
                &self.path,
                std::io::Error::other("invalid visitor store path"),
            ));
        };
        std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;

        let json = serde_json::to_string_pretty(&self.file)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, &json).map_err(|e| io_err(&tmp, e))?;
        if let Err(e) = std::fs::rename(&tmp, &self.path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(io_err(&self.path, e));
        }
        Ok(())
    }

    fn position(&self, id: VisitorId) -> Option<usize> {
        self.file.visitors.iter().position(|v| v.id == Some(id))
    }

    fn next_id(&self) -> VisitorId {
        let max = self
            .file
            .visitors
            .iter()
            .filter_map(|v| v.id)
            .map(|id| id.0)
            .max()
            .unwrap_or(0);
        VisitorId(max + 1)
    }
}

impl VisitorStore for JsonVisitorStore {
    fn get_all(&self) -> Result<Vec<Visitor>, SyncError> {
        Ok(self.file.visitors.clone())
    }

    fn find_by_id(&self, id: VisitorId) -> Result<Option<Visitor>, SyncError> {
        Ok(self.position(id).map(|pos| self.file.visitors[pos].clone()))
    }

    fn find_by_key(&self, key: &str) -> Result<Option<VisitDetails>, SyncError> {
        let Some(&id) = self.file.keys.get(key) else {
            return Ok(None);
        };
        Ok(self.find_by_id(id)?.map(|visitor| VisitDetails {
            visitor,
            key: key.to_string(),
        }))
    }

    fn add_key_to_visitor(&mut self, id: VisitorId, key: &str) -> Result<(), SyncError> {
        if self.position(id).is_none() {
            return Err(SyncError::VisitorNotFound { id });
        }
        match self.file.keys.get(key) {
            Some(&owner) if owner == id => return Ok(()),
            Some(&owner) => {
                return Err(SyncError::KeyInUse {
                    key: key.to_string(),
                    owner,
                })
            }
            None => {}
        }
        self.file.keys.insert(key.to_string(), id);
        self.save()?;
        info!(visitor = %id, "key assigned");
        Ok(())
    }

    fn add_visitor(&mut self, mut visitor: Visitor) -> Result<Visitor, SyncError> {
        match visitor.id {
            Some(id) => {
                let pos = self
                    .position(id)
                    .ok_or(SyncError::VisitorNotFound { id })?;
                self.file.visitors[pos] = visitor.clone();
                debug!(visitor = %id, erp_id = visitor.erp_id, "visitor updated");
            }
            None => {
                let id = self.next_id();
                visitor.id = Some(id);
                self.file.visitors.push(visitor.clone());
                debug!(visitor = %id, erp_id = visitor.erp_id, "visitor inserted");
            }
        }
        self.save()?;
        Ok(visitor)
    }

    fn get_max_updated_at(&self) -> Result<Option<DateTime<Utc>>, SyncError> {
        Ok(self.file.visitors.iter().filter_map(|v| v.updated_at).max())
    }
}
