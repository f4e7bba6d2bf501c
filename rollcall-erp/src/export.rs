//! Directory-backed ERP.
//!
//! `JsonExportErp` reads a directory of JSON exports and answers
//! [`ErpClient`] calls from them:
//!
//! ```text
//! <dir>/
//!   students.json        [Student, ...]
//!   divisions.json       { "<yearGroupId>": [Division, ...], ... }
//!   periods.json         { "<divisionId>": [RegistrationPeriodDto, ...], ... }
//!   statuses.json        [RegistrationStatus, ...]
//!   present_codes.json   [PresentCode, ...]
//!   absence_codes.json   [AbsenceCode, ...]
//!   outbox.json          [OutboxEntry, ...]   (written)
//! ```
//!
//! Missing files read as empty. Every `put_registration` updates
//! `statuses.json` and appends to `outbox.json`; both writes go through
//! `.tmp` + rename.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::dto::{
    AbsenceCode, Division, PresentCode, RegistrationAbsenceCodesResponse, RegistrationPeriodDto,
    RegistrationPeriodsResponse, RegistrationPresentCodesResponse, RegistrationStatus,
    RegistrationStatusUpdate, Student, StudentsResponse, YearGroupDivisionsResponse,
};
use crate::error::{io_err, json_err, ErpError};
use crate::ErpClient;

pub const STUDENTS_FILE: &str = "students.json";
pub const DIVISIONS_FILE: &str = "divisions.json";
pub const PERIODS_FILE: &str = "periods.json";
pub const STATUSES_FILE: &str = "statuses.json";
pub const PRESENT_CODES_FILE: &str = "present_codes.json";
pub const ABSENCE_CODES_FILE: &str = "absence_codes.json";
pub const OUTBOX_FILE: &str = "outbox.json";

/// A registration write recorded in `outbox.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboxEntry {
    pub school_id: String,
    pub registration_period_id: i32,
    pub update: RegistrationStatusUpdate,
}

/// [`ErpClient`] over a directory of JSON exports.
#[derive(Debug, Clone)]
pub struct JsonExportErp {
    dir: PathBuf,
}

impl JsonExportErp {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Every write recorded so far, oldest first.
    pub fn outbox(&self) -> Result<Vec<OutboxEntry>, ErpError> {
        self.read_or_default(OUTBOX_FILE)
    }

    fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    fn read_or_default<T: DeserializeOwned + Default>(&self, file: &str) -> Result<T, ErpError> {
        let path = self.path(file);
        if !path.exists() {
            return Ok(T::default());
        }
        let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
        serde_json::from_str(&contents).map_err(|e| json_err(&path, e))
    }

    fn write<T: Serialize>(&self, file: &str, value: &T) -> Result<(), ErpError> {
        let path = self.path(file);
        std::fs::create_dir_all(&self.dir).map_err(|e| io_err(&self.dir, e))?;
        let json = serde_json::to_string_pretty(value).map_err(|e| json_err(&path, e))?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| io_err(&tmp, e))?;
        std::fs::rename(&tmp, &path).map_err(|e| io_err(&path, e))?;
        Ok(())
    }
}

impl ErpClient for JsonExportErp {
    fn get_students(&self, page: i32, page_size: i32) -> Result<StudentsResponse, ErpError> {
        let all: Vec<Student> = self.read_or_default(STUDENTS_FILE)?;
        let size = page_size.max(1);
        let page = page.max(1);
        let size_len = usize::try_from(size).unwrap_or(usize::MAX);
        let total_count = i32::try_from(all.len()).unwrap_or(i32::MAX);
        let total_pages = i32::try_from(all.len().div_ceil(size_len)).unwrap_or(i32::MAX);
        let skip = usize::try_from(page - 1)
            .unwrap_or(0)
            .saturating_mul(size_len);
        let students: Vec<Student> = all.into_iter().skip(skip).take(size_len).collect();
        debug!(page, page_size = size, returned = students.len(), "students page read");
        Ok(StudentsResponse {
            count: i32::try_from(students.len()).unwrap_or(i32::MAX),
            page,
            page_size: size,
            students,
            total_count,
            total_pages,
        })
    }

    fn get_year_group_divisions(
        &self,
        year_group_id: i32,
    ) -> Result<YearGroupDivisionsResponse, ErpError> {
        let mut by_year: BTreeMap<i32, Vec<Division>> = self.read_or_default(DIVISIONS_FILE)?;
        Ok(YearGroupDivisionsResponse {
            divisions: by_year.remove(&year_group_id).unwrap_or_default(),
        })
    }

    fn get_current_registration_periods_for_division(
        &self,
        division_id: i32,
    ) -> Result<RegistrationPeriodsResponse, ErpError> {
        let mut by_division: BTreeMap<i32, Vec<RegistrationPeriodDto>> =
            self.read_or_default(PERIODS_FILE)?;
        let registration_periods =
            by_division
                .remove(&division_id)
                .ok_or_else(|| ErpError::NotFound {
                    resource: format!("registration periods for division {division_id}"),
                })?;
        Ok(RegistrationPeriodsResponse {
            registration_periods,
        })
    }

    /// A period with no recorded status reads as not yet registered.
    fn get_registration_status_for_student(
        &self,
        school_id: &str,
        period_id: i32,
    ) -> Result<RegistrationStatus, ErpError> {
        let statuses: Vec<RegistrationStatus> = self.read_or_default(STATUSES_FILE)?;
        Ok(statuses
            .into_iter()
            .find(|s| s.school_id == school_id && s.registration_period_id == period_id)
            .unwrap_or_else(|| RegistrationStatus {
                registration_period_id: period_id,
                school_id: school_id.to_string(),
                ..RegistrationStatus::default()
            }))
    }

    fn put_registration(
        &self,
        school_id: &str,
        period_id: i32,
        update: &RegistrationStatusUpdate,
    ) -> Result<(), ErpError> {
        let mut statuses: Vec<RegistrationStatus> = self.read_or_default(STATUSES_FILE)?;
        match statuses
            .iter_mut()
            .find(|s| s.school_id == school_id && s.registration_period_id == period_id)
        {
            Some(status) => status.apply(update),
            None => {
                let mut status = RegistrationStatus {
                    registration_period_id: period_id,
                    school_id: school_id.to_string(),
                    ..RegistrationStatus::default()
                };
                status.apply(update);
                statuses.push(status);
            }
        }
        self.write(STATUSES_FILE, &statuses)?;

        let mut outbox = self.outbox()?;
        outbox.push(OutboxEntry {
            school_id: school_id.to_string(),
            registration_period_id: period_id,
            update: update.clone(),
        });
        self.write(OUTBOX_FILE, &outbox)?;

        info!(school_id, period_id, "registration written");
        Ok(())
    }

    fn get_registration_absence_codes(&self) -> Result<RegistrationAbsenceCodesResponse, ErpError> {
        let absence_codes: Vec<AbsenceCode> = self.read_or_default(ABSENCE_CODES_FILE)?;
        Ok(RegistrationAbsenceCodesResponse { absence_codes })
    }

    fn get_registration_present_codes(&self) -> Result<RegistrationPresentCodesResponse, ErpError> {
        let present_codes: Vec<PresentCode> = self.read_or_default(PRESENT_CODES_FILE)?;
        Ok(RegistrationPresentCodesResponse { present_codes })
    }
}
