//! Rollcall configuration.
//!
//! # Storage layout
//!
//! ```text
//! ~/.rollcall/
//!   config.yaml   (optional; defaults apply when absent)
//!   visitors.json (local visitor store, see rollcall-sync)
//! ```
//!
//! Like the visitor store, every loader has two forms: `load_at(home)` with
//! an explicit home (used by tests with `TempDir`) and `load()` which resolves
//! home via `dirs::home_dir()`.
//!
//! After the file is read, `ROLLCALL_ERP_TIMEZONE` and `ROLLCALL_MAIN_PERIOD`
//! override the matching fields.

use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const ENV_ERP_TIMEZONE: &str = "ROLLCALL_ERP_TIMEZONE";
pub const ENV_MAIN_PERIOD: &str = "ROLLCALL_MAIN_PERIOD";

/// Deployment settings read from `config.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// IANA name of the ERP's local timezone.
    pub erp_timezone: String,
    pub first_registration_period_name: String,
    pub default_present_code_name: String,
    pub default_late_code_name: String,
    pub default_lesson_absence_code_name: String,
    pub students_page_size: i32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            erp_timezone: "UTC".to_string(),
            first_registration_period_name: "AM".to_string(),
            default_present_code_name: "/".to_string(),
            default_late_code_name: "C".to_string(),
            default_lesson_absence_code_name: "C".to_string(),
            students_page_size: 100,
        }
    }
}

/// The names the attendance engine resolves at decision time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendancePolicy {
    pub main_period_name: String,
    pub present_code: String,
    pub late_code: String,
    pub lesson_absence_code: String,
}

impl Default for AttendancePolicy {
    fn default() -> Self {
        Config::default().attendance_policy()
    }
}

impl Config {
    /// Parse `erp_timezone` into a `chrono_tz::Tz`.
    pub fn timezone(&self) -> Result<Tz, ConfigError> {
        self.erp_timezone
            .parse::<Tz>()
            .map_err(|_| ConfigError::UnknownTimezone {
                name: self.erp_timezone.clone(),
            })
    }

    pub fn attendance_policy(&self) -> AttendancePolicy {
        AttendancePolicy {
            main_period_name: self.first_registration_period_name.clone(),
            present_code: self.default_present_code_name.clone(),
            late_code: self.default_late_code_name.clone(),
            lesson_absence_code: self.default_lesson_absence_code_name.clone(),
        }
    }

    /// Apply environment overrides through `lookup` (normally `std::env::var`).
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(tz) = lookup(ENV_ERP_TIMEZONE).filter(|v| !v.is_empty()) {
            self.erp_timezone = tz;
        }
        if let Some(name) = lookup(ENV_MAIN_PERIOD).filter(|v| !v.is_empty()) {
            self.first_registration_period_name = name;
        }
        self
    }
}

/// `<home>/.rollcall/`
pub fn rollcall_root(home: &Path) -> PathBuf {
    home.join(".rollcall")
}

/// `<home>/.rollcall/config.yaml`: pure, no I/O.
pub fn config_path_at(home: &Path) -> PathBuf {
    rollcall_root(home).join("config.yaml")
}

/// Load the configuration rooted at `home`, then apply environment overrides.
///
/// A missing file yields [`Config::default`]; malformed YAML is
/// [`ConfigError::Parse`]. The timezone is validated before returning.
pub fn load_at(home: &Path) -> Result<Config, ConfigError> {
    let config = read_file_at(home)?.with_overrides(|key| std::env::var(key).ok());
    config.timezone()?;
    Ok(config)
}

/// `load_at` convenience wrapper.
pub fn load() -> Result<Config, ConfigError> {
    load_at(&home()?)
}

fn read_file_at(home: &Path) -> Result<Config, ConfigError> {
    let path = config_path_at(home);
    if !path.exists() {
        return Ok(Config::default());
    }
    let contents = std::fs::read_to_string(&path)?;
    serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse { path, source: e })
}

/// Write `config` to `<home>/.rollcall/config.yaml` via `.tmp` + rename.
pub fn save_at(home: &Path, config: &Config) -> Result<(), ConfigError> {
    let path = config_path_at(home);
    std::fs::create_dir_all(rollcall_root(home))?;
    let tmp = path.with_extension("yaml.tmp");
    let yaml = serde_yaml::to_string(config)?;
    std::fs::write(&tmp, yaml)?;
    std::fs::rename(&tmp, &path)?;
    Ok(())
}

fn home() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::HomeNotFound)
}
