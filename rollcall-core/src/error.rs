//! Error types for rollcall-core.

use std::path::PathBuf;

use thiserror::Error;

/// Lookup failures raised by the attendance engine.
///
/// These are configuration problems (a period or code the deployment expects
/// is missing), so callers surface them rather than retry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttendanceError {
    /// The schedule has no period with the configured main-period name.
    #[error("main registration period not found: expected default period {name}")]
    MainPeriodNotFound { name: String },

    /// The schedule has the main period but the student's slot index does not.
    #[error("student schedule period not found: expected default period {name}")]
    StudentSchedulePeriodNotFound { name: String },

    /// Present dictionary unset, or it lacks the configured present code.
    #[error("default present code not found: expected code {code:?} in present codes")]
    DefaultPresentCodeNotFound { code: String },

    /// Present dictionary unset, or it lacks the configured late code.
    #[error("default late code not found: expected code {code:?} in present codes")]
    DefaultLateCodeNotFound { code: String },

    /// Absence dictionary unset, or it lacks the configured lesson-absence code.
    #[error("default lesson absence code not found: expected code {code:?} in absence codes")]
    DefaultLessonAbsenceCodeNotFound { code: String },
}

/// All errors that can arise while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization error on save.
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// YAML parse error on load, with the offending path.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("unknown ERP timezone {name:?}")]
    UnknownTimezone { name: String },

    /// `dirs::home_dir()` returned `None`.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,
}
