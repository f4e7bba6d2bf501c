//! ERP-local time source.
//!
//! Every instant the engine compares lives in the ERP's timezone, so the
//! clock hands out `DateTime<Tz>` rather than UTC.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// An instant expressed in the ERP-local timezone.
pub type ErpTime = DateTime<Tz>;

/// Source of "now" for tracking sessions and syncs.
pub trait Clock: Send + Sync {
    fn now(&self) -> ErpTime;
}

/// Wall-clock time converted into the configured timezone.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    tz: Tz,
}

impl SystemClock {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }
}

impl Clock for SystemClock {
    fn now(&self) -> ErpTime {
        Utc::now().with_timezone(&self.tz)
    }
}

/// A clock pinned to one instant. Used by tests and `--at` replays.
#[derive(Debug, Clone)]
pub struct FixedClock {
    at: ErpTime,
}

impl FixedClock {
    pub fn new(at: ErpTime) -> Self {
        Self { at }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> ErpTime {
        self.at
    }
}
