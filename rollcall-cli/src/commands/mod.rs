pub mod codes;
pub mod key;
pub mod periods;
pub mod sync;
pub mod track;

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono_tz::Tz;
use tracing::debug;

use rollcall_core::{config, Clock, Config, ErpTime, FixedClock, SystemClock, VisitDetails};
use rollcall_sync::{JsonVisitorStore, VisitorStore};
use rollcall_tracking::hydrate::parse_erp_time;

/// Loaded configuration plus the home it came from.
pub struct Env {
    pub home: PathBuf,
    pub config: Config,
    pub tz: Tz,
}

pub fn load_env() -> Result<Env> {
    let home: PathBuf = dirs::home_dir().context("could not determine home directory")?;
    let config = config::load_at(&home).context("failed to load ~/.rollcall/config.yaml")?;
    let tz = config.timezone()?;
    debug!(
        home = %home.display(),
        %tz,
        main_period = %config.first_registration_period_name,
        "environment loaded"
    );
    Ok(Env { home, config, tz })
}

/// `--at` pins the clock; without it the system clock runs in the ERP zone.
pub fn clock(at: Option<&str>, tz: Tz) -> Result<Box<dyn Clock>> {
    match at {
        Some(raw) => {
            let at: ErpTime =
                parse_erp_time(raw, tz).with_context(|| format!("invalid --at value '{raw}'"))?;
            Ok(Box::new(FixedClock::new(at)))
        }
        None => Ok(Box::new(SystemClock::new(tz))),
    }
}

pub fn visitor_by_key(env: &Env, key: &str) -> Result<VisitDetails> {
    let store = JsonVisitorStore::open_at(&env.home).context("failed to open visitor store")?;
    store
        .find_by_key(key)
        .context("visitor lookup failed")?
        .with_context(|| format!("no visitor holds key '{key}'; assign one with `rollcall key`"))
}
