//! `rollcall periods`: a visitor's schedule for today.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use tabled::{settings::Style, Table, Tabled};

use rollcall_core::{Clock, CodeCatalog};
use rollcall_erp::JsonExportErp;
use rollcall_tracking::StudentTracker;

use super::{clock, load_env, visitor_by_key};

/// Arguments for `rollcall periods`.
#[derive(Args, Debug)]
pub struct PeriodsArgs {
    /// Access key of the visitor.
    pub key: String,

    /// Directory holding the ERP exports.
    #[arg(long)]
    pub erp: PathBuf,

    /// Time to locate within the schedule. Defaults to now.
    #[arg(long)]
    pub at: Option<String>,
}

#[derive(Tabled)]
struct PeriodRow {
    #[tabled(rename = "")]
    current: &'static str,
    id: i32,
    name: String,
    start: String,
    time: String,
    finish: String,
}

impl PeriodsArgs {
    pub fn run(self) -> Result<()> {
        let env = load_env()?;
        let details = visitor_by_key(&env, &self.key)?;
        let erp = JsonExportErp::new(&self.erp);
        let codes = CodeCatalog::new();
        let clock = clock(self.at.as_deref(), env.tz)?;
        let now = clock.now();

        let tracker = StudentTracker::new(&erp, &codes, clock.as_ref()).with_timezone(env.tz);
        let loaded = tracker.load_schedule(&details.visitor);
        let schedule = &loaded.schedule;

        if schedule.is_empty() {
            println!("No registration periods for '{}'.", details.visitor.display_name());
            return Ok(());
        }

        let current = schedule.period_by_time(now).map(|p| p.id);
        let rows: Vec<PeriodRow> = schedule
            .periods()
            .map(|p| PeriodRow {
                current: if Some(p.id) == current { "▶" } else { "" },
                id: p.id.0,
                name: p.name.clone(),
                start: p.start.format("%H:%M").to_string(),
                time: p.time.format("%H:%M").to_string(),
                finish: p.finish.format("%H:%M").to_string(),
            })
            .collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");

        if schedule.is_before_first_period(now) {
            println!(
                "{} is before the first period; check-ins count toward it.",
                now.format("%H:%M")
            );
        } else if schedule.is_after_last_period(now) {
            println!("{} is after the last period.", now.format("%H:%M"));
        } else if current.is_none() {
            println!("{} falls between periods.", now.format("%H:%M"));
        }
        for division in &loaded.skipped_divisions {
            println!("division {division} skipped (no periods)");
        }
        for period in &loaded.skipped_periods {
            println!("period {period} skipped (unreadable times)");
        }
        Ok(())
    }
}
