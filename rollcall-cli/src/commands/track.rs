//! `rollcall track`: one check-in, written through to the ERP.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;
use colored::Colorize;
use serde::Serialize;

use rollcall_core::{AttendanceMark, CodeCatalog};
use rollcall_erp::{JsonExportErp, RegistrationStatusUpdate};
use rollcall_sync::refresh_codes;
use rollcall_tracking::{StudentTracker, TrackingReport};

use super::{clock, load_env, visitor_by_key};

/// Arguments for `rollcall track`.
#[derive(Args, Debug)]
pub struct TrackArgs {
    /// Access key presented at check-in.
    pub key: String,

    /// Directory holding the ERP exports.
    #[arg(long)]
    pub erp: PathBuf,

    /// Check-in time (RFC 3339, or a local time in the ERP timezone). Defaults to now.
    #[arg(long)]
    pub at: Option<String>,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct WriteJson<'a> {
    period_id: i32,
    period: &'a str,
    update: &'a RegistrationStatusUpdate,
}

#[derive(Serialize)]
struct TrackJson<'a> {
    visitor: String,
    tracked_at: String,
    writes: Vec<WriteJson<'a>>,
}

impl TrackArgs {
    pub fn run(self) -> Result<()> {
        let env = load_env()?;
        let details = visitor_by_key(&env, &self.key)?;
        let erp = JsonExportErp::new(&self.erp);

        let codes = CodeCatalog::new();
        refresh_codes(&erp, &codes, Utc::now()).context("failed to load registration codes")?;

        let clock = clock(self.at.as_deref(), env.tz)?;
        let mut tracker = StudentTracker::new(&erp, &codes, clock.as_ref())
            .with_policy(env.config.attendance_policy())
            .with_timezone(env.tz);
        let report = tracker
            .track(&details.visitor)
            .with_context(|| format!("tracking failed for '{}'", details.visitor.display_name()))?;

        let name = details.visitor.display_name();
        if self.json {
            print_json(&name, &report)
        } else {
            print_report(&name, &report);
            Ok(())
        }
    }
}

fn print_json(name: &str, report: &TrackingReport) -> Result<()> {
    let payload = TrackJson {
        visitor: name.to_string(),
        tracked_at: report.tracked_at.to_rfc3339(),
        writes: report
            .writes
            .iter()
            .map(|w| WriteJson {
                period_id: w.period_id.0,
                period: &w.period_name,
                update: &w.update,
            })
            .collect(),
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).context("failed to serialize tracking JSON")?
    );
    Ok(())
}

fn print_report(name: &str, report: &TrackingReport) {
    for division in &report.skipped_divisions {
        println!("{} division {division} skipped (no periods)", "!".yellow());
    }
    for period in &report.skipped_periods {
        println!("{} period {period} skipped (unreadable times)", "!".yellow());
    }
    if report.is_noop() {
        println!("✓ '{name}' already registered — nothing to do");
        return;
    }
    println!(
        "✓ '{name}' tracked at {} ({} registration(s) written)",
        report.tracked_at.format("%H:%M:%S"),
        report.writes.len()
    );
    for write in &report.writes {
        println!("  {:<12} {}", write.period_name, describe(write.mark));
    }
}

fn describe(mark: AttendanceMark) -> String {
    match mark {
        AttendanceMark::Undecided => "undecided".bright_black().to_string(),
        AttendanceMark::Present { .. } => "present".green().to_string(),
        AttendanceMark::Late { minutes_late, .. } => {
            format!("late {minutes_late} min").yellow().to_string()
        }
        AttendanceMark::Absent { .. } => "absent".red().to_string(),
    }
}
