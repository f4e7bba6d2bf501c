//! `rollcall sync`: pull ERP students into the local visitor store.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;

use rollcall_erp::JsonExportErp;
use rollcall_sync::{JsonVisitorStore, StudentSync};

use super::load_env;

/// Arguments for `rollcall sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Directory holding the ERP exports.
    #[arg(long)]
    pub erp: PathBuf,

    /// Students requested per page (defaults to the configured size).
    #[arg(long)]
    pub page_size: Option<i32>,
}

impl SyncArgs {
    pub fn run(self) -> Result<()> {
        let env = load_env()?;
        let erp = JsonExportErp::new(&self.erp);
        let mut store =
            JsonVisitorStore::open_at(&env.home).context("failed to open visitor store")?;

        let page_size = self.page_size.unwrap_or(env.config.students_page_size);
        let report = StudentSync::new(&erp, &mut store)
            .with_page_size(page_size)
            .run(Utc::now())
            .context("student sync failed")?;

        if report.outcomes.is_empty() {
            println!("✓ no students in export — nothing to do");
            return Ok(());
        }
        println!(
            "✓ students synced ({} inserted, {} updated, {} unchanged)",
            report.inserted(),
            report.updated(),
            report.unchanged()
        );
        Ok(())
    }
}
