//! `rollcall codes`: the ERP's registration codes.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use rollcall_core::{CodeCatalog, RegistrationCodeDictionary};
use rollcall_erp::JsonExportErp;
use rollcall_sync::refresh_codes;

use super::load_env;

/// Arguments for `rollcall codes`.
#[derive(Args, Debug)]
pub struct CodesArgs {
    /// Directory holding the ERP exports.
    #[arg(long)]
    pub erp: PathBuf,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Tabled, Serialize)]
struct CodeRow {
    id: i32,
    code: String,
    name: String,
    #[tabled(rename = "default for")]
    default_for: String,
}

#[derive(Serialize)]
struct CodesJson {
    present: Vec<CodeRow>,
    absence: Vec<CodeRow>,
}

impl CodesArgs {
    pub fn run(self) -> Result<()> {
        let env = load_env()?;
        let erp = JsonExportErp::new(&self.erp);
        let catalog = CodeCatalog::new();
        refresh_codes(&erp, &catalog, Utc::now()).context("failed to load registration codes")?;

        let policy = env.config.attendance_policy();
        let present_roles = [
            (policy.present_code.as_str(), "present"),
            (policy.late_code.as_str(), "late"),
        ];
        let absence_roles = [(policy.lesson_absence_code.as_str(), "lesson absence")];

        let present = rows(catalog.present().as_deref(), &present_roles);
        let absence = rows(catalog.absence().as_deref(), &absence_roles);

        if self.json {
            let payload = CodesJson { present, absence };
            println!(
                "{}",
                serde_json::to_string_pretty(&payload).context("failed to serialize codes JSON")?
            );
            return Ok(());
        }

        print_section("Present codes", present);
        print_section("Absence codes", absence);
        Ok(())
    }
}

fn rows(dictionary: Option<&RegistrationCodeDictionary>, roles: &[(&str, &str)]) -> Vec<CodeRow> {
    let Some(dictionary) = dictionary else {
        return Vec::new();
    };
    dictionary
        .codes()
        .into_iter()
        .map(|c| CodeRow {
            id: c.id.0,
            code: c.code.clone(),
            name: c.name.clone(),
            default_for: roles
                .iter()
                .filter(|(code, _)| *code == c.code)
                .map(|(_, role)| *role)
                .collect::<Vec<_>>()
                .join(", "),
        })
        .collect()
}

fn print_section(title: &str, rows: Vec<CodeRow>) {
    println!("{}", title.bold());
    if rows.is_empty() {
        println!("  (none)");
        return;
    }
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
}
