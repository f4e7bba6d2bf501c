//! Rollcall: school attendance tracking against an ERP.
//!
//! # Usage
//!
//! ```text
//! rollcall track <key> --erp <dir> [--at <time>] [--json]
//! rollcall periods <key> --erp <dir> [--at <time>]
//! rollcall sync --erp <dir> [--page-size <n>]
//! rollcall codes --erp <dir> [--json]
//! rollcall key <visitor-id> <key>
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    codes::CodesArgs, key::KeyArgs, periods::PeriodsArgs, sync::SyncArgs, track::TrackArgs,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "rollcall",
    version,
    about = "Register school attendance from check-ins and keep the ERP in step",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Record a check-in and write the resulting registrations to the ERP.
    Track(TrackArgs),

    /// Show a visitor's registration periods for today.
    Periods(PeriodsArgs),

    /// Pull every ERP student into the local visitor store.
    Sync(SyncArgs),

    /// Fetch and list the ERP's present and absence codes.
    Codes(CodesArgs),

    /// Assign an access key to a stored visitor.
    Key(KeyArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Commands::Track(args) => args.run(),
        Commands::Periods(args) => args.run(),
        Commands::Sync(args) => args.run(),
        Commands::Codes(args) => args.run(),
        Commands::Key(args) => args.run(),
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
