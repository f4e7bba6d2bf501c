//! `rollcall key`: bind an access key to a visitor.

use anyhow::{Context, Result};
use clap::Args;

use rollcall_core::VisitorId;
use rollcall_sync::{JsonVisitorStore, VisitorStore};

use super::load_env;

/// Arguments for `rollcall key`.
#[derive(Args, Debug)]
pub struct KeyArgs {
    /// Local visitor ID (as assigned by `rollcall sync`).
    pub visitor: i32,

    /// Card or badge key to assign.
    pub key: String,
}

impl KeyArgs {
    pub fn run(self) -> Result<()> {
        let env = load_env()?;
        let mut store =
            JsonVisitorStore::open_at(&env.home).context("failed to open visitor store")?;
        let id = VisitorId(self.visitor);
        store
            .add_key_to_visitor(id, &self.key)
            .with_context(|| format!("failed to assign key '{}'", self.key))?;

        let name = store
            .find_by_id(id)?
            .map(|v| v.display_name())
            .unwrap_or_default();
        println!("✓ key '{}' assigned to visitor {id} ({name})", self.key);
        Ok(())
    }
}
