//! Runtime context for command execution.

use std::env;
use std::path::PathBuf;

use anyhow::{Context as _, Result};

use tissue_store::Store;

use crate::cli::GlobalArgs;

/// Runtime context passed to every command handler.
///
/// Constructed once in `main` after CLI parsing, before command dispatch.
#[derive(Debug)]
pub struct RuntimeContext {
    /// Explicit store directory override (`--store`).
    pub store_override: Option<PathBuf>,

    /// Whether to produce JSON output.
    pub json: bool,

    /// Verbose output.
    pub verbose: bool,

    /// Quiet mode: suppress non-essential output.
    pub quiet: bool,
}

impl RuntimeContext {
    /// Builds a context from parsed global arguments.
    pub fn from_global_args(global: &GlobalArgs) -> Self {
        Self {
            store_override: global.store.clone(),
            json: global.json,
            verbose: global.verbose,
            quiet: global.quiet,
        }
    }

    /// Resolves the store directory: `--store`, then an ancestor `.tissue`,
    /// then `$TISSUE_DIR`.
    pub fn resolve_store_dir(&self) -> Option<PathBuf> {
        let cwd = env::current_dir().ok()?;
        tissue_config::resolve_store_dir(self.store_override.as_deref(), &cwd)
    }

    /// Opens the resolved store, reconciling the cache with the log.
    pub fn open_store(&self) -> Result<Store> {
        let dir = self
            .resolve_store_dir()
            .context("no tissue store found. Run 'tissue init' to create one.")?;
        tracing::debug!(dir = %dir.display(), "resolved store directory");
        Ok(Store::open(dir)?)
    }
}
