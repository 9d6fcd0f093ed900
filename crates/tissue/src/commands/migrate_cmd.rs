//! `tissue migrate` -- merge another store's log.

use std::path::PathBuf;

use anyhow::Result;

use tissue_config::{LOG_FILE_NAME, STORE_DIR_NAME};

use crate::cli::MigrateArgs;
use crate::context::RuntimeContext;
use crate::output::output_json;

pub fn run(ctx: &RuntimeContext, args: &MigrateArgs) -> Result<()> {
    let mut store = ctx.open_store()?;

    // Accept either the store directory or the project directory above it.
    let source: PathBuf = if args.path.join(LOG_FILE_NAME).is_file() {
        args.path.clone()
    } else {
        args.path.join(STORE_DIR_NAME)
    };

    let report = store.migrate_from(&source, !args.force)?;

    if ctx.json {
        output_json(&report);
        return Ok(());
    }

    let verb = if report.applied { "Migrated" } else { "Would migrate" };
    println!(
        "{verb} {} issue(s), {} dep(s), {} comment(s) from {}",
        report.issues,
        report.deps,
        report.comments,
        source.display()
    );
    if !report.applied {
        println!("Re-run with --force to apply.");
    }
    Ok(())
}
