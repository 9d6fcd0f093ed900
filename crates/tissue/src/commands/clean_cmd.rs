//! `tissue clean` -- drop terminal issues from the log.

use anyhow::Result;

use tissue_store::CleanOptions;

use crate::cli::CleanArgs;
use crate::context::RuntimeContext;
use crate::output::output_json;

pub fn run(ctx: &RuntimeContext, args: &CleanArgs) -> Result<()> {
    let mut store = ctx.open_store()?;

    let report = store.clean(&CleanOptions {
        older_than_days: args.older_than,
        force: args.force,
    })?;

    if ctx.json {
        output_json(&report);
        return Ok(());
    }

    if report.candidates.is_empty() {
        println!("Nothing to clean.");
        return Ok(());
    }

    if report.applied {
        println!(
            "Removed {} issue(s) from the log ({} issue, {} comment, {} dep records).",
            report.candidates.len(),
            report.removed_issue_records,
            report.removed_comment_records,
            report.removed_dep_records,
        );
    } else {
        println!("Would remove {} issue(s):", report.candidates.len());
        for issue in &report.candidates {
            println!("  {} [{}] {}", issue.id, issue.status, issue.title);
        }
        println!("Re-run with --force to rewrite the log.");
    }
    Ok(())
}
