//! `tissue status` -- shorthand for updating the status field.

use anyhow::Result;

use tissue_core::enums::Status;
use tissue_store::IssueUpdate;

use crate::cli::StatusCmdArgs;
use crate::context::RuntimeContext;
use crate::output::output_json;

pub fn run(ctx: &RuntimeContext, args: &StatusCmdArgs) -> Result<()> {
    let mut store = ctx.open_store()?;

    let id = store.resolve_id(&args.id)?;
    let issue = store.update_issue(
        &id,
        &IssueUpdate {
            status: Some(Status::from(args.status.as_str())),
            ..IssueUpdate::default()
        },
    )?;

    if ctx.json {
        output_json(&issue);
    } else if !ctx.quiet {
        println!("{} -> {}", issue.id, issue.status);
    }
    Ok(())
}
