//! `tissue update` -- partial field updates with tag merge.

use anyhow::Result;

use tissue_core::enums::Status;
use tissue_store::IssueUpdate;

use crate::cli::UpdateArgs;
use crate::context::RuntimeContext;
use crate::output::output_json;

pub fn run(ctx: &RuntimeContext, args: &UpdateArgs) -> Result<()> {
    let mut store = ctx.open_store()?;

    let id = store.resolve_id(&args.id)?;
    let issue = store.update_issue(
        &id,
        &IssueUpdate {
            title: args.title.clone(),
            body: args.body.clone(),
            status: args.status.as_deref().map(Status::from),
            priority: args.priority,
            add_tags: args.tags.clone(),
            remove_tags: args.untags.clone(),
        },
    )?;

    if ctx.json {
        output_json(&issue);
    } else if !ctx.quiet {
        println!("Updated {}", issue.id);
    }
    Ok(())
}
