//! `tissue create` -- create a new issue.

use anyhow::Result;

use tissue_store::NewIssue;

use crate::cli::CreateArgs;
use crate::context::RuntimeContext;
use crate::output::output_json;

pub fn run(ctx: &RuntimeContext, args: &CreateArgs) -> Result<()> {
    let mut store = ctx.open_store()?;

    let issue = store.create_issue(&NewIssue {
        title: args.title.clone(),
        body: args.body.clone(),
        priority: args.priority,
        tags: args.tags.clone(),
    })?;

    if ctx.json {
        output_json(&issue);
    } else if ctx.quiet {
        println!("{}", issue.id);
    } else {
        println!("Created issue {}", issue.id);
        println!("  Title: {}", issue.title);
        println!("  Priority: P{}", issue.priority);
        if !issue.tags.is_empty() {
            println!("  Tags: {}", issue.tags.join(", "));
        }
    }
    Ok(())
}
