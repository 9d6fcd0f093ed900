//! `tissue ready` -- open issues with no transitive active blocker.

use anyhow::Result;

use crate::cli::ReadyArgs;
use crate::context::RuntimeContext;
use crate::output::{output_json, print_issue_table};

pub fn run(ctx: &RuntimeContext, args: &ReadyArgs) -> Result<()> {
    let store = ctx.open_store()?;
    let issues = store.ready_issues(args.limit)?;

    if ctx.json {
        output_json(&issues);
    } else if issues.is_empty() {
        println!("Nothing is ready.");
    } else {
        print_issue_table(&issues);
    }
    Ok(())
}
