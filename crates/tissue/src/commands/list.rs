//! `tissue list` -- list issues.

use anyhow::Result;

use tissue_core::enums::Status;
use tissue_store::ListFilter;

use crate::cli::ListArgs;
use crate::context::RuntimeContext;
use crate::output::{output_json, print_issue_table};

pub fn run(ctx: &RuntimeContext, args: &ListArgs) -> Result<()> {
    let store = ctx.open_store()?;

    // Unknown status strings pass through: the log may carry values from a
    // newer version, and they are filterable like any other.
    let filter = ListFilter {
        status: args.status.as_deref().map(Status::from),
        tag: args.tag.clone(),
        search: args.search.clone(),
        limit: args.limit,
    };
    let issues = store.list_issues(&filter)?;

    if ctx.json {
        output_json(&issues);
    } else {
        print_issue_table(&issues);
    }
    Ok(())
}
