//! `tissue search` -- ranked full-text search.

use anyhow::Result;

use tissue_store::ListFilter;

use crate::cli::SearchArgs;
use crate::context::RuntimeContext;
use crate::output::{output_json, print_issue_table};

pub fn run(ctx: &RuntimeContext, args: &SearchArgs) -> Result<()> {
    let store = ctx.open_store()?;

    let issues = store.list_issues(&ListFilter {
        search: Some(args.query.clone()),
        limit: args.limit,
        ..ListFilter::default()
    })?;

    if ctx.json {
        output_json(&issues);
    } else if issues.is_empty() {
        println!("No matches.");
    } else {
        print_issue_table(&issues);
    }
    Ok(())
}
