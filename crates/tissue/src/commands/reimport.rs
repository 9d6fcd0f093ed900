//! `tissue reimport` -- rebuild the cache from the log.

use anyhow::Result;

use tissue_store::ListFilter;

use crate::context::RuntimeContext;
use crate::output::output_json;

pub fn run(ctx: &RuntimeContext) -> Result<()> {
    let mut store = ctx.open_store()?;
    store.force_reimport()?;

    let count = store.list_issues(&ListFilter::default())?.len();
    if ctx.json {
        output_json(&serde_json::json!({ "issues": count }));
    } else if !ctx.quiet {
        println!("Rebuilt cache from log: {count} issue(s).");
    }
    Ok(())
}
