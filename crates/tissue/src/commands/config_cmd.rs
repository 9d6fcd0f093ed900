//! `tissue config` -- store configuration.

use anyhow::Result;

use crate::cli::{ConfigArgs, ConfigCommands};
use crate::context::RuntimeContext;
use crate::output::output_json;

pub fn run(ctx: &RuntimeContext, args: &ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommands::Prefix { ref value } => run_prefix(ctx, value.as_deref()),
    }
}

fn run_prefix(ctx: &RuntimeContext, value: Option<&str>) -> Result<()> {
    let mut store = ctx.open_store()?;

    let prefix = match value {
        Some(raw) => store.set_prefix(raw)?,
        None => store.prefix().to_owned(),
    };

    if ctx.json {
        output_json(&serde_json::json!({ "prefix": prefix }));
    } else {
        println!("{prefix}");
    }
    Ok(())
}
