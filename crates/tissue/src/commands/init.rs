//! `tissue init` -- create a store.

use anyhow::Result;

use tissue_config::STORE_DIR_NAME;
use tissue_store::Store;

use crate::cli::InitArgs;
use crate::context::RuntimeContext;
use crate::output::output_json;

pub fn run(ctx: &RuntimeContext, args: &InitArgs) -> Result<()> {
    // --store points at the store directory itself; the positional path is
    // the project directory the store goes under.
    let store_dir = match ctx.store_override {
        Some(ref dir) => dir.clone(),
        None => {
            let base = match args.path {
                Some(ref p) => p.clone(),
                None => std::env::current_dir()?,
            };
            base.join(STORE_DIR_NAME)
        }
    };

    let store = Store::init(&store_dir, args.prefix.as_deref())?;

    if ctx.json {
        output_json(&serde_json::json!({
            "dir": store.dir(),
            "prefix": store.prefix(),
        }));
    } else if ctx.quiet {
        println!("{}", store.dir().display());
    } else {
        println!("Initialized tissue store at {}", store.dir().display());
        println!("  Prefix: {}", store.prefix());
    }
    Ok(())
}
