//! `tissue dep` -- add, remove, and list dependencies.

use anyhow::Result;

use tissue_core::enums::{DepKind, Status};

use crate::cli::{DepArgs, DepCommands, DepEdgeArgs, DepListArgs};
use crate::context::RuntimeContext;
use crate::output::output_json;

pub fn run(ctx: &RuntimeContext, args: &DepArgs) -> Result<()> {
    match args.command {
        DepCommands::Add(ref edge) => run_add(ctx, edge),
        DepCommands::Rm(ref edge) => run_rm(ctx, edge),
        DepCommands::List(ref list) => run_list(ctx, list),
    }
}

fn run_add(ctx: &RuntimeContext, edge: &DepEdgeArgs) -> Result<()> {
    let mut store = ctx.open_store()?;

    let src = store.resolve_id(&edge.src)?;
    let dst = store.resolve_id(&edge.dst)?;
    let dep = store.add_dep(&src, &dst, DepKind::from(edge.kind.as_str()))?;

    if ctx.json {
        output_json(&dep);
    } else if !ctx.quiet {
        println!("{} {} {}", dep.src_id, dep.kind, dep.dst_id);
    }
    Ok(())
}

fn run_rm(ctx: &RuntimeContext, edge: &DepEdgeArgs) -> Result<()> {
    let mut store = ctx.open_store()?;

    let src = store.resolve_id(&edge.src)?;
    let dst = store.resolve_id(&edge.dst)?;
    store.remove_dep(&src, &dst, DepKind::from(edge.kind.as_str()))?;

    if !ctx.quiet && !ctx.json {
        println!("Removed {} {} {}", src, edge.kind, dst);
    }
    Ok(())
}

fn run_list(ctx: &RuntimeContext, list: &DepListArgs) -> Result<()> {
    let store = ctx.open_store()?;

    let id = store.resolve_id(&list.id)?;
    let deps = store.get_deps(&id)?;

    if ctx.json {
        output_json(&deps);
        return Ok(());
    }
    if deps.is_empty() {
        println!("No dependencies on {}.", id);
        return Ok(());
    }

    // Group by how the edge reads from this issue's point of view.
    for dep in &deps {
        let line = match dep.kind {
            DepKind::Blocks if dep.src_id == id => format!("blocks     {}", dep.dst_id),
            DepKind::Blocks => format!("blocked by {}", dep.src_id),
            DepKind::Parent if dep.src_id == id => format!("parent of  {}", dep.dst_id),
            DepKind::Parent => format!("child of   {}", dep.src_id),
            _ => {
                let other = if dep.src_id == id {
                    &dep.dst_id
                } else {
                    &dep.src_id
                };
                format!("relates to {other}")
            }
        };
        let other_id = if dep.src_id == id {
            &dep.dst_id
        } else {
            &dep.src_id
        };
        let status = store
            .get_issue(other_id)
            .map(|i| i.status)
            .unwrap_or(Status::Custom("?".into()));
        println!("{line} ({status})");
    }
    Ok(())
}
