//! `tissue show` -- issue detail with comments and dependencies.

use anyhow::Result;
use serde::Serialize;

use tissue_core::comment::Comment;
use tissue_core::dependency::Dep;
use tissue_core::issue::Issue;

use crate::cli::ShowArgs;
use crate::context::RuntimeContext;
use crate::output::{format_ms, output_json};

/// Composite payload for `show --json`.
#[derive(Serialize)]
struct ShowView {
    #[serde(flatten)]
    issue: Issue,
    comments: Vec<Comment>,
    deps: Vec<Dep>,
}

pub fn run(ctx: &RuntimeContext, args: &ShowArgs) -> Result<()> {
    let store = ctx.open_store()?;

    let id = store.resolve_id(&args.id)?;
    let issue = store.get_issue(&id)?;
    let comments = store.get_comments(&id)?;
    let deps = store.get_deps(&id)?;

    if ctx.json {
        output_json(&ShowView {
            issue,
            comments,
            deps,
        });
        return Ok(());
    }

    println!("{} [P{}] {}", issue.id, issue.priority, issue.title);
    println!("Status: {}", issue.status);
    println!("Created: {}", format_ms(issue.created_at));
    println!("Updated: {}", format_ms(issue.updated_at));
    if !issue.tags.is_empty() {
        println!("Tags: {}", issue.tags.join(", "));
    }
    if !issue.body.is_empty() {
        println!();
        println!("{}", issue.body);
    }

    if !deps.is_empty() {
        println!();
        println!("DEPENDENCIES");
        for dep in &deps {
            if dep.src_id == issue.id {
                println!("  {} -> {} ({})", dep.src_id, dep.dst_id, dep.kind);
            } else {
                println!("  {} <- {} ({})", dep.dst_id, dep.src_id, dep.kind);
            }
        }
    }

    if !comments.is_empty() {
        println!();
        println!("COMMENTS");
        for comment in &comments {
            println!("  [{}]", format_ms(comment.created_at));
            println!("  {}", comment.body);
        }
    }

    Ok(())
}
