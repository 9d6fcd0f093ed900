//! `tissue comment` / `tissue comments` -- add and list comments.

use anyhow::Result;

use crate::cli::{CommentArgs, CommentsArgs};
use crate::context::RuntimeContext;
use crate::output::{format_ms, output_json};

pub fn run_add(ctx: &RuntimeContext, args: &CommentArgs) -> Result<()> {
    let mut store = ctx.open_store()?;

    let id = store.resolve_id(&args.id)?;
    let comment = store.add_comment(&id, &args.body)?;

    if ctx.json {
        output_json(&comment);
    } else if !ctx.quiet {
        println!("Commented on {}", id);
    }
    Ok(())
}

pub fn run_list(ctx: &RuntimeContext, args: &CommentsArgs) -> Result<()> {
    let store = ctx.open_store()?;

    let id = store.resolve_id(&args.id)?;
    let comments = store.get_comments(&id)?;

    if ctx.json {
        output_json(&comments);
    } else if comments.is_empty() {
        println!("No comments on {}.", id);
    } else {
        for comment in &comments {
            println!("[{}]", format_ms(comment.created_at));
            println!("{}", comment.body);
            println!();
        }
    }
    Ok(())
}
