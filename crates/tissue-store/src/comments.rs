//! Comment row helpers.

use rusqlite::{Connection, params};

use tissue_core::comment::Comment;

use crate::error::Result;

/// Inserts a comment, ignoring duplicates on id.
///
/// Returns `true` when a row was actually added.
pub(crate) fn insert_comment(conn: &Connection, comment: &Comment) -> Result<bool> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO comments (id, issue_id, body, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            comment.id,
            comment.issue_id,
            comment.body,
            comment.created_at
        ],
    )?;
    Ok(changed > 0)
}

/// Returns all comments for an issue in chronological order.
pub(crate) fn get_comments(conn: &Connection, issue_id: &str) -> Result<Vec<Comment>> {
    let mut stmt = conn.prepare(
        "SELECT id, issue_id, body, created_at
         FROM comments WHERE issue_id = ?1
         ORDER BY created_at ASC, id ASC",
    )?;
    let rows = stmt.query_map(params![issue_id], |row| {
        Ok(Comment {
            id: row.get(0)?,
            issue_id: row.get(1)?,
            body: row.get(2)?,
            created_at: row.get(3)?,
        })
    })?;
    let mut comments = Vec::new();
    for row in rows {
        comments.push(row?);
    }
    Ok(comments)
}

/// Returns just the comment bodies, chronological, for FTS rewrites.
pub(crate) fn comment_bodies(conn: &Connection, issue_id: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT body FROM comments WHERE issue_id = ?1
         ORDER BY created_at ASC, id ASC",
    )?;
    let rows = stmt.query_map(params![issue_id], |row| row.get(0))?;
    let mut bodies = Vec::new();
    for row in rows {
        bodies.push(row?);
    }
    Ok(bodies)
}

/// Returns `true` if a comment with the given id exists.
pub(crate) fn comment_exists(conn: &Connection, id: &str) -> Result<bool> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM comments WHERE id = ?1)",
        params![id],
        |row| row.get(0),
    )?;
    Ok(exists)
}
