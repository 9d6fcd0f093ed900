//! Issue row helpers shared by the write path and the importer.

use rusqlite::{Connection, OptionalExtension, Row, params};

use tissue_core::enums::Status;
use tissue_core::issue::Issue;

use crate::error::Result;

/// All issue columns in a deterministic order for SELECT queries.
pub(crate) const ISSUE_COLUMNS: &str =
    "id, rev, title, body, status, priority, created_at, updated_at";

/// Same as [`ISSUE_COLUMNS`] but prefixed with the `i` alias for JOIN
/// queries, to avoid ambiguous column names.
pub(crate) const ISSUE_COLUMNS_PREFIXED: &str =
    "i.id, i.rev, i.title, i.body, i.status, i.priority, i.created_at, i.updated_at";

/// Deserializes a row into an [`Issue`]. Tags are loaded separately.
///
/// The column order MUST match [`ISSUE_COLUMNS`].
pub(crate) fn scan_issue(row: &Row<'_>) -> rusqlite::Result<Issue> {
    Ok(Issue {
        id: row.get(0)?,
        rev: row.get(1)?,
        title: row.get(2)?,
        body: row.get(3)?,
        status: Status::from(row.get::<_, String>(4)?),
        priority: row.get(5)?,
        tags: Vec::new(),
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

/// Inserts or fully replaces an issue row.
///
/// Uses `ON CONFLICT DO UPDATE` rather than `INSERT OR REPLACE`: a REPLACE
/// deletes the old row first, which would cascade away its comments and tags.
pub(crate) fn upsert_issue(conn: &Connection, issue: &Issue) -> Result<()> {
    conn.execute(
        "INSERT INTO issues (id, rev, title, body, status, priority, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT(id) DO UPDATE SET
             rev = excluded.rev,
             title = excluded.title,
             body = excluded.body,
             status = excluded.status,
             priority = excluded.priority,
             created_at = excluded.created_at,
             updated_at = excluded.updated_at",
        params![
            issue.id,
            issue.rev,
            issue.title,
            issue.body,
            issue.status.as_str(),
            issue.priority,
            issue.created_at,
            issue.updated_at,
        ],
    )?;
    Ok(())
}

/// Fetches an issue row by exact id, without tags.
pub(crate) fn get_issue_row(conn: &Connection, id: &str) -> Result<Option<Issue>> {
    let issue = conn
        .query_row(
            &format!("SELECT {ISSUE_COLUMNS} FROM issues WHERE id = ?1"),
            params![id],
            scan_issue,
        )
        .optional()?;
    Ok(issue)
}

/// Returns `true` if an issue with the exact id exists.
pub(crate) fn issue_exists(conn: &Connection, id: &str) -> Result<bool> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM issues WHERE id = ?1)",
        params![id],
        |row| row.get(0),
    )?;
    Ok(exists)
}

/// Returns the stored `(rev, updated_at)` pair for conflict resolution.
pub(crate) fn get_issue_rev(conn: &Connection, id: &str) -> Result<Option<(String, i64)>> {
    let pair = conn
        .query_row(
            "SELECT rev, updated_at FROM issues WHERE id = ?1",
            params![id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;
    Ok(pair)
}

/// Loads an issue's tags, sorted ascending.
pub(crate) fn load_tags(conn: &Connection, issue_id: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT t.name FROM tags t
         JOIN issue_tags it ON it.tag_id = t.id
         WHERE it.issue_id = ?1
         ORDER BY t.name",
    )?;
    let rows = stmt.query_map(params![issue_id], |row| row.get(0))?;
    let mut tags = Vec::new();
    for row in rows {
        tags.push(row?);
    }
    Ok(tags)
}

/// Replaces an issue's tag set through the issue-tag join table.
pub(crate) fn replace_tags(conn: &Connection, issue_id: &str, tags: &[String]) -> Result<()> {
    conn.execute(
        "DELETE FROM issue_tags WHERE issue_id = ?1",
        params![issue_id],
    )?;
    for tag in tags {
        conn.execute("INSERT OR IGNORE INTO tags (name) VALUES (?1)", params![tag])?;
        conn.execute(
            "INSERT OR IGNORE INTO issue_tags (issue_id, tag_id)
             SELECT ?1, id FROM tags WHERE name = ?2",
            params![issue_id, tag],
        )?;
    }
    Ok(())
}

/// Rewrites the full-text-search row for an issue from its current title,
/// body, and comments (chronological, newline-separated).
pub(crate) fn refresh_fts(conn: &Connection, issue_id: &str) -> Result<()> {
    conn.execute(
        "DELETE FROM issues_fts WHERE issue_id = ?1",
        params![issue_id],
    )?;

    let Some(issue) = get_issue_row(conn, issue_id)? else {
        return Ok(());
    };
    let comments = crate::comments::comment_bodies(conn, issue_id)?.join("\n");

    conn.execute(
        "INSERT INTO issues_fts (title, body, comments, issue_id)
         VALUES (?1, ?2, ?3, ?4)",
        params![issue.title, issue.body, comments, issue_id],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema;
    use pretty_assertions::assert_eq;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON").unwrap();
        for stmt in schema::SCHEMA_STATEMENTS {
            conn.execute_batch(stmt).unwrap();
        }
        for stmt in schema::FTS_STATEMENTS {
            conn.execute_batch(stmt).unwrap();
        }
        conn
    }

    fn issue(id: &str) -> Issue {
        Issue {
            id: id.into(),
            rev: "01J8ZC2M7N8Q9R0S1T2V3W4X5Y".into(),
            title: "A title".into(),
            body: "A body".into(),
            status: Status::Open,
            priority: 2,
            tags: vec![],
            created_at: 1,
            updated_at: 1,
        }
    }

    #[test]
    fn upsert_then_get_roundtrip() {
        let conn = conn();
        let original = issue("t-aaaa0000");
        upsert_issue(&conn, &original).unwrap();

        let loaded = get_issue_row(&conn, "t-aaaa0000").unwrap().unwrap();
        assert_eq!(loaded, original);
        assert!(issue_exists(&conn, "t-aaaa0000").unwrap());
        assert!(!issue_exists(&conn, "t-bbbb0000").unwrap());
    }

    #[test]
    fn upsert_replaces_without_cascading_children() {
        let conn = conn();
        let mut row = issue("t-aaaa0000");
        upsert_issue(&conn, &row).unwrap();
        replace_tags(&conn, "t-aaaa0000", &["ci".into()]).unwrap();
        crate::comments::insert_comment(
            &conn,
            &tissue_core::comment::Comment {
                id: "01J8ZC2M7N8Q9R0S1T2V3W4X5Y".into(),
                issue_id: "t-aaaa0000".into(),
                body: "hello".into(),
                created_at: 2,
            },
        )
        .unwrap();

        row.title = "New title".into();
        upsert_issue(&conn, &row).unwrap();

        // Children must survive a full-row replacement.
        assert_eq!(load_tags(&conn, "t-aaaa0000").unwrap(), vec!["ci"]);
        assert_eq!(
            crate::comments::comment_bodies(&conn, "t-aaaa0000").unwrap(),
            vec!["hello"]
        );
    }

    #[test]
    fn replace_tags_is_a_full_swap() {
        let conn = conn();
        upsert_issue(&conn, &issue("t-aaaa0000")).unwrap();

        replace_tags(&conn, "t-aaaa0000", &["a".into(), "b".into()]).unwrap();
        assert_eq!(load_tags(&conn, "t-aaaa0000").unwrap(), vec!["a", "b"]);

        replace_tags(&conn, "t-aaaa0000", &["c".into()]).unwrap();
        assert_eq!(load_tags(&conn, "t-aaaa0000").unwrap(), vec!["c"]);

        replace_tags(&conn, "t-aaaa0000", &[]).unwrap();
        assert!(load_tags(&conn, "t-aaaa0000").unwrap().is_empty());
    }

    #[test]
    fn refresh_fts_indexes_title_body_comments() {
        let conn = conn();
        upsert_issue(&conn, &issue("t-aaaa0000")).unwrap();
        crate::comments::insert_comment(
            &conn,
            &tissue_core::comment::Comment {
                id: "01J8ZC2M7N8Q9R0S1T2V3W4X5Y".into(),
                issue_id: "t-aaaa0000".into(),
                body: "searchable remark".into(),
                created_at: 2,
            },
        )
        .unwrap();
        refresh_fts(&conn, "t-aaaa0000").unwrap();

        let hits: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM issues_fts WHERE issues_fts MATCH 'remark'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(hits, 1);

        // Rewriting replaces rather than accumulates.
        refresh_fts(&conn, "t-aaaa0000").unwrap();
        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM issues_fts", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }
}
