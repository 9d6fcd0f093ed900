//! The log importer: reconciles the cache with the log.
//!
//! Runs at the start of every command (store open). Compares the log's
//! `(inode, size, mtime)` identity with the saved watermark and either does
//! nothing, applies the tail incrementally, or rebuilds the cache from
//! scratch. Arbitrary external mutations of the log (git pulls, merges,
//! manual edits) funnel through here.

use tracing::{debug, warn};

use tissue_core::comment::Comment;
use tissue_core::dependency::Dep;
use tissue_core::issue::Issue;
use tissue_core::record::Record;

use rusqlite::Connection;

use crate::error::{Result, StoreError};
use crate::log::LogStat;
use crate::meta::{self, Watermark};
use crate::store::{Store, TxGuard};
use crate::{comments, deps, issues, log, schema};

impl Store {
    /// Brings the cache up to date with the log.
    ///
    /// Decision table: inode changed, log shrunk below the stored offset, or
    /// mtime moved backwards -> full reimport; size equal to the stored
    /// offset -> no-op; otherwise incremental from the stored offset.
    pub(crate) fn sync_with_log(&mut self) -> Result<()> {
        self.ensure_log()?;
        let stat = log::stat_log(&self.log_path)?;

        match meta::load_watermark(&self.conn)? {
            None => {
                debug!("no watermark; rebuilding cache from log");
                self.truncate_cache(stat)?;
                self.incremental_import(0)
            }
            Some(saved) if saved.inode != stat.inode => {
                debug!(
                    saved = saved.inode,
                    current = stat.inode,
                    "log inode changed; full reimport"
                );
                self.truncate_cache(stat)?;
                self.incremental_import(0)
            }
            Some(saved) if saved.offset > stat.size => {
                debug!(
                    offset = saved.offset,
                    size = stat.size,
                    "log truncated below watermark; full reimport"
                );
                self.truncate_cache(stat)?;
                self.incremental_import(0)
            }
            Some(saved) if saved.mtime_ms > stat.mtime_ms => {
                debug!("log mtime moved backwards; full reimport");
                self.truncate_cache(stat)?;
                self.incremental_import(0)
            }
            Some(saved) if saved.offset == stat.size => Ok(()),
            Some(saved) => self.incremental_import(saved.offset),
        }
    }

    /// Discards the cache contents and rebuilds them from the whole log.
    pub fn force_reimport(&mut self) -> Result<()> {
        self.ensure_log()?;
        let stat = log::stat_log(&self.log_path)?;
        self.truncate_cache(stat)?;
        self.incremental_import(0)
    }

    /// Empties all content tables and pins the watermark at offset zero, so
    /// an interrupted rebuild resumes instead of standing on a stale offset.
    fn truncate_cache(&mut self, stat: LogStat) -> Result<()> {
        let tx = TxGuard::begin_immediate(&self.conn)?;
        for table in schema::CONTENT_TABLES {
            tx.conn().execute(&format!("DELETE FROM {table}"), [])?;
        }
        meta::store_watermark(
            tx.conn(),
            &Watermark {
                offset: 0,
                inode: stat.inode,
                mtime_ms: 0,
            },
        )?;
        tx.commit()
    }

    /// Applies log records from `from` to the end of the file.
    ///
    /// Issue and dep records apply eagerly; comment records are buffered and
    /// applied after the batch, so a comment line that precedes its issue
    /// line in a merged log still lands.
    fn incremental_import(&mut self, from: u64) -> Result<()> {
        let (data, stat) = log::read_tail(&self.lock, &self.log_path, from)?;

        let tx = TxGuard::begin_immediate(&self.conn)?;
        let mut pending_comments: Vec<Comment> = Vec::new();
        let mut pos = 0usize;

        while pos < data.len() {
            let end = data[pos..]
                .iter()
                .position(|&b| b == b'\n')
                .map_or(data.len(), |i| pos + i);
            let line_offset = from + pos as u64;
            let line = String::from_utf8_lossy(&data[pos..end]);
            pos = end + 1;

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            match Record::parse_line(trimmed) {
                Ok(Record::Issue(issue)) => {
                    if let Err(e) = apply_issue_record(tx.conn(), issue) {
                        skip_or_bail(e, line_offset, trimmed)?;
                    }
                }
                Ok(Record::Dep(dep)) => {
                    if let Err(e) = apply_dep_record(tx.conn(), dep) {
                        skip_or_bail(e, line_offset, trimmed)?;
                    }
                }
                Ok(Record::Comment(comment)) => pending_comments.push(comment),
                Err(e) => {
                    warn!(
                        offset = line_offset,
                        error = %e,
                        snippet = snippet(trimmed),
                        "skipping malformed log line"
                    );
                }
            }
        }

        for comment in &pending_comments {
            if let Err(e) = apply_comment_record(tx.conn(), comment) {
                skip_or_bail(e, from, &comment.id)?;
            }
        }

        meta::store_watermark(
            tx.conn(),
            &Watermark {
                offset: from + data.len() as u64,
                inode: stat.inode,
                mtime_ms: stat.mtime_ms,
            },
        )?;
        tx.commit()
    }
}

/// Malformed records are warned and skipped; anything else aborts the batch.
fn skip_or_bail(e: StoreError, offset: u64, context: &str) -> Result<()> {
    match e {
        StoreError::MalformedRecord { ref reason } => {
            warn!(offset, reason = %reason, snippet = snippet(context), "skipping malformed log record");
            Ok(())
        }
        other => Err(other),
    }
}

fn snippet(line: &str) -> String {
    const MAX: usize = 80;
    if line.len() > MAX {
        let mut cut = MAX;
        while !line.is_char_boundary(cut) {
            cut -= 1;
        }
        format!("{}...", &line[..cut])
    } else {
        line.to_owned()
    }
}

/// Applies an issue record with last-writer-wins resolution.
///
/// The incoming record wins when its rev is byte-lexicographically greater
/// than the stored one, or equal with a later `updated_at`. Out-of-range
/// status/priority values are persisted verbatim; validation belongs to the
/// write path.
pub(crate) fn apply_issue_record(conn: &Connection, mut issue: Issue) -> Result<()> {
    if issue.id.is_empty() {
        return Err(StoreError::malformed("issue record with empty id"));
    }
    if issue.rev.is_empty() {
        return Err(StoreError::malformed("issue record with empty rev"));
    }

    let wins = match issues::get_issue_rev(conn, &issue.id)? {
        None => true,
        Some((stored_rev, stored_updated)) => {
            issue.rev > stored_rev || (issue.rev == stored_rev && issue.updated_at > stored_updated)
        }
    };
    if !wins {
        return Ok(());
    }

    issue.tags.sort();
    issue.tags.dedup();

    issues::upsert_issue(conn, &issue)?;
    issues::replace_tags(conn, &issue.id, &issue.tags)?;
    issues::refresh_fts(conn, &issue.id)?;
    Ok(())
}

/// Applies a dep record; the record wins only on a strictly greater rev.
/// Tombstones flip state the same way, they never delete.
pub(crate) fn apply_dep_record(conn: &Connection, mut dep: Dep) -> Result<()> {
    if dep.src_id.is_empty() || dep.dst_id.is_empty() {
        return Err(StoreError::malformed("dep record with empty endpoint"));
    }
    if dep.rev.is_empty() {
        return Err(StoreError::malformed("dep record with empty rev"));
    }
    if dep.src_id == dep.dst_id {
        return Err(StoreError::malformed("self-referential dep record"));
    }

    dep.canonicalize();

    let wins = match deps::get_dep_rev(conn, &dep.src_id, &dep.dst_id, &dep.kind)? {
        None => true,
        Some(stored_rev) => dep.rev > stored_rev,
    };
    if wins {
        deps::put_dep(conn, &dep)?;
    }
    Ok(())
}

/// Applies a comment record: insert-or-ignore on id. Dangling comments
/// (issue still absent after the buffered pass) are skipped.
pub(crate) fn apply_comment_record(conn: &Connection, comment: &Comment) -> Result<()> {
    if comment.id.is_empty() || comment.issue_id.is_empty() {
        return Err(StoreError::malformed("comment record with empty id"));
    }

    if !issues::issue_exists(conn, &comment.issue_id)? {
        warn!(
            comment = %comment.id,
            issue = %comment.issue_id,
            "skipping comment for unknown issue"
        );
        return Ok(());
    }

    let inserted = comments::insert_comment(conn, comment)?;
    if inserted {
        issues::refresh_fts(conn, &comment.issue_id)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::write::NewIssue;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tissue_core::enums::{DepKind, DepState, Status};

    fn test_store() -> (tempfile::TempDir, Store) {
        let tmp = tempfile::tempdir().unwrap();
        let store = Store::init(tmp.path().join(".tissue"), Some("t")).unwrap();
        (tmp, store)
    }

    fn append_lines(store: &Store, lines: &[&str]) {
        let mut file = std::fs::OpenOptions::new()
            .append(true)
            .open(store.log_path())
            .unwrap();
        for line in lines {
            writeln!(file, "{line}").unwrap();
        }
        file.sync_all().unwrap();
    }

    fn issue_line(id: &str, rev: &str, title: &str, status: &str, updated_at: i64) -> String {
        format!(
            r#"{{"type":"issue","id":"{id}","rev":"{rev}","title":"{title}","body":"","status":"{status}","priority":2,"tags":[],"created_at":1,"updated_at":{updated_at}}}"#
        )
    }

    #[test]
    fn external_append_is_picked_up_incrementally() {
        let (_tmp, mut store) = test_store();
        append_lines(
            &store,
            &[&issue_line("t-aaaa0000", "01B", "External", "open", 5)],
        );

        store.sync_with_log().unwrap();
        let issue = store.get_issue("t-aaaa0000").unwrap();
        assert_eq!(issue.title, "External");
    }

    #[test]
    fn comment_before_issue_line_still_lands() {
        let (_tmp, mut store) = test_store();
        append_lines(
            &store,
            &[
                r#"{"type":"comment","id":"01CCCCCCCCCCCCCCCCCCCCCCCC","issue_id":"t-aaaa0000","body":"early","created_at":3}"#,
                &issue_line("t-aaaa0000", "01B", "Late issue", "open", 5),
            ],
        );

        store.sync_with_log().unwrap();
        let comments = store.get_comments("t-aaaa0000").unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].body, "early");
    }

    #[test]
    fn dangling_comment_is_skipped_without_aborting() {
        let (_tmp, mut store) = test_store();
        append_lines(
            &store,
            &[
                r#"{"type":"comment","id":"01CCCCCCCCCCCCCCCCCCCCCCCC","issue_id":"t-gone0000","body":"orphan","created_at":3}"#,
                &issue_line("t-aaaa0000", "01B", "Present", "open", 5),
            ],
        );

        store.sync_with_log().unwrap();
        assert!(store.get_issue("t-aaaa0000").is_ok());
        assert!(store.get_comments("t-gone0000").unwrap().is_empty());
    }

    #[test]
    fn greater_rev_wins_in_either_order() {
        for flip in [false, true] {
            let (_tmp, mut store) = test_store();
            let older = issue_line("t-aaaa0000", "01A", "Older", "open", 5);
            let newer = issue_line("t-aaaa0000", "01B", "Newer", "open", 4);
            let lines: Vec<&str> = if flip {
                vec![&newer, &older]
            } else {
                vec![&older, &newer]
            };
            append_lines(&store, &lines);

            store.sync_with_log().unwrap();
            let issue = store.get_issue("t-aaaa0000").unwrap();
            assert_eq!(issue.title, "Newer", "flip={flip}");
            assert_eq!(issue.rev, "01B");
        }
    }

    #[test]
    fn equal_rev_breaks_tie_on_updated_at() {
        let (_tmp, mut store) = test_store();
        append_lines(
            &store,
            &[
                &issue_line("t-aaaa0000", "01A", "First", "open", 10),
                &issue_line("t-aaaa0000", "01A", "Second", "open", 20),
            ],
        );

        store.sync_with_log().unwrap();
        assert_eq!(store.get_issue("t-aaaa0000").unwrap().title, "Second");
    }

    #[test]
    fn same_record_twice_is_idempotent() {
        let (_tmp, mut store) = test_store();
        let line = issue_line("t-aaaa0000", "01A", "Once", "open", 10);
        append_lines(&store, &[&line, &line]);
        store.sync_with_log().unwrap();

        let issue = store.get_issue("t-aaaa0000").unwrap();
        assert_eq!(issue.title, "Once");
        let count: i64 = store
            .conn
            .query_row("SELECT COUNT(*) FROM issues", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn malformed_lines_are_skipped_with_survivors_applied() {
        let (_tmp, mut store) = test_store();
        append_lines(
            &store,
            &[
                "not json at all",
                "[1,2,3]",
                r#"{"type":"issue"}"#,
                &issue_line("t-aaaa0000", "01A", "Survivor", "open", 10),
            ],
        );

        store.sync_with_log().unwrap();
        assert_eq!(store.get_issue("t-aaaa0000").unwrap().title, "Survivor");
    }

    #[test]
    fn out_of_range_values_are_persisted_verbatim() {
        let (_tmp, mut store) = test_store();
        append_lines(
            &store,
            &[
                r#"{"type":"issue","id":"t-aaaa0000","rev":"01A","title":"odd","body":"","status":"someday","priority":9,"tags":[],"created_at":1,"updated_at":2}"#,
            ],
        );

        store.sync_with_log().unwrap();
        let issue = store.get_issue("t-aaaa0000").unwrap();
        assert_eq!(issue.status, Status::Custom("someday".into()));
        assert_eq!(issue.priority, 9);
    }

    #[test]
    fn dep_tombstone_flips_state_without_deleting() {
        let (_tmp, mut store) = test_store();
        append_lines(
            &store,
            &[
                &issue_line("t-aaaa0000", "01A", "a", "open", 1),
                &issue_line("t-bbbb0000", "01A", "b", "open", 1),
                r#"{"type":"dep","src_id":"t-aaaa0000","dst_id":"t-bbbb0000","kind":"blocks","state":"active","created_at":1,"rev":"01A"}"#,
                r#"{"type":"dep","src_id":"t-aaaa0000","dst_id":"t-bbbb0000","kind":"blocks","state":"removed","created_at":1,"rev":"01B"}"#,
            ],
        );

        store.sync_with_log().unwrap();
        assert!(store.get_deps("t-aaaa0000").unwrap().is_empty());
        let state: String = store
            .conn
            .query_row("SELECT state FROM deps", [], |row| row.get(0))
            .unwrap();
        assert_eq!(state, "removed");
    }

    #[test]
    fn dep_with_stale_rev_does_not_regress() {
        let (_tmp, mut store) = test_store();
        append_lines(
            &store,
            &[
                &issue_line("t-aaaa0000", "01A", "a", "open", 1),
                &issue_line("t-bbbb0000", "01A", "b", "open", 1),
                r#"{"type":"dep","src_id":"t-aaaa0000","dst_id":"t-bbbb0000","kind":"blocks","state":"removed","created_at":1,"rev":"01B"}"#,
                r#"{"type":"dep","src_id":"t-aaaa0000","dst_id":"t-bbbb0000","kind":"blocks","state":"active","created_at":1,"rev":"01A"}"#,
            ],
        );

        store.sync_with_log().unwrap();
        let state: String = store
            .conn
            .query_row("SELECT state FROM deps", [], |row| row.get(0))
            .unwrap();
        assert_eq!(state, "removed");
    }

    #[test]
    fn truncated_log_triggers_full_reimport() {
        let (_tmp, mut store) = test_store();
        store
            .create_issue(&NewIssue {
                title: "one".into(),
                ..NewIssue::default()
            })
            .unwrap();
        let keep = store
            .create_issue(&NewIssue {
                title: "two".into(),
                ..NewIssue::default()
            })
            .unwrap();

        // Rewrite the log in place, keeping only the second issue's line.
        let contents = std::fs::read_to_string(store.log_path()).unwrap();
        let second_line = contents
            .lines()
            .find(|l| l.contains(&keep.id))
            .unwrap()
            .to_owned();
        std::fs::write(store.log_path(), format!("{second_line}\n")).unwrap();

        store.sync_with_log().unwrap();
        let count: i64 = store
            .conn
            .query_row("SELECT COUNT(*) FROM issues", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
        assert!(store.get_issue(&keep.id).is_ok());
    }

    #[test]
    fn deleting_cache_file_rebuilds_identical_state() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join(".tissue");
        let (issue, comment) = {
            let mut store = Store::init(&dir, Some("t")).unwrap();
            let issue = store
                .create_issue(&NewIssue {
                    title: "Durable".into(),
                    tags: vec!["x".into()],
                    ..NewIssue::default()
                })
                .unwrap();
            let comment = store.add_comment(&issue.id, "hello").unwrap();
            (issue, comment)
        };

        std::fs::remove_file(dir.join("issues.db")).unwrap();
        // WAL siblings may or may not exist depending on checkpointing.
        let _ = std::fs::remove_file(dir.join("issues.db-wal"));
        let _ = std::fs::remove_file(dir.join("issues.db-shm"));

        let store = Store::open(&dir).unwrap();
        let reloaded = store.get_issue(&issue.id).unwrap();
        assert_eq!(reloaded, issue);
        assert_eq!(store.get_comments(&issue.id).unwrap(), vec![comment]);
    }

    #[test]
    fn write_then_force_reimport_is_a_fixpoint() {
        let (_tmp, mut store) = test_store();
        let issue = store
            .create_issue(&NewIssue {
                title: "Fix flake".into(),
                tags: vec!["ci".into()],
                ..NewIssue::default()
            })
            .unwrap();
        let other = store
            .create_issue(&NewIssue {
                title: "Other".into(),
                ..NewIssue::default()
            })
            .unwrap();
        store.add_dep(&issue.id, &other.id, DepKind::Blocks).unwrap();
        let comment = store.add_comment(&issue.id, "note").unwrap();

        store.force_reimport().unwrap();
        assert_eq!(store.get_issue(&issue.id).unwrap(), issue);
        assert_eq!(store.get_comments(&issue.id).unwrap(), vec![comment]);
        assert_eq!(store.get_deps(&issue.id).unwrap().len(), 1);
    }

    #[test]
    fn up_to_date_log_is_a_noop() {
        let (_tmp, mut store) = test_store();
        store
            .create_issue(&NewIssue {
                title: "x".into(),
                ..NewIssue::default()
            })
            .unwrap();

        // The write path advanced the watermark; sync must not disturb rows.
        store.sync_with_log().unwrap();
        let count: i64 = store
            .conn
            .query_row("SELECT COUNT(*) FROM issues", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn import_applies_dep_canonicalization() {
        let (_tmp, mut store) = test_store();
        append_lines(
            &store,
            &[
                &issue_line("t-aaaa0000", "01A", "a", "open", 1),
                &issue_line("t-bbbb0000", "01A", "b", "open", 1),
                // relates pair written backwards by an external tool.
                r#"{"type":"dep","src_id":"t-bbbb0000","dst_id":"t-aaaa0000","kind":"relates","state":"active","created_at":1,"rev":"01A"}"#,
            ],
        );

        store.sync_with_log().unwrap();
        let deps = store.get_deps("t-aaaa0000").unwrap();
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].src_id, "t-aaaa0000");
        assert_eq!(deps[0].dst_id, "t-bbbb0000");
        assert_eq!(deps[0].kind, DepKind::Relates);
        assert_eq!(deps[0].state, DepState::Active);
    }
}
