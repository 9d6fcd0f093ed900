//! The clean command: physically rewrite the log to drop terminal issues.
//!
//! This is the only operation that removes history. The log is rewritten to
//! a temporary sibling file omitting every record that references the
//! removal set, atomically renamed over the original, and the cache rebuilt.

use std::collections::HashSet;
use std::io::Write;

use rusqlite::types::ToSql;
use serde::Serialize;
use tracing::info;

use tissue_core::issue::Issue;
use tissue_core::record::Record;

use crate::error::Result;
use crate::issues::{ISSUE_COLUMNS_PREFIXED, scan_issue};
use crate::store::{Store, now_ms};

/// Options for [`Store::clean`].
#[derive(Debug, Clone, Default)]
pub struct CleanOptions {
    /// Only remove issues whose `updated_at` is older than this many days.
    pub older_than_days: Option<i64>,
    /// Without force, clean is a dry run that just reports candidates.
    pub force: bool,
}

/// Outcome of a clean run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CleanReport {
    /// Terminal issues that were (or would be) removed.
    pub candidates: Vec<Issue>,
    /// Log records dropped by the rewrite, per type.
    pub removed_issue_records: usize,
    pub removed_comment_records: usize,
    pub removed_dep_records: usize,
    /// `false` for a dry run.
    pub applied: bool,
}

impl Store {
    /// Removes terminal-status issues (and their comments and deps) from the
    /// log, or reports what would be removed when `force` is off.
    pub fn clean(&mut self, opts: &CleanOptions) -> Result<CleanReport> {
        let cutoff = opts.older_than_days.map(|days| now_ms() - days * 86_400_000);

        let mut sql = format!(
            "SELECT {ISSUE_COLUMNS_PREFIXED} FROM issues i
             WHERE i.status IN ('closed', 'duplicate')"
        );
        let mut params: Vec<Box<dyn ToSql>> = Vec::new();
        if let Some(cutoff) = cutoff {
            sql.push_str(" AND i.updated_at < ?1");
            params.push(Box::new(cutoff));
        }
        sql.push_str(" ORDER BY i.updated_at ASC");

        let param_refs: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(param_refs.as_slice(), scan_issue)?;
        let mut candidates = Vec::new();
        for row in rows {
            candidates.push(row?);
        }
        drop(stmt);

        let mut report = CleanReport {
            candidates,
            ..CleanReport::default()
        };

        if !opts.force || report.candidates.is_empty() {
            return Ok(report);
        }

        let removal: HashSet<String> = report.candidates.iter().map(|i| i.id.clone()).collect();
        self.rewrite_log(&removal, &mut report)?;
        self.force_reimport()?;

        info!(
            issues = report.removed_issue_records,
            comments = report.removed_comment_records,
            deps = report.removed_dep_records,
            "cleaned terminal issues from log"
        );
        report.applied = true;
        Ok(report)
    }

    /// Streams the log into a temp sibling, dropping records that reference
    /// the removal set, then renames it over the original. Surviving lines
    /// keep their relative order and exact bytes; unparseable lines survive
    /// untouched.
    fn rewrite_log(&mut self, removal: &HashSet<String>, report: &mut CleanReport) -> Result<()> {
        let _guard = self.lock.lock_exclusive()?;

        let data = std::fs::read(&self.log_path)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;

        for line in data.split(|&b| b == b'\n') {
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            let text = String::from_utf8_lossy(line);
            let drop_line = match Record::parse_line(text.trim()) {
                Ok(Record::Issue(ref issue)) if removal.contains(issue.id.as_str()) => {
                    report.removed_issue_records += 1;
                    true
                }
                Ok(Record::Comment(ref comment)) if removal.contains(comment.issue_id.as_str()) => {
                    report.removed_comment_records += 1;
                    true
                }
                Ok(Record::Dep(ref dep))
                    if removal.contains(dep.src_id.as_str())
                        || removal.contains(dep.dst_id.as_str()) =>
                {
                    report.removed_dep_records += 1;
                    true
                }
                _ => false,
            };
            if !drop_line {
                tmp.write_all(line)?;
                tmp.write_all(b"\n")?;
            }
        }

        tmp.flush()?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.log_path).map_err(|e| e.error)?;
        Ok(())
    }
}
