//! Merge another store's log into this one.

use std::collections::HashSet;
use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};

use tissue_core::record::Record;
use tissue_lockfile::LockFile;

use crate::error::{Result, StoreError};
use crate::store::Store;
use crate::{comments, deps, issues, log};

/// Counts of records copied (or that would be copied) by a migration.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct MigrateReport {
    pub issues: usize,
    pub deps: usize,
    pub comments: usize,
    /// `false` for a dry run.
    pub applied: bool,
}

impl Store {
    /// Copies records from another store's log into this one, skipping
    /// anything already present, then rebuilds the cache.
    ///
    /// Dedupe rules: an issue id already in the destination (or seen earlier
    /// in the source log) is skipped; likewise comment ids and dep keys. A
    /// dep additionally requires both endpoints to exist in the destination
    /// or be part of this migration. The append batch is ordered issues,
    /// deps, comments.
    pub fn migrate_from(&mut self, source_dir: &Path, dry_run: bool) -> Result<MigrateReport> {
        let source_log = source_dir.join(tissue_config::LOG_FILE_NAME);
        if !source_log.is_file() {
            return Err(StoreError::StoreNotFound {
                path: source_dir.to_path_buf(),
            });
        }

        // Respect the source store's locking discipline while reading.
        let data = {
            let source_lock = LockFile::open(source_dir.join(tissue_config::LOCK_FILE_NAME))?;
            let _guard = source_lock.lock_shared()?;
            std::fs::read(&source_log)?
        };

        let mut records = Vec::new();
        for line in data.split(|&b| b == b'\n') {
            let text = String::from_utf8_lossy(line);
            let trimmed = text.trim();
            if trimmed.is_empty() {
                continue;
            }
            match Record::parse_line(trimmed) {
                Ok(record) => records.push(record),
                Err(e) => warn!(error = %e, "skipping malformed line in source log"),
            }
        }

        // First pass: issues. First occurrence of an id wins.
        let mut seen_issues: HashSet<String> = HashSet::new();
        let mut new_issues = Vec::new();
        let mut new_issue_ids: HashSet<String> = HashSet::new();
        for record in &records {
            if let Record::Issue(issue) = record {
                if seen_issues.contains(&issue.id) {
                    continue;
                }
                seen_issues.insert(issue.id.clone());
                if issues::issue_exists(&self.conn, &issue.id)? {
                    continue;
                }
                new_issue_ids.insert(issue.id.clone());
                new_issues.push(issue.clone());
            }
        }

        // Second pass: deps and comments against the combined id space.
        let mut seen_deps: HashSet<(String, String, String)> = HashSet::new();
        let mut new_deps = Vec::new();
        let mut seen_comments: HashSet<String> = HashSet::new();
        let mut new_comments = Vec::new();
        for record in &records {
            match record {
                Record::Dep(dep) => {
                    let mut dep = dep.clone();
                    dep.canonicalize();
                    let key = (
                        dep.src_id.clone(),
                        dep.dst_id.clone(),
                        dep.kind.as_str().to_owned(),
                    );
                    if seen_deps.contains(&key) {
                        continue;
                    }
                    seen_deps.insert(key);
                    if deps::get_dep(&self.conn, &dep.src_id, &dep.dst_id, &dep.kind)?.is_some() {
                        continue;
                    }
                    let endpoints_ok = [&dep.src_id, &dep.dst_id].into_iter().all(|id| {
                        new_issue_ids.contains(id)
                            || issues::issue_exists(&self.conn, id).unwrap_or(false)
                    });
                    if !endpoints_ok {
                        warn!(src = %dep.src_id, dst = %dep.dst_id, "skipping dep with missing endpoint");
                        continue;
                    }
                    new_deps.push(dep);
                }
                Record::Comment(comment) => {
                    if seen_comments.contains(&comment.id) {
                        continue;
                    }
                    seen_comments.insert(comment.id.clone());
                    if comments::comment_exists(&self.conn, &comment.id)? {
                        continue;
                    }
                    new_comments.push(comment.clone());
                }
                Record::Issue(_) => {}
            }
        }

        let report = MigrateReport {
            issues: new_issues.len(),
            deps: new_deps.len(),
            comments: new_comments.len(),
            applied: !dry_run,
        };
        if dry_run {
            return Ok(report);
        }

        let batch: Vec<Record> = new_issues
            .into_iter()
            .map(Record::Issue)
            .chain(new_deps.into_iter().map(Record::Dep))
            .chain(new_comments.into_iter().map(Record::Comment))
            .collect();
        log::append_records_for_import(&self.lock, &self.log_path, &batch)?;
        self.force_reimport()?;

        info!(
            issues = report.issues,
            deps = report.deps,
            comments = report.comments,
            source = %source_dir.display(),
            "migrated records from source store"
        );
        Ok(report)
    }
}
