//! The write path: every mutation updates cache and log atomically.
//!
//! Common shape: validate inputs, mint `rev` and `now`, begin an immediate
//! transaction, mutate the cache tables, append the log record under the
//! exclusive lock (fsync + watermark), commit. Contention is retried by a
//! coarse loop around the whole operation on top of the short statement loop
//! inside [`TxGuard::begin_immediate`].

use tissue_core::comment::Comment;
use tissue_core::dependency::Dep;
use tissue_core::enums::{DepKind, DepState, Status};
use tissue_core::idgen::{self, MAX_MINT_ATTEMPTS};
use tissue_core::issue::{Issue, PRIORITY_DEFAULT};
use tissue_core::record::Record;
use tissue_core::rev::next_rev;

use crate::error::{Result, StoreError};
use crate::store::{Store, TxGuard, now_ms, ramp_delay};
use crate::{comments, deps, issues, log};

/// Attempts of the coarse loop around an entire write operation.
const OP_ATTEMPTS: u32 = 50;
/// Sleep bounds of the coarse loop, milliseconds.
const OP_SLEEP_MS: (u64, u64) = (10, 200);

/// Inputs for creating an issue.
#[derive(Debug, Clone, Default)]
pub struct NewIssue {
    pub title: String,
    pub body: String,
    /// Defaults to 2 when absent.
    pub priority: Option<i64>,
    pub tags: Vec<String>,
}

/// Field-level partial update; `None` carries the stored value forward.
/// Tag removals apply after additions.
#[derive(Debug, Clone, Default)]
pub struct IssueUpdate {
    pub title: Option<String>,
    pub body: Option<String>,
    pub status: Option<Status>,
    pub priority: Option<i64>,
    pub add_tags: Vec<String>,
    pub remove_tags: Vec<String>,
}

impl Store {
    /// Creates a new issue and appends its record to the log.
    pub fn create_issue(&mut self, new: &NewIssue) -> Result<Issue> {
        if new.title.is_empty() {
            return Err(StoreError::validation("title must not be empty"));
        }
        let priority = new.priority.unwrap_or(PRIORITY_DEFAULT);
        validate_priority(priority)?;

        let mut tags = new.tags.clone();
        tags.sort();
        tags.dedup();

        retry_contention(|| self.try_create_issue(new, priority, &tags))
    }

    fn try_create_issue(&mut self, new: &NewIssue, priority: i64, tags: &[String]) -> Result<Issue> {
        let now = now_ms();
        let rev = next_rev();

        let tx = TxGuard::begin_immediate(&self.conn)?;

        let mut id = None;
        for nonce in 0..MAX_MINT_ATTEMPTS {
            let candidate = idgen::mint_issue_id(&self.prefix, &new.title, &new.body, now, nonce);
            if !issues::issue_exists(tx.conn(), &candidate)? {
                id = Some(candidate);
                break;
            }
        }
        let id = id.ok_or(StoreError::IssueIdCollision)?;

        let issue = Issue {
            id,
            rev,
            title: new.title.clone(),
            body: new.body.clone(),
            status: Status::Open,
            priority,
            tags: tags.to_vec(),
            created_at: now,
            updated_at: now,
        };

        issues::upsert_issue(tx.conn(), &issue)?;
        issues::replace_tags(tx.conn(), &issue.id, &issue.tags)?;
        issues::refresh_fts(tx.conn(), &issue.id)?;
        log::append_record(
            tx.conn(),
            &self.lock,
            &self.log_path,
            &Record::Issue(issue.clone()),
        )?;
        tx.commit()?;

        Ok(issue)
    }

    /// Applies a partial update to an issue. Omitted fields carry forward;
    /// the row is fully replaced and a fresh record appended.
    pub fn update_issue(&mut self, id: &str, update: &IssueUpdate) -> Result<Issue> {
        if let Some(ref title) = update.title {
            if title.is_empty() {
                return Err(StoreError::validation("title must not be empty"));
            }
        }
        if let Some(priority) = update.priority {
            validate_priority(priority)?;
        }
        if let Some(ref status) = update.status {
            if !status.is_builtin() {
                return Err(StoreError::validation(format!(
                    "unknown status '{status}': expected open, in_progress, paused, duplicate or closed"
                )));
            }
        }

        retry_contention(|| self.try_update_issue(id, update))
    }

    fn try_update_issue(&mut self, id: &str, update: &IssueUpdate) -> Result<Issue> {
        let tx = TxGuard::begin_immediate(&self.conn)?;

        let mut issue =
            issues::get_issue_row(tx.conn(), id)?.ok_or_else(|| StoreError::IssueNotFound {
                input: id.to_owned(),
            })?;
        let mut tags = issues::load_tags(tx.conn(), id)?;

        if let Some(ref title) = update.title {
            issue.title = title.clone();
        }
        if let Some(ref body) = update.body {
            issue.body = body.clone();
        }
        if let Some(ref status) = update.status {
            issue.status = status.clone();
        }
        if let Some(priority) = update.priority {
            issue.priority = priority;
        }

        // Removals after additions: a tag in both lists is a net removal.
        tags.extend(update.add_tags.iter().cloned());
        tags.retain(|tag| !update.remove_tags.contains(tag));
        tags.sort();
        tags.dedup();
        issue.tags = tags;

        issue.rev = next_rev();
        issue.updated_at = now_ms();

        issues::upsert_issue(tx.conn(), &issue)?;
        issues::replace_tags(tx.conn(), &issue.id, &issue.tags)?;
        issues::refresh_fts(tx.conn(), &issue.id)?;
        log::append_record(
            tx.conn(),
            &self.lock,
            &self.log_path,
            &Record::Issue(issue.clone()),
        )?;
        tx.commit()?;

        Ok(issue)
    }

    /// Adds an immutable comment to an issue.
    pub fn add_comment(&mut self, issue_id: &str, body: &str) -> Result<Comment> {
        retry_contention(|| self.try_add_comment(issue_id, body))
    }

    fn try_add_comment(&mut self, issue_id: &str, body: &str) -> Result<Comment> {
        let tx = TxGuard::begin_immediate(&self.conn)?;

        if !issues::issue_exists(tx.conn(), issue_id)? {
            return Err(StoreError::IssueNotFound {
                input: issue_id.to_owned(),
            });
        }

        let comment = Comment {
            id: next_rev(),
            issue_id: issue_id.to_owned(),
            body: body.to_owned(),
            created_at: now_ms(),
        };

        comments::insert_comment(tx.conn(), &comment)?;
        issues::refresh_fts(tx.conn(), issue_id)?;
        log::append_record(
            tx.conn(),
            &self.lock,
            &self.log_path,
            &Record::Comment(comment.clone()),
        )?;
        tx.commit()?;

        Ok(comment)
    }

    /// Adds a dependency edge. `relates` pairs are canonicalized before
    /// storage, so either argument order names the same edge.
    pub fn add_dep(&mut self, src_id: &str, dst_id: &str, kind: DepKind) -> Result<Dep> {
        if !kind.is_builtin() {
            return Err(StoreError::InvalidDepKind {
                value: kind.as_str().to_owned(),
            });
        }
        let (src_id, dst_id) = Dep::canonical_pair(src_id, dst_id, &kind);
        if src_id == dst_id {
            return Err(StoreError::SelfDependency { id: src_id });
        }

        retry_contention(|| self.try_add_dep(&src_id, &dst_id, &kind))
    }

    fn try_add_dep(&mut self, src_id: &str, dst_id: &str, kind: &DepKind) -> Result<Dep> {
        let tx = TxGuard::begin_immediate(&self.conn)?;

        for endpoint in [src_id, dst_id] {
            if !issues::issue_exists(tx.conn(), endpoint)? {
                return Err(StoreError::IssueNotFound {
                    input: endpoint.to_owned(),
                });
            }
        }

        let dep = Dep {
            src_id: src_id.to_owned(),
            dst_id: dst_id.to_owned(),
            kind: kind.clone(),
            state: DepState::Active,
            created_at: now_ms(),
            rev: next_rev(),
        };

        deps::put_dep(tx.conn(), &dep)?;
        log::append_record(
            tx.conn(),
            &self.lock,
            &self.log_path,
            &Record::Dep(dep.clone()),
        )?;
        tx.commit()?;

        Ok(dep)
    }

    /// Soft-deletes a dependency by writing a tombstone record.
    pub fn remove_dep(&mut self, src_id: &str, dst_id: &str, kind: DepKind) -> Result<()> {
        if !kind.is_builtin() {
            return Err(StoreError::InvalidDepKind {
                value: kind.as_str().to_owned(),
            });
        }
        let (src_id, dst_id) = Dep::canonical_pair(src_id, dst_id, &kind);

        retry_contention(|| self.try_remove_dep(&src_id, &dst_id, &kind))
    }

    fn try_remove_dep(&mut self, src_id: &str, dst_id: &str, kind: &DepKind) -> Result<()> {
        let tx = TxGuard::begin_immediate(&self.conn)?;

        let stored = deps::get_dep(tx.conn(), src_id, dst_id, kind)?;
        let stored = match stored {
            Some(dep) if dep.state == DepState::Active => dep,
            _ => {
                return Err(StoreError::DepNotFound {
                    src_id: src_id.to_owned(),
                    dst_id: dst_id.to_owned(),
                    kind: kind.as_str().to_owned(),
                });
            }
        };

        let tombstone = Dep {
            state: DepState::Removed,
            rev: next_rev(),
            ..stored
        };

        deps::put_dep(tx.conn(), &tombstone)?;
        log::append_record(
            tx.conn(),
            &self.lock,
            &self.log_path,
            &Record::Dep(tombstone),
        )?;
        tx.commit()?;

        Ok(())
    }
}

fn validate_priority(priority: i64) -> Result<()> {
    if Issue::priority_in_range(priority) {
        Ok(())
    } else {
        Err(StoreError::validation(format!(
            "priority must be between 1 and 5 (got {priority})"
        )))
    }
}

/// Retries the whole operation on contention, up to [`OP_ATTEMPTS`] times
/// with sleeps ramping through [`OP_SLEEP_MS`]. Exhaustion surfaces as
/// [`StoreError::Busy`].
fn retry_contention<T>(mut op: impl FnMut() -> Result<T>) -> Result<T> {
    let mut attempt = 0;
    loop {
        match op() {
            Err(e) if e.is_busy() => {
                if attempt >= OP_ATTEMPTS {
                    return Err(StoreError::Busy);
                }
                attempt += 1;
                std::thread::sleep(ramp_delay(attempt, OP_ATTEMPTS, OP_SLEEP_MS));
            }
            other => return other,
        }
    }
}
