//! Read queries: fetch, list, search, ready work.

use rusqlite::types::ToSql;

use tissue_core::comment::Comment;
use tissue_core::dependency::Dep;
use tissue_core::enums::Status;
use tissue_core::issue::Issue;

use crate::error::{Result, StoreError};
use crate::issues::{ISSUE_COLUMNS_PREFIXED, load_tags, scan_issue};
use crate::store::Store;
use crate::{comments, deps, issues};

/// Filters for [`Store::list_issues`].
///
/// The status is carried as the raw enum (including `Custom`) so a filter on
/// a value the importer persisted verbatim still matches.
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    pub status: Option<Status>,
    pub tag: Option<String>,
    pub search: Option<String>,
    pub limit: Option<usize>,
}

impl Store {
    /// Fetches an issue (with tags) by exact id.
    pub fn get_issue(&self, id: &str) -> Result<Issue> {
        let mut issue =
            issues::get_issue_row(&self.conn, id)?.ok_or_else(|| StoreError::IssueNotFound {
                input: id.to_owned(),
            })?;
        issue.tags = load_tags(&self.conn, id)?;
        Ok(issue)
    }

    /// All comments on an issue, ascending `created_at`.
    pub fn get_comments(&self, issue_id: &str) -> Result<Vec<Comment>> {
        comments::get_comments(&self.conn, issue_id)
    }

    /// All active deps where the issue is either endpoint, ordered by kind
    /// then creation time.
    pub fn get_deps(&self, issue_id: &str) -> Result<Vec<Dep>> {
        deps::deps_for_issue(&self.conn, issue_id)
    }

    /// Lists issues with optional status, exact-tag, and full-text filters.
    ///
    /// With a search query, results rank by `bm25(fts, 1.0, 0.5, 0.25)`
    /// (titles highest, then bodies, then comments), tie-broken by
    /// `updated_at` descending; otherwise by `updated_at` descending.
    pub fn list_issues(&self, filter: &ListFilter) -> Result<Vec<Issue>> {
        let mut sql = format!("SELECT {ISSUE_COLUMNS_PREFIXED} FROM issues i");
        let mut where_clauses: Vec<String> = Vec::new();
        let mut param_values: Vec<Box<dyn ToSql>> = Vec::new();
        let mut param_idx = 1;

        if let Some(ref tag) = filter.tag {
            sql.push_str(
                " JOIN issue_tags it ON it.issue_id = i.id JOIN tags t ON t.id = it.tag_id",
            );
            where_clauses.push(format!("t.name = ?{param_idx}"));
            param_values.push(Box::new(tag.clone()));
            param_idx += 1;
        }

        if let Some(ref query) = filter.search {
            sql.push_str(" JOIN issues_fts ON issues_fts.issue_id = i.id");
            where_clauses.push(format!("issues_fts MATCH ?{param_idx}"));
            param_values.push(Box::new(query.clone()));
            param_idx += 1;
        }

        if let Some(ref status) = filter.status {
            where_clauses.push(format!("i.status = ?{param_idx}"));
            param_values.push(Box::new(status.as_str().to_owned()));
        }

        if !where_clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&where_clauses.join(" AND "));
        }

        if filter.search.is_some() {
            sql.push_str(" ORDER BY bm25(issues_fts, 1.0, 0.5, 0.25), i.updated_at DESC");
        } else {
            sql.push_str(" ORDER BY i.updated_at DESC");
        }

        if let Some(limit) = filter.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        self.query_issues(&sql, &param_values)
    }

    /// Returns open issues with no transitive active blocker, ordered by
    /// priority ascending then `updated_at` descending.
    ///
    /// The recursive CTE seeds from `blocks` edges whose source is active
    /// (`open`/`in_progress`/`paused`) and walks forward through the graph;
    /// `UNION` deduplication makes cycles terminate.
    pub fn ready_issues(&self, limit: Option<usize>) -> Result<Vec<Issue>> {
        let mut sql = format!(
            "WITH RECURSIVE blocked(id) AS (
                 SELECT d.dst_id FROM deps d
                   JOIN issues s ON s.id = d.src_id
                  WHERE d.kind = 'blocks' AND d.state = 'active'
                    AND s.status IN ('open', 'in_progress', 'paused')
               UNION
                 SELECT d.dst_id FROM deps d
                   JOIN blocked b ON b.id = d.src_id
                  WHERE d.kind = 'blocks' AND d.state = 'active'
             )
             SELECT {ISSUE_COLUMNS_PREFIXED} FROM issues i
              WHERE i.status = 'open'
                AND i.id NOT IN (SELECT id FROM blocked)
              ORDER BY i.priority ASC, i.updated_at DESC"
        );
        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        self.query_issues(&sql, &[])
    }

    fn query_issues(&self, sql: &str, params: &[Box<dyn ToSql>]) -> Result<Vec<Issue>> {
        let param_refs: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(param_refs.as_slice(), scan_issue)?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        for issue in &mut result {
            issue.tags = load_tags(&self.conn, &issue.id)?;
        }
        Ok(result)
    }
}
