//! DDL statements for the derived SQLite cache.
//!
//! The cache is strictly derived from the JSONL log: destroying `issues.db`
//! and reopening the store rebuilds an equivalent state. Timestamps are
//! stored as INTEGER epoch milliseconds. `deps` carries no foreign keys so
//! edges can reference issues that arrive later in a merged log.

/// Schema version recorded in `meta`. Bumped whenever DDL changes.
pub const SCHEMA_VERSION: i32 = 1;

/// Core DDL, executed idempotently on every open.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    // -- Issues table --------------------------------------------------------
    r#"
    CREATE TABLE IF NOT EXISTS issues (
        id         TEXT PRIMARY KEY,
        rev        TEXT NOT NULL,
        title      TEXT NOT NULL,
        body       TEXT NOT NULL DEFAULT '',
        status     TEXT NOT NULL DEFAULT 'open',
        priority   INTEGER NOT NULL DEFAULT 2,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_issues_status ON issues(status)",
    "CREATE INDEX IF NOT EXISTS idx_issues_updated_at ON issues(updated_at)",
    "CREATE INDEX IF NOT EXISTS idx_issues_priority ON issues(priority)",
    // -- Tags ----------------------------------------------------------------
    r#"
    CREATE TABLE IF NOT EXISTS tags (
        id   INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS issue_tags (
        issue_id TEXT NOT NULL REFERENCES issues(id) ON DELETE CASCADE,
        tag_id   INTEGER NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
        PRIMARY KEY (issue_id, tag_id)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_issue_tags_tag ON issue_tags(tag_id)",
    // -- Comments ------------------------------------------------------------
    r#"
    CREATE TABLE IF NOT EXISTS comments (
        id         TEXT PRIMARY KEY,
        issue_id   TEXT NOT NULL REFERENCES issues(id) ON DELETE CASCADE,
        body       TEXT NOT NULL,
        created_at INTEGER NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_comments_issue ON comments(issue_id)",
    "CREATE INDEX IF NOT EXISTS idx_comments_created_at ON comments(created_at)",
    // -- Dependencies --------------------------------------------------------
    r#"
    CREATE TABLE IF NOT EXISTS deps (
        src_id     TEXT NOT NULL,
        dst_id     TEXT NOT NULL,
        kind       TEXT NOT NULL DEFAULT 'blocks',
        state      TEXT NOT NULL DEFAULT 'active',
        created_at INTEGER NOT NULL,
        rev        TEXT NOT NULL,
        PRIMARY KEY (src_id, dst_id, kind)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_deps_src ON deps(src_id)",
    "CREATE INDEX IF NOT EXISTS idx_deps_dst ON deps(dst_id)",
    // -- Metadata ------------------------------------------------------------
    r#"
    CREATE TABLE IF NOT EXISTS meta (
        key   TEXT PRIMARY KEY,
        value TEXT NOT NULL
    )
    "#,
];

/// Full-text search over title, body, and concatenated comment bodies.
///
/// Created directly in its three-column shape; `issue_id` rides along
/// unindexed to key rewrites. Column order matters: list queries rank with
/// `bm25(issues_fts, 1.0, 0.5, 0.25)` so titles weigh highest.
pub const FTS_STATEMENTS: &[&str] = &[
    r#"
    CREATE VIRTUAL TABLE IF NOT EXISTS issues_fts
    USING fts5(title, body, comments, issue_id UNINDEXED)
    "#,
];

/// Content tables truncated by a full reimport, children first.
pub const CONTENT_TABLES: &[&str] = &[
    "issue_tags",
    "tags",
    "comments",
    "deps",
    "issues",
    "issues_fts",
];
