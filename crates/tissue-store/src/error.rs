//! Store error types.

use std::path::PathBuf;

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store directory does not exist (open, not init).
    #[error("no tissue store at {}", path.display())]
    StoreNotFound {
        /// The directory that was expected to hold the store.
        path: PathBuf,
    },

    /// Id resolution found no match.
    #[error("no issue matches '{input}'")]
    IssueNotFound {
        /// The user-supplied lookup string.
        input: String,
    },

    /// A prefix or hash-suffix lookup matched more than one issue.
    #[error("'{input}' is ambiguous: matches {}", matches.join(", "))]
    IssueIdAmbiguous {
        /// The user-supplied lookup string.
        input: String,
        /// The ids that matched.
        matches: Vec<String>,
    },

    /// Lookup input contains characters outside `[A-Za-z0-9.-]`.
    #[error("invalid id lookup '{input}': only letters, digits, '.' and '-' are allowed")]
    InvalidIdPrefix {
        /// The rejected input.
        input: String,
    },

    /// A project prefix normalized to the empty string.
    #[error("invalid prefix '{input}': nothing remains after normalization")]
    InvalidPrefix {
        /// The rejected raw prefix.
        input: String,
    },

    /// Dependency kind outside blocks/parent/relates.
    #[error("invalid dependency kind '{value}': expected blocks, parent or relates")]
    InvalidDepKind {
        /// The rejected kind string.
        value: String,
    },

    /// A dependency with identical endpoints.
    #[error("issue {id} cannot depend on itself")]
    SelfDependency {
        /// The offending issue id.
        id: String,
    },

    /// remove-dep found no active edge for the key.
    #[error("no active {kind} dependency between {src_id} and {dst_id}")]
    DepNotFound {
        src_id: String,
        dst_id: String,
        kind: String,
    },

    /// Ten nonces exhausted without a unique id. Practically unreachable.
    #[error("failed to mint a unique issue id after 10 attempts")]
    IssueIdCollision,

    /// Retries exhausted against a busy cache or lock.
    #[error("store is busy: another process holds the write slot")]
    Busy,

    /// A log record missing a required field, caught while applying to the
    /// cache (parse failures are warned and skipped before this point).
    #[error("malformed log record: {reason}")]
    MalformedRecord {
        /// What was missing or wrong.
        reason: String,
    },

    /// A write-path validation constraint was violated.
    #[error("validation error: {message}")]
    Validation {
        /// Description of the validation failure.
        message: String,
    },

    /// Lock file failure.
    #[error(transparent)]
    Lock(#[from] tissue_lockfile::LockError),

    /// Store layout creation failure.
    #[error(transparent)]
    Config(#[from] tissue_config::ConfigError),

    /// Any unrecoverable cache-engine failure.
    #[error("cache error: {0}")]
    Cache(#[from] rusqlite::Error),

    /// JSON serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Log file I/O failure.
    #[error("log I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the store crate.
pub type Result<T> = std::result::Result<T, StoreError>;

impl StoreError {
    // -- Constructors --------------------------------------------------------

    /// Creates a [`StoreError::Validation`] with the given message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates a [`StoreError::MalformedRecord`] with the given reason.
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            reason: reason.into(),
        }
    }

    // -- Predicates ----------------------------------------------------------

    /// Returns `true` if this is a [`StoreError::IssueNotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::IssueNotFound { .. })
    }

    /// Returns `true` if the error is contention and the operation may
    /// succeed on retry.
    pub fn is_busy(&self) -> bool {
        match self {
            Self::Busy => true,
            Self::Cache(e) => sqlite_is_busy(e),
            _ => false,
        }
    }
}

/// Returns `true` for SQLite busy/locked failures.
pub(crate) fn sqlite_is_busy(e: &rusqlite::Error) -> bool {
    matches!(
        e.sqlite_error_code(),
        Some(rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked)
    )
}
