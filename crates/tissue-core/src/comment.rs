//! Comment type. Comments are immutable once written.

use serde::{Deserialize, Serialize};

/// A comment attached to an issue.
///
/// The id is a 26-char revision token (see [`crate::rev`]), which doubles as
/// the chronological sort key. Field order matches the wire format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub issue_id: String,
    pub body: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}
