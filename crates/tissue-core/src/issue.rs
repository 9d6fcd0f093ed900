//! Issue struct -- the central domain model for the tissue system.

use serde::{Deserialize, Serialize};

use crate::enums::Status;

/// Lowest (most urgent) priority value accepted by the write path.
pub const PRIORITY_MIN: i64 = 1;
/// Highest priority value accepted by the write path.
pub const PRIORITY_MAX: i64 = 5;
/// Priority assigned when the caller does not supply one.
pub const PRIORITY_DEFAULT: i64 = 2;

/// A trackable work item.
///
/// Field order matches the JSONL wire format (after the `type` tag) and must
/// not be rearranged: third-party tools parse these lines. Timestamps are
/// Unix epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub id: String,

    /// Revision token; the entire conflict-resolution mechanism.
    pub rev: String,

    pub title: String,

    #[serde(default)]
    pub body: String,

    #[serde(default)]
    pub status: Status,

    /// Priority 1-5, 1 highest. The importer persists out-of-range values
    /// verbatim; only the write path enforces the range.
    #[serde(default = "default_priority")]
    pub priority: i64,

    /// Sorted ascending before serialization.
    #[serde(default)]
    pub tags: Vec<String>,

    pub created_at: i64,

    pub updated_at: i64,
}

fn default_priority() -> i64 {
    PRIORITY_DEFAULT
}

impl Issue {
    /// Returns `true` when the priority is within the write path's range.
    pub fn priority_in_range(priority: i64) -> bool {
        (PRIORITY_MIN..=PRIORITY_MAX).contains(&priority)
    }
}
