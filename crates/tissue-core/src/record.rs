//! The JSONL log's record sum type.
//!
//! Each line in `issues.jsonl` is one JSON object tagged by its `type` field.
//! The tagged-union encoding is a closed sum with three variants; key names
//! and field order are stable because third-party tools and prior versions of
//! the software parse these lines.

use serde::{Deserialize, Serialize};

use crate::comment::Comment;
use crate::dependency::Dep;
use crate::issue::Issue;

/// One durable log record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Record {
    Issue(Issue),
    Comment(Comment),
    Dep(Dep),
}

impl Record {
    /// Serializes the record as a single JSON line (no trailing newline).
    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parses one trimmed log line.
    ///
    /// Fails on non-JSON input, on a top-level value that is not an object,
    /// and on records whose required typed fields are missing or ill-typed.
    /// Callers (the importer) warn and skip on failure rather than aborting.
    pub fn parse_line(line: &str) -> Result<Record, serde_json::Error> {
        serde_json::from_str(line)
    }
}
