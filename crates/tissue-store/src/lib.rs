//! The tissue dual-storage engine.
//!
//! The append-only JSONL log (`issues.jsonl`) is the durable source of
//! truth; the SQLite cache (`issues.db`) is mechanically derived from it.
//! Every open reconciles the cache with the log, every mutation updates both
//! under an immediate transaction and a cross-process file lock, and the
//! cache can be destroyed and rebuilt from the log at any time.

pub mod clean;
mod comments;
mod deps;
pub mod error;
mod import;
mod issues;
mod log;
mod meta;
pub mod migrate;
mod queries;
mod resolve;
pub mod schema;
pub mod store;
mod write;

pub use clean::{CleanOptions, CleanReport};
pub use error::{Result, StoreError};
pub use migrate::MigrateReport;
pub use queries::ListFilter;
pub use store::Store;
pub use write::{IssueUpdate, NewIssue};
