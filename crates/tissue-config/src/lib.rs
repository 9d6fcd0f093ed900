//! Store directory discovery and on-disk layout for the tissue tracker.

pub mod store_dir;

pub use store_dir::{
    DB_FILE_NAME, LOCK_FILE_NAME, LOG_FILE_NAME, STORE_DIR_ENV, STORE_DIR_NAME, ConfigError,
    default_prefix_source, ensure_store_layout, find_store_dir, resolve_store_dir,
};
