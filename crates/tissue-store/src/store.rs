//! [`Store`] -- the open handle to a tissue store directory.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::Connection;
use tracing::{debug, info};

use tissue_config::{
    DB_FILE_NAME, LOCK_FILE_NAME, LOG_FILE_NAME, default_prefix_source, ensure_store_layout,
};
use tissue_core::prefix::{FALLBACK_PREFIX, normalize_prefix};
use tissue_lockfile::LockFile;

use crate::error::{Result, StoreError, sqlite_is_busy};
use crate::{meta, schema};

/// Attempts of the short retry loop around individual cache statements.
const STMT_ATTEMPTS: u32 = 10;
/// Sleep bounds of the short loop, milliseconds.
const STMT_SLEEP_MS: (u64, u64) = (50, 500);

/// An open store: the SQLite cache connection, the log and lock paths, and
/// the cached project prefix.
///
/// One `Store` per process; mutating operations take `&mut self` because the
/// cache transaction needs the connection exclusively.
pub struct Store {
    pub(crate) conn: Connection,
    pub(crate) dir: PathBuf,
    pub(crate) log_path: PathBuf,
    pub(crate) lock: LockFile,
    pub(crate) prefix: String,
}

impl Store {
    /// Creates the store layout at `dir` (idempotent) and opens it.
    ///
    /// `prefix` overrides the default, which is derived from the basename of
    /// the store directory's parent and falls back to `"tissue"`.
    pub fn init(dir: impl AsRef<Path>, prefix: Option<&str>) -> Result<Self> {
        let dir = dir.as_ref();
        ensure_store_layout(dir)?;
        let mut store = Self::open(dir)?;
        if let Some(raw) = prefix {
            store.set_prefix(raw)?;
        }
        Ok(store)
    }

    /// Opens an existing store and reconciles the cache with the log.
    ///
    /// Fails with [`StoreError::StoreNotFound`] when `dir` is absent; use
    /// [`Store::init`] to create one.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(StoreError::StoreNotFound {
                path: dir.to_path_buf(),
            });
        }
        info!(dir = %dir.display(), "opening tissue store");

        let log_path = dir.join(LOG_FILE_NAME);
        let lock = LockFile::open(dir.join(LOCK_FILE_NAME))?;
        let conn = Connection::open(dir.join(DB_FILE_NAME))?;

        let mut store = Self {
            conn,
            dir: dir.to_path_buf(),
            log_path,
            lock,
            prefix: String::new(),
        };
        store.configure_connection()?;
        store.init_schema()?;
        store.ensure_log()?;
        store.load_prefix()?;
        store.sync_with_log()?;

        Ok(store)
    }

    /// Closes the store, releasing the cache connection and lock file.
    pub fn close(self) {
        // Drop order handles everything; the method exists so callers can be
        // explicit about the handle's lifetime.
        drop(self);
    }

    /// The store directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the durable log.
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// The configured id prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Normalizes and persists a new id prefix; returns the normalized form.
    pub fn set_prefix(&mut self, raw: &str) -> Result<String> {
        let normalized = normalize_prefix(raw).ok_or_else(|| StoreError::InvalidPrefix {
            input: raw.to_owned(),
        })?;
        meta::set_meta(&self.conn, meta::KEY_ID_PREFIX, &normalized)?;
        self.prefix = normalized.clone();
        Ok(normalized)
    }

    /// Creates the log file if it does not exist.
    pub fn ensure_log(&self) -> Result<()> {
        if !self.log_path.exists() {
            std::fs::File::create(&self.log_path)?;
        }
        Ok(())
    }

    /// Sets durability pragmas: write-ahead logging, normal synchronous
    /// mode, a 5-minute busy timeout, and foreign-key enforcement.
    fn configure_connection(&self) -> Result<()> {
        self.conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA busy_timeout = 300000;
             PRAGMA foreign_keys = ON;",
        )?;
        Ok(())
    }

    /// Creates all tables if they do not exist and records the schema version.
    fn init_schema(&self) -> Result<()> {
        for stmt in schema::SCHEMA_STATEMENTS {
            self.conn.execute_batch(stmt)?;
        }
        for stmt in schema::FTS_STATEMENTS {
            self.conn.execute_batch(stmt)?;
        }
        meta::set_meta(
            &self.conn,
            meta::KEY_SCHEMA_VERSION,
            &schema::SCHEMA_VERSION.to_string(),
        )?;
        Ok(())
    }

    /// Loads the configured prefix, deriving and persisting a default on
    /// first open.
    fn load_prefix(&mut self) -> Result<()> {
        if let Some(stored) = meta::get_meta(&self.conn, meta::KEY_ID_PREFIX)? {
            self.prefix = stored;
            return Ok(());
        }

        let derived = default_prefix_source(&self.dir)
            .and_then(|raw| normalize_prefix(&raw))
            .unwrap_or_else(|| FALLBACK_PREFIX.to_owned());
        debug!(prefix = %derived, "derived default id prefix");
        meta::set_meta(&self.conn, meta::KEY_ID_PREFIX, &derived)?;
        self.prefix = derived;
        Ok(())
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("dir", &self.dir)
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

/// Current wall-clock time as Unix epoch milliseconds.
pub(crate) fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

// ---------------------------------------------------------------------------
// Manual transaction guard
// ---------------------------------------------------------------------------

/// An open cache transaction; rolls back on drop unless committed.
///
/// Managed manually (rather than via `rusqlite::Transaction`) so `BEGIN
/// IMMEDIATE` can sit inside the short statement-retry loop.
pub(crate) struct TxGuard<'c> {
    conn: &'c Connection,
    done: bool,
}

impl<'c> TxGuard<'c> {
    /// Begins an immediate transaction, claiming the writer slot up front.
    ///
    /// Retries busy failures up to [`STMT_ATTEMPTS`] times with sleeps in
    /// the 50-500 ms range before giving up.
    pub(crate) fn begin_immediate(conn: &'c Connection) -> Result<Self> {
        let mut attempt = 0;
        loop {
            match conn.execute_batch("BEGIN IMMEDIATE") {
                Ok(()) => return Ok(Self { conn, done: false }),
                Err(e) if sqlite_is_busy(&e) && attempt < STMT_ATTEMPTS => {
                    attempt += 1;
                    std::thread::sleep(ramp_delay(attempt, STMT_ATTEMPTS, STMT_SLEEP_MS));
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// The underlying connection, for statements inside the transaction.
    pub(crate) fn conn(&self) -> &'c Connection {
        self.conn
    }

    /// Commits the transaction.
    pub(crate) fn commit(mut self) -> Result<()> {
        self.conn.execute_batch("COMMIT")?;
        self.done = true;
        Ok(())
    }
}

impl Drop for TxGuard<'_> {
    fn drop(&mut self) {
        if !self.done {
            let _ = self.conn.execute_batch("ROLLBACK");
        }
    }
}

/// Linearly ramps from the low to the high bound over the attempt budget.
pub(crate) fn ramp_delay(attempt: u32, attempts: u32, (low, high): (u64, u64)) -> Duration {
    let span = high.saturating_sub(low);
    let ms = low + span * u64::from(attempt.min(attempts)) / u64::from(attempts.max(1));
    Duration::from_millis(ms)
}
