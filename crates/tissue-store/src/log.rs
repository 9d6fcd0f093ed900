//! The append-only JSONL log: stat, append, rewrite.

use std::fs::{File, Metadata, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::time::UNIX_EPOCH;

use rusqlite::Connection;
use tracing::debug;

use tissue_core::record::Record;
use tissue_lockfile::LockFile;

use crate::error::Result;
use crate::meta::{self, Watermark};

/// Identity triple of the log file, compared against the stored watermark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LogStat {
    pub inode: u64,
    pub size: u64,
    pub mtime_ms: i64,
}

/// Stats the log file.
pub(crate) fn stat_log(path: &Path) -> Result<LogStat> {
    let metadata = std::fs::metadata(path)?;
    Ok(stat_from_metadata(&metadata))
}

pub(crate) fn stat_from_metadata(metadata: &Metadata) -> LogStat {
    LogStat {
        inode: inode_of(metadata),
        size: metadata.len(),
        mtime_ms: mtime_ms_of(metadata),
    }
}

#[cfg(unix)]
fn inode_of(metadata: &Metadata) -> u64 {
    use std::os::unix::fs::MetadataExt;
    metadata.ino()
}

#[cfg(not(unix))]
fn inode_of(_metadata: &Metadata) -> u64 {
    // No inode notion; identity falls back to size/mtime alone.
    0
}

fn mtime_ms_of(metadata: &Metadata) -> i64 {
    metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Appends one record to the log under the exclusive cross-process lock.
///
/// The sequence is: lock, append, fsync, stat, advance the watermark on the
/// caller's open transaction. The watermark only advances when the stored
/// offset still matches the pre-append size; if another process slipped
/// records in since our last import, the watermark stays put so the next
/// incremental import picks those up (re-applying our own record is a no-op
/// by construction).
pub(crate) fn append_record(
    conn: &Connection,
    lock: &LockFile,
    log_path: &Path,
    record: &Record,
) -> Result<()> {
    let line = record.to_line()?;

    let _guard = lock.lock_exclusive()?;

    let pre = stat_log(log_path)?;
    let mut file = OpenOptions::new().append(true).create(true).open(log_path)?;
    file.write_all(line.as_bytes())?;
    file.write_all(b"\n")?;
    file.sync_all()?;

    let post = stat_from_metadata(&file.metadata()?);
    let stored = meta::load_watermark(conn)?;
    let up_to_date = stored
        .map(|w| w.inode == pre.inode && w.offset == pre.size)
        .unwrap_or(false);
    if up_to_date {
        meta::store_watermark(
            conn,
            &Watermark {
                offset: post.size,
                inode: post.inode,
                mtime_ms: post.mtime_ms,
            },
        )?;
    } else {
        debug!("log grew outside this process; leaving watermark for the importer");
    }

    Ok(())
}

/// Appends a batch of records under a single lock acquisition, without
/// touching the watermark -- the caller reimports afterwards.
pub(crate) fn append_records_for_import(
    lock: &LockFile,
    log_path: &Path,
    records: &[Record],
) -> Result<()> {
    if records.is_empty() {
        return Ok(());
    }

    let _guard = lock.lock_exclusive()?;
    let mut file = OpenOptions::new().append(true).create(true).open(log_path)?;
    for record in records {
        let line = record.to_line()?;
        file.write_all(line.as_bytes())?;
        file.write_all(b"\n")?;
    }
    file.sync_all()?;
    Ok(())
}

/// Reads the log tail from `offset` under a shared lock.
///
/// Returns the raw bytes and the stat captured while the lock was held.
pub(crate) fn read_tail(lock: &LockFile, log_path: &Path, offset: u64) -> Result<(Vec<u8>, LogStat)> {
    use std::io::{Read, Seek, SeekFrom};

    let _guard = lock.lock_shared()?;
    let mut file = File::open(log_path)?;
    let stat = stat_from_metadata(&file.metadata()?);
    file.seek(SeekFrom::Start(offset))?;
    let mut data = Vec::new();
    file.read_to_end(&mut data)?;
    Ok((data, stat))
}
