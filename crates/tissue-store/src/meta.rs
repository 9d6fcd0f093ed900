//! Key/value metadata and the importer watermark.

use rusqlite::{Connection, OptionalExtension, params};

use crate::error::Result;

/// The project prefix used when minting issue ids.
pub(crate) const KEY_ID_PREFIX: &str = "id_prefix";
/// Cache schema version.
pub(crate) const KEY_SCHEMA_VERSION: &str = "schema_version";

const KEY_JSONL_OFFSET: &str = "jsonl_offset";
const KEY_JSONL_INODE: &str = "jsonl_inode";
const KEY_JSONL_MTIME: &str = "jsonl_mtime";

/// Reads a metadata value.
pub(crate) fn get_meta(conn: &Connection, key: &str) -> Result<Option<String>> {
    let value = conn
        .query_row("SELECT value FROM meta WHERE key = ?1", params![key], |row| {
            row.get(0)
        })
        .optional()?;
    Ok(value)
}

/// Writes a metadata value, replacing any existing one.
pub(crate) fn set_meta(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO meta (key, value) VALUES (?1, ?2)",
        params![key, value],
    )?;
    Ok(())
}

/// How far the importer has consumed the log: the byte offset through which
/// records have been applied and the file identity captured at that point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Watermark {
    pub offset: u64,
    pub inode: u64,
    pub mtime_ms: i64,
}

/// Loads the watermark; `None` until the first import completes.
pub(crate) fn load_watermark(conn: &Connection) -> Result<Option<Watermark>> {
    let offset = get_meta(conn, KEY_JSONL_OFFSET)?;
    let inode = get_meta(conn, KEY_JSONL_INODE)?;
    let mtime = get_meta(conn, KEY_JSONL_MTIME)?;

    match (offset, inode, mtime) {
        (Some(offset), Some(inode), Some(mtime)) => {
            // Unparseable watermark values force a full reimport by reading
            // as absent.
            let parsed = (
                offset.parse::<u64>(),
                inode.parse::<u64>(),
                mtime.parse::<i64>(),
            );
            if let (Ok(offset), Ok(inode), Ok(mtime_ms)) = parsed {
                Ok(Some(Watermark {
                    offset,
                    inode,
                    mtime_ms,
                }))
            } else {
                Ok(None)
            }
        }
        _ => Ok(None),
    }
}

/// Persists the watermark.
pub(crate) fn store_watermark(conn: &Connection, watermark: &Watermark) -> Result<()> {
    set_meta(conn, KEY_JSONL_OFFSET, &watermark.offset.to_string())?;
    set_meta(conn, KEY_JSONL_INODE, &watermark.inode.to_string())?;
    set_meta(conn, KEY_JSONL_MTIME, &watermark.mtime_ms.to_string())?;
    Ok(())
}
