//! Dependency row helpers.

use rusqlite::{Connection, OptionalExtension, Row, params};

use tissue_core::dependency::Dep;
use tissue_core::enums::{DepKind, DepState};

use crate::error::Result;

pub(crate) const DEP_COLUMNS: &str = "src_id, dst_id, kind, state, created_at, rev";

/// Deserializes a row into a [`Dep`]. Column order must match [`DEP_COLUMNS`].
pub(crate) fn scan_dep(row: &Row<'_>) -> rusqlite::Result<Dep> {
    Ok(Dep {
        src_id: row.get(0)?,
        dst_id: row.get(1)?,
        kind: DepKind::from(row.get::<_, String>(2)?),
        state: DepState::from(row.get::<_, String>(3)?),
        created_at: row.get(4)?,
        rev: row.get(5)?,
    })
}

/// Inserts or fully replaces a dependency on its composite primary key.
///
/// Write-path helper; the record has already won any conflict it needed to.
pub(crate) fn put_dep(conn: &Connection, dep: &Dep) -> Result<()> {
    conn.execute(
        "INSERT INTO deps (src_id, dst_id, kind, state, created_at, rev)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(src_id, dst_id, kind) DO UPDATE SET
             state = excluded.state,
             created_at = excluded.created_at,
             rev = excluded.rev",
        params![
            dep.src_id,
            dep.dst_id,
            dep.kind.as_str(),
            dep.state.as_str(),
            dep.created_at,
            dep.rev,
        ],
    )?;
    Ok(())
}

/// Returns the stored rev for a dependency key, if present.
pub(crate) fn get_dep_rev(
    conn: &Connection,
    src_id: &str,
    dst_id: &str,
    kind: &DepKind,
) -> Result<Option<String>> {
    let rev = conn
        .query_row(
            "SELECT rev FROM deps WHERE src_id = ?1 AND dst_id = ?2 AND kind = ?3",
            params![src_id, dst_id, kind.as_str()],
            |row| row.get(0),
        )
        .optional()?;
    Ok(rev)
}

/// Fetches a dependency by its composite key.
pub(crate) fn get_dep(
    conn: &Connection,
    src_id: &str,
    dst_id: &str,
    kind: &DepKind,
) -> Result<Option<Dep>> {
    let dep = conn
        .query_row(
            &format!("SELECT {DEP_COLUMNS} FROM deps WHERE src_id = ?1 AND dst_id = ?2 AND kind = ?3"),
            params![src_id, dst_id, kind.as_str()],
            scan_dep,
        )
        .optional()?;
    Ok(dep)
}

/// Returns all active deps where the issue is either endpoint, ordered by
/// kind then creation time.
pub(crate) fn deps_for_issue(conn: &Connection, issue_id: &str) -> Result<Vec<Dep>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {DEP_COLUMNS} FROM deps
         WHERE state = 'active' AND (src_id = ?1 OR dst_id = ?1)
         ORDER BY kind, created_at"
    ))?;
    let rows = stmt.query_map(params![issue_id], scan_dep)?;
    let mut deps = Vec::new();
    for row in rows {
        deps.push(row?);
    }
    Ok(deps)
}
