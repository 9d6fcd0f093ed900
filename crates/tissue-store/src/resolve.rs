//! Id lookup resolution: exact match, unique prefix, hash suffix.

use rusqlite::{Connection, params};

use crate::error::{Result, StoreError};
use crate::issues;
use crate::store::Store;

impl Store {
    /// Resolves user input to a full issue id.
    ///
    /// Tries, in order: (a) exact match, (b) unique prefix match, (c) for
    /// input without a `-`, unique hash-suffix match. More than one match is
    /// ambiguous; input outside `[A-Za-z0-9.-]` is rejected outright.
    pub fn resolve_id(&self, input: &str) -> Result<String> {
        resolve_on_conn(&self.conn, input)
    }
}

pub(crate) fn resolve_on_conn(conn: &Connection, input: &str) -> Result<String> {
    if input.is_empty() || !input.chars().all(is_lookup_char) {
        return Err(StoreError::InvalidIdPrefix {
            input: input.to_owned(),
        });
    }

    // (a) Exact.
    if issues::issue_exists(conn, input)? {
        return Ok(input.to_owned());
    }

    // (b) Unique prefix. Input cannot contain LIKE wildcards, so no escaping.
    let matches = collect_ids(
        conn,
        "SELECT id FROM issues WHERE id LIKE ?1 || '%' ORDER BY id LIMIT 5",
        input,
    )?;
    match matches.len() {
        1 => return Ok(matches.into_iter().next().unwrap_or_default()),
        n if n > 1 => {
            return Err(StoreError::IssueIdAmbiguous {
                input: input.to_owned(),
                matches,
            });
        }
        _ => {}
    }

    // (c) Hash suffix, only for input that names no prefix.
    if !input.contains('-') {
        let folded = input.to_ascii_lowercase();
        let candidates = collect_ids(
            conn,
            "SELECT id FROM issues WHERE id LIKE '%-' || ?1 || '%' ORDER BY id",
            input,
        )?;
        let verified: Vec<String> = candidates
            .into_iter()
            .filter(|id| {
                id.rsplit_once('-')
                    .is_some_and(|(_, hash)| hash.starts_with(&folded))
            })
            .collect();
        match verified.len() {
            1 => return Ok(verified.into_iter().next().unwrap_or_default()),
            n if n > 1 => {
                return Err(StoreError::IssueIdAmbiguous {
                    input: input.to_owned(),
                    matches: verified,
                });
            }
            _ => {}
        }
    }

    Err(StoreError::IssueNotFound {
        input: input.to_owned(),
    })
}

fn is_lookup_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '.' || c == '-'
}

fn collect_ids(conn: &Connection, sql: &str, input: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params![input], |row| row.get(0))?;
    let mut ids = Vec::new();
    for row in rows {
        ids.push(row?);
    }
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema;
    use tissue_core::enums::Status;
    use tissue_core::issue::Issue;

    fn conn_with(ids: &[&str]) -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        for stmt in schema::SCHEMA_STATEMENTS {
            conn.execute_batch(stmt).unwrap();
        }
        for stmt in schema::FTS_STATEMENTS {
            conn.execute_batch(stmt).unwrap();
        }
        for id in ids {
            issues::upsert_issue(
                &conn,
                &Issue {
                    id: (*id).into(),
                    rev: "01A".into(),
                    title: "x".into(),
                    body: String::new(),
                    status: Status::Open,
                    priority: 2,
                    tags: vec![],
                    created_at: 1,
                    updated_at: 1,
                },
            )
            .unwrap();
        }
        conn
    }

    #[test]
    fn exact_match_wins() {
        let conn = conn_with(&["acme-0a1b2c3d", "acme-0a1b2c3e"]);
        assert_eq!(resolve_on_conn(&conn, "acme-0a1b2c3d").unwrap(), "acme-0a1b2c3d");
    }

    #[test]
    fn unique_prefix_resolves() {
        let conn = conn_with(&["acme-0a1b2c3d", "acme-9z8y7x6w"]);
        assert_eq!(resolve_on_conn(&conn, "acme-0a").unwrap(), "acme-0a1b2c3d");
    }

    #[test]
    fn ambiguous_prefix_errors() {
        let conn = conn_with(&["acme-0a1b2c3d", "acme-0a1b9999"]);
        let err = resolve_on_conn(&conn, "acme-0a").unwrap_err();
        assert!(matches!(err, StoreError::IssueIdAmbiguous { .. }));
    }

    #[test]
    fn hash_suffix_resolves_without_dash() {
        let conn = conn_with(&["acme-0a1b2c3d", "acme-9z8y7x6w"]);
        assert_eq!(resolve_on_conn(&conn, "9z8y").unwrap(), "acme-9z8y7x6w");
        // Case-folded.
        assert_eq!(resolve_on_conn(&conn, "9Z8Y").unwrap(), "acme-9z8y7x6w");
    }

    #[test]
    fn input_with_dash_never_tries_suffix() {
        // "0a1b" would match as a hash suffix, but "x-0a1b" names a prefix
        // that matches nothing.
        let conn = conn_with(&["acme-0a1b2c3d"]);
        let err = resolve_on_conn(&conn, "x-0a1b").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn suffix_verification_requires_hash_start() {
        // "1b2c" appears inside the hash but not at its start.
        let conn = conn_with(&["acme-0a1b2c3d"]);
        let err = resolve_on_conn(&conn, "1b2c").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn invalid_characters_rejected() {
        let conn = conn_with(&["acme-0a1b2c3d"]);
        for bad in ["a b", "a%b", "a_b", "", "caf\u{e9}"] {
            let err = resolve_on_conn(&conn, bad).unwrap_err();
            assert!(
                matches!(err, StoreError::InvalidIdPrefix { .. }),
                "input {bad:?}"
            );
        }
    }

    #[test]
    fn no_match_is_not_found() {
        let conn = conn_with(&["acme-0a1b2c3d"]);
        let err = resolve_on_conn(&conn, "zzzz").unwrap_err();
        assert!(err.is_not_found());
    }
}
