//! Output formatting helpers for the `tissue` CLI.
//!
//! Read commands render either pretty-printed JSON (`--json`) or aligned
//! plain-text tables; timestamps are epoch milliseconds internally and
//! humanized only here.

use std::io::{self, Write};

use serde::Serialize;

use tissue_core::issue::Issue;

/// Print a value as pretty-printed JSON to stdout.
///
/// Terminates the process with exit code 1 if serialization fails.
pub fn output_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            // Ignore broken pipe errors (e.g., piped to `head`).
            let _ = writeln!(handle, "{}", json);
        }
        Err(e) => {
            eprintln!("Error: failed to serialize JSON: {}", e);
            std::process::exit(1);
        }
    }
}

/// Print a simple aligned table with headers and rows.
pub fn output_table(headers: &[&str], rows: &[Vec<String>]) {
    if rows.is_empty() {
        return;
    }

    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.len());
            }
        }
    }

    let stdout = io::stdout();
    let mut handle = stdout.lock();

    for (i, header) in headers.iter().enumerate() {
        if i > 0 {
            let _ = write!(handle, "  ");
        }
        let _ = write!(handle, "{:<width$}", header, width = widths[i]);
    }
    let _ = writeln!(handle);

    for (i, width) in widths.iter().enumerate() {
        if i > 0 {
            let _ = write!(handle, "  ");
        }
        let _ = write!(handle, "{}", "-".repeat(*width));
    }
    let _ = writeln!(handle);

    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i > 0 {
                let _ = write!(handle, "  ");
            }
            if i < widths.len() {
                let _ = write!(handle, "{:<width$}", cell, width = widths[i]);
            } else {
                let _ = write!(handle, "{}", cell);
            }
        }
        let _ = writeln!(handle);
    }
}

/// Renders epoch milliseconds as `YYYY-MM-DD HH:MM` UTC.
pub fn format_ms(ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(ms)
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ms.to_string())
}

/// Columns for issue list output.
pub fn issue_row(issue: &Issue) -> Vec<String> {
    vec![
        issue.id.clone(),
        format!("P{}", issue.priority),
        issue.status.to_string(),
        format_ms(issue.updated_at),
        issue.title.clone(),
        issue.tags.join(","),
    ]
}

/// Headers matching [`issue_row`].
pub const ISSUE_HEADERS: &[&str] = &["ID", "PRI", "STATUS", "UPDATED", "TITLE", "TAGS"];

/// Prints a list of issues as a table, or a placeholder when empty.
pub fn print_issue_table(issues: &[Issue]) {
    if issues.is_empty() {
        println!("No issues.");
        return;
    }
    let rows: Vec<Vec<String>> = issues.iter().map(issue_row).collect();
    output_table(ISSUE_HEADERS, &rows);
}
