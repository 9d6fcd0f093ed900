//! Project prefix normalization.
//!
//! The prefix is the part of an issue id before the dash. It comes either
//! from an explicit `--prefix` or from the basename of the store directory's
//! parent, so it has to be scrubbed into something id-safe.

/// Maximum length of a normalized prefix.
pub const MAX_PREFIX_LEN: usize = 32;

/// Prefix used when no usable source exists.
pub const FALLBACK_PREFIX: &str = "tissue";

/// Normalizes an arbitrary string into an id prefix.
///
/// Lowercases ASCII letters, keeps letters and digits, maps every run of
/// other runes to a single `-`, strips leading/trailing dashes, truncates to
/// [`MAX_PREFIX_LEN`], and strips trailing dashes again. Returns `None` when
/// nothing survives.
pub fn normalize_prefix(raw: &str) -> Option<String> {
    let mut out = String::with_capacity(raw.len().min(MAX_PREFIX_LEN));
    let mut pending_dash = false;

    for c in raw.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    out.truncate(MAX_PREFIX_LEN);
    while out.ends_with('-') {
        out.pop();
    }

    if out.is_empty() { None } else { Some(out) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_keeps_alnum() {
        assert_eq!(normalize_prefix("Acme").as_deref(), Some("acme"));
        assert_eq!(normalize_prefix("proj42").as_deref(), Some("proj42"));
    }

    #[test]
    fn collapses_separator_runs() {
        assert_eq!(normalize_prefix("my_cool.project").as_deref(), Some("my-cool-project"));
        assert_eq!(normalize_prefix("a -- b__c").as_deref(), Some("a-b-c"));
    }

    #[test]
    fn strips_leading_and_trailing_separators() {
        assert_eq!(normalize_prefix("--acme--").as_deref(), Some("acme"));
        assert_eq!(normalize_prefix(".hidden").as_deref(), Some("hidden"));
    }

    #[test]
    fn non_ascii_letters_are_separators() {
        assert_eq!(normalize_prefix("caf\u{e9}-app").as_deref(), Some("caf-app"));
    }

    #[test]
    fn truncates_then_strips_again() {
        // 31 chars + separator + more: truncation lands on the dash.
        let raw = format!("{}-tail", "a".repeat(31));
        assert_eq!(normalize_prefix(&raw).as_deref(), Some("a".repeat(31).as_str()));

        let long = "b".repeat(64);
        assert_eq!(normalize_prefix(&long).as_deref(), Some("b".repeat(32).as_str()));
    }

    #[test]
    fn empty_results_are_none() {
        assert_eq!(normalize_prefix(""), None);
        assert_eq!(normalize_prefix("---"), None);
        assert_eq!(normalize_prefix("\u{3053}\u{3093}"), None);
    }
}
