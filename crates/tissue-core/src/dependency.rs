//! Dependency edges between issues.

use serde::{Deserialize, Serialize};

use crate::enums::{DepKind, DepState};

/// A dependency edge. The primary key is `(src_id, dst_id, kind)`.
///
/// `blocks` and `parent` are directional and stored as supplied; `relates`
/// pairs are canonicalized to ascending id order so the two argument orders
/// name the same edge. Removal writes a tombstone (`state = removed`), never
/// a physical delete. Field order matches the wire format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dep {
    pub src_id: String,
    pub dst_id: String,
    #[serde(default)]
    pub kind: DepKind,
    #[serde(default)]
    pub state: DepState,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    pub rev: String,
}

impl Dep {
    /// Swaps the endpoints of a `relates` edge into ascending byte order.
    /// Directional kinds are left untouched.
    pub fn canonicalize(&mut self) {
        if !self.kind.is_directional() && self.src_id > self.dst_id {
            std::mem::swap(&mut self.src_id, &mut self.dst_id);
        }
    }

    /// Returns the canonical `(src, dst)` pair for the given endpoints and kind.
    pub fn canonical_pair(src_id: &str, dst_id: &str, kind: &DepKind) -> (String, String) {
        if !kind.is_directional() && src_id > dst_id {
            (dst_id.to_owned(), src_id.to_owned())
        } else {
            (src_id.to_owned(), dst_id.to_owned())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dep(src: &str, dst: &str, kind: DepKind) -> Dep {
        Dep {
            src_id: src.into(),
            dst_id: dst.into(),
            kind,
            state: DepState::Active,
            created_at: 0,
            rev: "01J8ZC2M7N8Q9R0S1T2V3W4X5Y".into(),
        }
    }

    #[test]
    fn relates_canonicalizes_to_ascending_order() {
        let mut d = dep("t-zzzzzzzz", "t-aaaaaaaa", DepKind::Relates);
        d.canonicalize();
        assert_eq!(d.src_id, "t-aaaaaaaa");
        assert_eq!(d.dst_id, "t-zzzzzzzz");
    }

    #[test]
    fn blocks_keeps_supplied_order() {
        let mut d = dep("t-zzzzzzzz", "t-aaaaaaaa", DepKind::Blocks);
        d.canonicalize();
        assert_eq!(d.src_id, "t-zzzzzzzz");
        assert_eq!(d.dst_id, "t-aaaaaaaa");
    }

    #[test]
    fn canonical_pair_matches_canonicalize() {
        let (src, dst) = Dep::canonical_pair("t-b", "t-a", &DepKind::Relates);
        assert_eq!((src.as_str(), dst.as_str()), ("t-a", "t-b"));

        let (src, dst) = Dep::canonical_pair("t-b", "t-a", &DepKind::Parent);
        assert_eq!((src.as_str(), dst.as_str()), ("t-b", "t-a"));
    }
}
