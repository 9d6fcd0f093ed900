//! String-backed enum types for the tissue system.
//!
//! Each enum serializes as its snake_case string and deserializes unknown
//! values into a `Custom(String)` fallback. The fallback is what lets the
//! importer persist records written by a newer version of the software
//! verbatim, while the write path rejects anything non-builtin.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

// ---------------------------------------------------------------------------
// Macro: defines an enum with known string variants + a Custom(String) fallback.
// ---------------------------------------------------------------------------
macro_rules! define_enum {
    (
        $(#[$meta:meta])*
        $name:ident, default = $default:ident,
        variants: [
            $( ($variant:ident, $str:expr) ),+ $(,)?
        ]
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $variant, )+
            Custom(String),
        }

        impl $name {
            /// Returns the string representation.
            pub fn as_str(&self) -> &str {
                match self {
                    $( Self::$variant => $str, )+
                    Self::Custom(s) => s.as_str(),
                }
            }

            /// Returns `true` if this is a built-in (non-custom) variant.
            pub fn is_builtin(&self) -> bool {
                !matches!(self, Self::Custom(_))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::$default
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Ok(Self::from(s))
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                match s {
                    $( $str => Self::$variant, )+
                    other => Self::Custom(other.to_owned()),
                }
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                // Check known variants first to avoid allocation in common case.
                match s.as_str() {
                    $( $str => Self::$variant, )+
                    _ => Self::Custom(s),
                }
            }
        }
    };
}

// ===========================================================================
// Status
// ===========================================================================

define_enum! {
    /// Current state of an issue.
    Status, default = Open,
    variants: [
        (Open, "open"),
        (InProgress, "in_progress"),
        (Paused, "paused"),
        (Duplicate, "duplicate"),
        (Closed, "closed"),
    ]
}

impl Status {
    /// Returns `true` for statuses that can block other issues.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Open | Self::InProgress | Self::Paused)
    }

    /// Returns `true` for statuses eligible for `clean`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed | Self::Duplicate)
    }
}

// ===========================================================================
// DepKind
// ===========================================================================

define_enum! {
    /// Relationship type between issues.
    DepKind, default = Blocks,
    variants: [
        (Blocks, "blocks"),
        (Parent, "parent"),
        (Relates, "relates"),
    ]
}

impl DepKind {
    /// Returns `true` for kinds stored as supplied; `relates` pairs are
    /// canonicalized to ascending id order instead.
    pub fn is_directional(&self) -> bool {
        !matches!(self, Self::Relates)
    }
}

// ===========================================================================
// DepState
// ===========================================================================

define_enum! {
    /// Lifecycle state of a dependency edge. Removal is a tombstone, never a
    /// physical delete.
    DepState, default = Active,
    variants: [
        (Active, "active"),
        (Removed, "removed"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_default_is_open() {
        assert_eq!(Status::default(), Status::Open);
    }

    #[test]
    fn status_roundtrip_serde() {
        let s = Status::InProgress;
        let json = serde_json::to_string(&s).unwrap();
        assert_eq!(json, r#""in_progress""#);
        let back: Status = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }

    #[test]
    fn status_custom_roundtrip() {
        let json = r#""someday_maybe""#;
        let s: Status = serde_json::from_str(json).unwrap();
        assert_eq!(s, Status::Custom("someday_maybe".into()));
        assert!(!s.is_builtin());
        assert_eq!(serde_json::to_string(&s).unwrap(), json);
    }

    #[test]
    fn status_active_and_terminal_sets() {
        assert!(Status::Open.is_active());
        assert!(Status::InProgress.is_active());
        assert!(Status::Paused.is_active());
        assert!(!Status::Closed.is_active());
        assert!(!Status::Duplicate.is_active());

        assert!(Status::Closed.is_terminal());
        assert!(Status::Duplicate.is_terminal());
        assert!(!Status::Open.is_terminal());
        assert!(!Status::Custom("weird".into()).is_terminal());
    }

    #[test]
    fn dep_kind_directionality() {
        assert!(DepKind::Blocks.is_directional());
        assert!(DepKind::Parent.is_directional());
        assert!(!DepKind::Relates.is_directional());
    }

    #[test]
    fn dep_state_default() {
        assert_eq!(DepState::default(), DepState::Active);
        assert_eq!(DepState::Removed.as_str(), "removed");
    }
}
