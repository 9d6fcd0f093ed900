//! SHA256 + base36 issue id minting.

use sha2::{Digest, Sha256};

/// Base36 alphabet (0-9, a-z).
const BASE36_ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Length of the hash portion of an issue id.
pub const HASH_LEN: usize = 8;

/// Leading digest bytes consumed: 5 bytes = 40 bits, which always fits in
/// 8 base36 chars (36^8 > 2^40).
const HASH_BYTES: usize = 5;

/// Number of nonces tried before giving up on a unique id.
pub const MAX_MINT_ATTEMPTS: u32 = 10;

/// Computes the 8-char base36 hash suffix for an issue.
///
/// Hashes `title | "|" | body | "|" | decimal(created_at) | "|" |
/// decimal(nonce)` with SHA-256 and encodes the leading 40 bits.
pub fn hash_suffix(title: &str, body: &str, created_at: i64, nonce: u32) -> String {
    let content = format!("{title}|{body}|{created_at}|{nonce}");
    let digest = Sha256::digest(content.as_bytes());

    let mut value: u64 = 0;
    for byte in &digest[..HASH_BYTES] {
        value = (value << 8) | u64::from(*byte);
    }

    encode_base36(value, HASH_LEN)
}

/// Builds a full issue id: `prefix + "-" + hash`.
pub fn mint_issue_id(prefix: &str, title: &str, body: &str, created_at: i64, nonce: u32) -> String {
    format!("{prefix}-{}", hash_suffix(title, body, created_at, nonce))
}

/// Renders `value` into exactly `length` base36 chars, zero-padded.
fn encode_base36(mut value: u64, length: usize) -> String {
    let mut buf = vec![b'0'; length];
    for slot in buf.iter_mut().rev() {
        *slot = BASE36_ALPHABET[(value % 36) as usize];
        value /= 36;
    }
    String::from_utf8(buf).expect("base36 chars are valid UTF-8")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffix_shape() {
        let suffix = hash_suffix("Fix flake", "", 1_700_000_000_000, 0);
        assert_eq!(suffix.len(), HASH_LEN);
        assert!(suffix.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn deterministic_for_same_inputs() {
        let a = hash_suffix("Title", "Body", 12345, 0);
        let b = hash_suffix("Title", "Body", 12345, 0);
        assert_eq!(a, b);
    }

    #[test]
    fn nonce_changes_output() {
        let a = hash_suffix("Title", "Body", 12345, 0);
        let b = hash_suffix("Title", "Body", 12345, 1);
        assert_ne!(a, b);
    }

    #[test]
    fn mint_formats_full_id() {
        let id = mint_issue_id("acme", "Fix flake", "", 1_700_000_000_000, 0);
        assert!(id.starts_with("acme-"));
        assert_eq!(id.len(), "acme-".len() + HASH_LEN);
    }

    #[test]
    fn encode_base36_pads_and_caps() {
        assert_eq!(encode_base36(0, 8), "00000000");
        assert_eq!(encode_base36(35, 4), "000z");
        assert_eq!(encode_base36(36, 4), "0010");
        // Max 40-bit value still fits in 8 chars.
        let max = encode_base36((1u64 << 40) - 1, 8);
        assert_eq!(max.len(), 8);
    }
}
