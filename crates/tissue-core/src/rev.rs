//! Revision tokens: lexicographically sortable, last-writer-wins keys.
//!
//! A token is a 26-char Crockford-base32 ULID: a 48-bit millisecond
//! timestamp in the high bits and 80 bits of randomness below it. Within a
//! process the generator is monotonic -- two tokens minted in the same
//! millisecond differ by an increment of the low 80 bits, so they sort
//! strictly ascending. Across processes ordering is timestamp-first, and
//! same-millisecond ties resolve by comparing the random suffixes, which is
//! deterministic on any replay.

use std::sync::{LazyLock, Mutex, PoisonError};

use ulid::{Generator, Ulid};

/// Length of an encoded revision token.
pub const REV_LEN: usize = 26;

static GENERATOR: LazyLock<Mutex<Generator>> = LazyLock::new(|| Mutex::new(Generator::new()));

/// Mints the next revision token for this process.
pub fn next_rev() -> String {
    let mut generator = GENERATOR.lock().unwrap_or_else(PoisonError::into_inner);
    match generator.generate() {
        Ok(ulid) => ulid.to_string(),
        // The monotonic counter can overflow within a single millisecond;
        // fall back to a fresh random token for that case.
        Err(_) => Ulid::new().to_string(),
    }
}

/// Extracts the millisecond timestamp a token was minted at.
pub fn rev_timestamp_ms(rev: &str) -> Option<i64> {
    let ulid = Ulid::from_string(rev).ok()?;
    i64::try_from(ulid.timestamp_ms()).ok()
}
