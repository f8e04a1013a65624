//! Record ID generation.
//!
//! IDs have the form `<prefix>_<millis>_<suffix>`:
//! 1. `prefix` names the entity (`task`, `project`, ...)
//! 2. `millis` is the creation time in milliseconds, base 36
//! 3. `suffix` is 9 base-36 characters of per-process entropy
//!
//! An ID is assigned once at creation and never rewritten.

use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};

/// Mixed into every suffix so two IDs minted in the same nanosecond differ.
static SEQUENCE: AtomicU64 = AtomicU64::new(0);

const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Encode a number in lowercase base 36.
#[must_use]
pub fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(ALPHABET[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}

/// 9 pseudo-random base-36 characters.
#[allow(clippy::cast_possible_truncation)]
fn random_suffix() -> String {
    let mut hasher = RandomState::new().build_hasher();
    // Truncation is fine here, only the entropy matters.
    hasher.write_u64(
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_or(0, |d| d.as_nanos() as u64),
    );
    hasher.write_u64(SEQUENCE.fetch_add(1, Ordering::Relaxed));
    let mut hash = hasher.finish();

    let mut suffix = String::with_capacity(9);
    for _ in 0..9 {
        suffix.push(char::from(ALPHABET[(hash % 36) as usize]));
        hash /= 36;
    }
    suffix
}

/// Generate a new ID for an entity of the given kind.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn generate_id(prefix: &str) -> String {
    let millis = chrono::Utc::now().timestamp_millis().max(0) as u64;
    format!("{prefix}_{}_{}", to_base36(millis), random_suffix())
}
