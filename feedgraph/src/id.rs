use nanoid::nanoid;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::{FeedError, FeedResult};

/// Canonical alphabet for entity identifiers (no ambiguous glyphs).
const ENTITY_ID_ALPHABET: &[char] = &[
    'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'J', 'K', 'L', 'M', 'N', 'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y',
    'Z', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'j', 'm', 'n', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
];
/// Default entity id length.
const ENTITY_ID_LENGTH: usize = 20;

static ENTITY_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-HJ-NP-Za-hjmnp-z]{20}$").expect("entity id pattern compiles"));

/// Generates a new entity identifier using the configured alphabet and length.
pub fn generate_entity_id() -> String {
    nanoid!(ENTITY_ID_LENGTH, ENTITY_ID_ALPHABET)
}

/// Returns `true` when `candidate` has the shape of a generated identifier.
pub fn is_entity_id(candidate: &str) -> bool {
    ENTITY_ID_PATTERN.is_match(candidate)
}

/// Rejects malformed identifiers before they reach the store.
pub fn ensure_entity_id<'a>(field: &'static str, candidate: &'a str) -> FeedResult<&'a str> {
    if is_entity_id(candidate) {
        Ok(candidate)
    } else {
        Err(FeedError::invalid(format!("malformed {field} identifier: {candidate:?}")))
    }
}
