use lazy_static::lazy_static;
use regex::Regex;
use sha2::{Digest, Sha256};

pub const HASH_LENGTH: usize = 16;

lazy_static! {
    static ref NON_WORD: Regex = Regex::new(r"[^\p{L}\p{N}\s]+").expect("Failed to create punctuation regex");
    static ref WHITESPACE: Regex = Regex::new(r"\s+").expect("Failed to create whitespace regex");
}

/// Lowercases, turns punctuation into spaces and collapses whitespace.
pub fn normalize(value: &str) -> String {
    let lowercase = value.to_lowercase();
    let without_punctuation = NON_WORD.replace_all(&lowercase, " ");

    WHITESPACE
        .replace_all(without_punctuation.trim(), " ")
        .to_string()
}

/// Hex SHA-256 of the input, truncated to [`HASH_LENGTH`] characters.
pub fn stable_hash(value: &str) -> String {
    let digest = Sha256::digest(value.as_bytes());
    let mut encoded = hex::encode(digest);

    encoded.truncate(HASH_LENGTH);
    encoded
}
