//! Identity hash: maps a display name to a stable file-name suffix.
//!
//! XXH3-128 is fast and non-cryptographic.  It only keeps display names
//! out of file names; no security property depends on it.

use xxhash_rust::xxh3::xxh3_128;

/// Length of the hex-encoded identity hash.
pub const IDENTITY_HASH_LEN: usize = 32;

/// Hash `name` to 32 lowercase hex characters (big-endian digest).
pub fn identity_hash(name: &str) -> String {
    format!("{:032x}", xxh3_128(name.as_bytes()))
}

/// Returns `true` if `s` looks like an identity hash.
pub fn is_identity_hash(s: &str) -> bool {
    s.len() == IDENTITY_HASH_LEN && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_32_lowercase_hex_chars() {
        let hash = identity_hash("Card A");
        assert!(is_identity_hash(&hash), "{hash}");
    }

    #[test]
    fn hash_is_deterministic() {
        assert_eq!(identity_hash("Card A"), identity_hash("Card A"));
    }

    #[test]
    fn different_names_different_hashes() {
        assert_ne!(identity_hash("Card A"), identity_hash("Card B"));
        assert_ne!(identity_hash(""), identity_hash(" "));
    }

    #[test]
    fn is_identity_hash_rejects_other_strings() {
        assert!(!is_identity_hash("../../etc/passwd"));
        assert!(!is_identity_hash(&"A".repeat(32)));
        assert!(!is_identity_hash(&"a".repeat(31)));
    }
}
