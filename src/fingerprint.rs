//! Content fingerprints.
//!
//! Two digests are derived for every intercept:
//!
//! - [`content_digest`] over the raw block text, stored as `src_hash` for
//!   auditing;
//! - [`record_id`] over the logical content, used as the primary key so that
//!   re-importing an overlapping export is a no-op.
//!
//! Addressee lines feed `src_hash` but not `id`.

use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of the exact raw block text.
pub fn content_digest(raw_block_text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw_block_text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Deterministic identity key of an intercept.
///
/// The frequency is rendered with exactly six decimals and the body is
/// represented by its own digest, which keeps the hashed key small.
pub fn record_id(
    chat_id: &str,
    date: &str,
    time: &str,
    freq_mhz: f64,
    who: &str,
    komu: &str,
    body_full: &str,
) -> String {
    let body_hash = content_digest(body_full);
    let key = format!(
        "{}|{}|{}|{:.6}|{}|{}|{}",
        chat_id, date, time, freq_mhz, who, komu, body_hash
    );
    content_digest(&key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_digest_known_value() {
        assert_eq!(
            content_digest(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_record_id_deterministic() {
        let a = record_id("chat", "2024-03-05", "14:22:10", 145.95, "A", "B", "body");
        let b = record_id("chat", "2024-03-05", "14:22:10", 145.95, "A", "B", "body");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_record_id_sensitive_to_chat() {
        let a = record_id("alpha", "2024-03-05", "14:22:10", 145.95, "A", "B", "body");
        let b = record_id("bravo", "2024-03-05", "14:22:10", 145.95, "A", "B", "body");
        assert_ne!(a, b);
    }

    #[test]
    fn test_record_id_sensitive_to_body() {
        let a = record_id("chat", "2024-03-05", "14:22:10", 145.95, "A", "B", "one");
        let b = record_id("chat", "2024-03-05", "14:22:10", 145.95, "A", "B", "two");
        assert_ne!(a, b);
    }

    #[test]
    fn test_record_id_frequency_six_decimals() {
        // Differences below the sixth decimal collapse to the same key.
        let a = record_id("chat", "2024-03-05", "14:22:10", 145.95, "A", "B", "x");
        let b = record_id("chat", "2024-03-05", "14:22:10", 145.950_000_1, "A", "B", "x");
        let c = record_id("chat", "2024-03-05", "14:22:10", 145.951, "A", "B", "x");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
