//! Content hashing utility for deduplication.
//!
//! This module provides SHA256-based content hashing for exact match detection.
//! Unlike the SimHash fingerprint, the hash is taken over the exact text: two
//! documents that differ by a single space hash differently.

use sha2::{Digest, Sha256};

/// Content hasher for deduplication.
///
/// # Example
///
/// ```rust
/// use simdup::services::deduplication::ContentHasher;
///
/// let hash = ContentHasher::hash("季度报告");
/// assert_eq!(hash.len(), 64); // SHA256 produces 64 hex chars
///
/// // No normalization: whitespace changes the hash
/// assert_ne!(hash, ContentHasher::hash(" 季度报告"));
/// ```
pub struct ContentHasher;

impl ContentHasher {
    /// Computes the SHA256 hash of the content.
    ///
    /// # Returns
    ///
    /// The lowercase hex-encoded SHA256 hash (64 characters).
    #[must_use]
    pub fn hash(content: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_produces_64_char_hex() {
        let hash = ContentHasher::hash("test content");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_known_vector() {
        assert_eq!(
            ContentHasher::hash("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_same_content_same_hash() {
        let hash1 = ContentHasher::hash("这是一段测试文本");
        let hash2 = ContentHasher::hash("这是一段测试文本");
        assert_eq!(hash1, hash2);
    }

    #[test]
    fn test_exact_text_is_hashed() {
        let base = ContentHasher::hash("Use PostgreSQL");
        assert_ne!(base, ContentHasher::hash("use postgresql"));
        assert_ne!(base, ContentHasher::hash("  Use PostgreSQL  "));
        assert_ne!(base, ContentHasher::hash("Use\tPostgreSQL"));
    }

    #[test]
    fn test_empty_content() {
        let hash = ContentHasher::hash("");
        assert_eq!(
            hash,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
