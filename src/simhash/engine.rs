//! SimHash engine.

use sha2::{Digest, Sha256};
use std::collections::HashSet;

/// Width of a fingerprint in bits.
pub const FINGERPRINT_BITS: u32 = 64;

/// Characters that split text into segments before n-gram extraction.
///
/// CJK and ASCII sentence terminators, commas, colons and semicolons.
/// Whitespace also splits segments.
pub const SEGMENT_DELIMITERS: &[char] = &[
    '，', '。', '！', '？', '；', '：', '、', ',', '.', '!', '?', ';', ':',
];

/// Computes 64-bit SimHash fingerprints.
///
/// Tokens are the contiguous 2- and 3-character substrings of each segment,
/// which keeps the scheme usable for languages without word boundaries.
///
/// # Example
///
/// ```rust
/// use simdup::simhash::{SimHashEngine, hamming_distance};
///
/// let engine = SimHashEngine::new();
/// let a = engine.fingerprint("这是一段测试文本，用于计算 SimHash 值。");
/// let b = engine.fingerprint("这是一段测试文本，用于计算 SimHash 数值。");
///
/// assert!(hamming_distance(a, b) < 10);
/// assert_eq!(engine.fingerprint(""), 0);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct SimHashEngine;

impl SimHashEngine {
    /// Creates a new engine.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Splits text into deduplicated character 2-grams and 3-grams.
    ///
    /// Whitespace runs are collapsed and the text trimmed, then the text is
    /// cut into segments on whitespace and [`SEGMENT_DELIMITERS`]. Each segment
    /// contributes all its 2-grams followed by all its 3-grams. Duplicate tokens
    /// keep their first occurrence only.
    ///
    /// # Example
    ///
    /// ```rust
    /// use simdup::simhash::SimHashEngine;
    ///
    /// let tokens = SimHashEngine::new().tokenize("abcd, ab");
    /// assert_eq!(tokens, vec!["ab", "bc", "cd", "abc", "bcd"]);
    /// ```
    #[must_use]
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");

        let mut seen = HashSet::new();
        let mut tokens = Vec::new();

        for segment in normalized.split(|c: char| c.is_whitespace() || SEGMENT_DELIMITERS.contains(&c))
        {
            if segment.is_empty() {
                continue;
            }

            let chars: Vec<char> = segment.chars().collect();
            let bigrams = chars.windows(2);
            let trigrams = chars.windows(3);

            for gram in bigrams.chain(trigrams) {
                let token: String = gram.iter().collect();
                if seen.insert(token.clone()) {
                    tokens.push(token);
                }
            }
        }

        tokens
    }

    /// Hashes a token to 64 bits.
    ///
    /// Takes the high 64 bits (first eight digest bytes, big-endian) of the
    /// SHA-256 digest of the token's UTF-8 bytes.
    #[must_use]
    pub fn hash_token(&self, token: &str) -> u64 {
        let digest = Sha256::digest(token.as_bytes());
        let mut high = [0u8; 8];
        high.copy_from_slice(&digest[..8]);
        u64::from_be_bytes(high)
    }

    /// Computes the SimHash fingerprint of `text`.
    ///
    /// Returns 0 for empty input or input that produces no tokens.
    #[must_use]
    pub fn fingerprint(&self, text: &str) -> u64 {
        let tokens = self.tokenize(text);
        if tokens.is_empty() {
            return 0;
        }

        let mut weights = [0i32; FINGERPRINT_BITS as usize];
        for token in &tokens {
            let hash = self.hash_token(token);
            for (bit, weight) in weights.iter_mut().enumerate() {
                if (hash >> bit) & 1 == 1 {
                    *weight += 1;
                } else {
                    *weight -= 1;
                }
            }
        }

        let fingerprint = weights
            .iter()
            .enumerate()
            .filter(|(_, weight)| **weight > 0)
            .fold(0u64, |acc, (bit, _)| acc | (1u64 << bit));

        tracing::debug!(
            text_length = text.chars().count(),
            token_count = tokens.len(),
            fingerprint = fingerprint,
            "Computed SimHash"
        );

        fingerprint
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simhash::{hamming_distance, is_similar, similarity};

    const T1: &str = "这是一段测试文本，用于计算 SimHash 值。";
    const T2: &str = "这是一段测试文本，用于计算 SimHash 数值。";
    const T3: &str = "完全不同的内容，没有任何相似之处。";

    #[test]
    fn test_tokenize_cjk_segments() {
        let tokens = SimHashEngine::new().tokenize(T1);

        assert_eq!(&tokens[..3], &["这是", "是一", "一段"]);
        assert!(tokens.contains(&"测试文".to_string()));
        assert!(tokens.contains(&"Sim".to_string()));
        // "值" is a single-character segment and yields nothing
        assert!(!tokens.iter().any(|t| t.contains('值')));
        // Delimiters never leak into tokens
        assert!(!tokens.iter().any(|t| t.contains('，') || t.contains(' ')));
        assert_eq!(tokens.len(), 29);
    }

    #[test]
    fn test_tokenize_deduplicates_preserving_order() {
        let tokens = SimHashEngine::new().tokenize("abab");
        assert_eq!(tokens, vec!["ab", "ba", "aba", "bab"]);
    }

    #[test]
    fn test_tokenize_collapses_whitespace() {
        let engine = SimHashEngine::new();
        assert_eq!(
            engine.tokenize("  hello \n\t world  "),
            engine.tokenize("hello world")
        );
    }

    #[test]
    fn test_tokenize_ascii_punctuation() {
        let tokens = SimHashEngine::new().tokenize("ab;cd.ef");
        assert_eq!(tokens, vec!["ab", "cd", "ef"]);
    }

    #[test]
    fn test_tokenize_empty_and_blank() {
        let engine = SimHashEngine::new();
        assert!(engine.tokenize("").is_empty());
        assert!(engine.tokenize("   \n ").is_empty());
        assert!(engine.tokenize("a，b。c").is_empty());
    }

    #[test]
    fn test_hash_token_is_sha256_prefix() {
        let engine = SimHashEngine::new();
        // SHA-256("abc") = ba7816bf8f01cfea...
        assert_eq!(engine.hash_token("abc"), 0xba78_16bf_8f01_cfea);
    }

    #[test]
    fn test_fingerprint_deterministic() {
        let engine = SimHashEngine::new();
        assert_eq!(engine.fingerprint(T1), engine.fingerprint(T1));
    }

    #[test]
    fn test_fingerprint_empty_is_zero() {
        let engine = SimHashEngine::new();
        assert_eq!(engine.fingerprint(""), 0);
        assert_eq!(engine.fingerprint("   "), 0);
        assert_eq!(engine.fingerprint("字"), 0);
    }

    #[test]
    fn test_fingerprint_ignores_whitespace_layout() {
        let engine = SimHashEngine::new();
        assert_eq!(
            engine.fingerprint("用于计算  SimHash\n值"),
            engine.fingerprint("用于计算 SimHash 值")
        );
    }

    #[test]
    fn test_near_duplicate_is_close() {
        let engine = SimHashEngine::new();
        let a = engine.fingerprint(T1);
        let b = engine.fingerprint(T2);

        assert!(hamming_distance(a, b) < 10);
        assert!(similarity(a, b) >= 0.85);
    }

    #[test]
    fn test_unrelated_text_is_far() {
        let engine = SimHashEngine::new();
        let a = engine.fingerprint(T1);
        let b = engine.fingerprint(T2);
        let c = engine.fingerprint(T3);

        assert!(similarity(a, c) < similarity(a, b));
        let (similar, _) = is_similar(a, c, 0.90);
        assert!(!similar);
    }
}
