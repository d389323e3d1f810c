//! Golden value tests for SimHash fingerprints.
//!
//! Pins fingerprints and distances for fixed inputs so that any change to
//! tokenization, token hashing or bit accumulation shows up as a failure.
//! Stored fingerprints from earlier runs are only comparable while these hold.

#![allow(clippy::unwrap_used, clippy::float_cmp)]

use simdup::simhash::{SimHashEngine, hamming_distance, similarity, similarity_to_distance};

const T1: &str = "这是一段测试文本，用于计算 SimHash 值。";
const T2: &str = "这是一段测试文本，用于计算 SimHash 数值。";
const T3: &str = "完全不同的内容，没有任何相似之处。";

// ============================================================================
// Fingerprint values
// ============================================================================

#[test]
fn test_golden_fingerprint_t1() {
    assert_eq!(SimHashEngine::new().fingerprint(T1), 15_035_504_157_385_505_538);
}

#[test]
fn test_golden_token_count_t1() {
    assert_eq!(SimHashEngine::new().tokenize(T1).len(), 29);
}

#[test]
fn test_golden_tokens_simple_segment() {
    let tokens = SimHashEngine::new().tokenize("abcd, ab");
    assert_eq!(tokens, vec!["ab", "bc", "cd", "abc", "bcd"]);
}

#[test]
fn test_golden_token_hash_is_sha256_prefix() {
    // SHA-256("ab") = fb8e20fc2e4c3f248c60c39bd652f3c1347298bb977b8b4d5903b85055620603
    assert_eq!(SimHashEngine::new().hash_token("ab"), 0xfb8e_20fc_2e4c_3f24);
}

// ============================================================================
// Distances
// ============================================================================

#[test]
fn test_golden_near_duplicate_distance() {
    let engine = SimHashEngine::new();
    let (a, b) = (engine.fingerprint(T1), engine.fingerprint(T2));

    assert_eq!(hamming_distance(a, b), 7);
    assert_eq!(similarity(a, b), 0.890_625);
    assert!(hamming_distance(a, b) <= u32::from(similarity_to_distance(0.85)));
    assert!(hamming_distance(a, b) > u32::from(similarity_to_distance(0.90)));
}

#[test]
fn test_golden_unrelated_distance() {
    let engine = SimHashEngine::new();
    let (a, c) = (engine.fingerprint(T1), engine.fingerprint(T3));

    assert_eq!(hamming_distance(a, c), 32);
    assert_eq!(similarity(a, c), 0.5);
}

#[test]
fn test_golden_empty_inputs() {
    let engine = SimHashEngine::new();
    assert_eq!(engine.fingerprint(""), 0);
    assert_eq!(engine.fingerprint(" \t\n "), 0);
    assert_eq!(engine.fingerprint("，。！"), 0);
    assert_eq!(engine.fingerprint("a"), 0);
}
