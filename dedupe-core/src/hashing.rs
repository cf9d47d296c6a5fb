//! Text Normalizer & Hasher (component A).
//!
//! The content hash is the identity key for dedupe-by-textual-equality:
//! trivial whitespace, case, and punctuation variants must collide.
//! Semantic paraphrases must not collide — that's the embedding's job.

use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};

/// Matches anything that is neither a Unicode word character nor
/// whitespace. `regex`'s `\w` is Unicode-aware by default, so accented
/// letters and non-Latin scripts survive; only punctuation/symbols go.
static NON_WORD_NON_SPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s]").expect("static normalization regex is valid"));

/// Normalize text for content identity:
/// 1. lowercase (Unicode-aware)
/// 2. strip punctuation/symbols (Unicode-aware, keeps word chars + whitespace)
/// 3. collapse whitespace runs to a single ASCII space, trimmed
pub fn normalize_text(text: &str) -> String {
    let lowered = text.to_lowercase();
    let stripped = NON_WORD_NON_SPACE.replace_all(&lowered, "");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// SHA-256 of the normalized text, as lowercase hex.
pub fn content_hash(text: &str) -> String {
    let normalized = normalize_text(text);
    let digest = Sha256::digest(normalized.as_bytes());
    hex::encode(digest)
}
