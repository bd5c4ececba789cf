//! Text normalization and token-set similarity.
//!
//! Shared by the cache manager (key derivation, fuzzy lookup) and the
//! retrieval enhancer (diversity filtering), so both sides agree on what
//! "the same text" means.

use std::collections::HashSet;

/// Normalize text for key derivation: lowercase, strip punctuation,
/// collapse runs of whitespace to a single space, trim.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_was_space = true;
    for c in text.chars() {
        if c.is_alphanumeric() {
            for lc in c.to_lowercase() {
                out.push(lc);
            }
            last_was_space = false;
        } else if !last_was_space {
            out.push(' ');
            last_was_space = true;
        }
    }
    if out.ends_with(' ') {
        out.pop();
    }
    out
}

/// Tokenize into a lowercase token set, dropping single-character tokens.
pub fn token_set(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .map(str::to_lowercase)
        .filter(|w| w.len() > 1)
        .collect()
}

/// Token-set Jaccard similarity between two texts.
///
/// Two empty token sets are considered identical (1.0); one empty set
/// against a non-empty one scores 0.0.
pub fn token_jaccard(a: &str, b: &str) -> f32 {
    let sa = token_set(a);
    let sb = token_set(b);
    if sa.is_empty() && sb.is_empty() {
        return 1.0;
    }
    let intersection = sa.intersection(&sb).count();
    let union = sa.union(&sb).count();
    if union == 0 {
        0.0
    } else {
        intersection as f32 / union as f32
    }
}
