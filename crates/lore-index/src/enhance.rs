//! Pure post-retrieval enhancement functions.
//!
//! These operate on already-ranked chunk lists and never touch providers,
//! which keeps them trivially testable. The greedy pairwise diversity
//! filter is O(n²) but runs on capped candidate sets (~15-20 items).

use lore_core::text::token_jaccard;
use lore_core::RetrievedChunk;

/// Drop near-duplicate chunks while preserving rank order.
///
/// The top-ranked chunk is always kept. Each subsequent candidate is
/// admitted only if its token-set Jaccard similarity against every
/// already-kept chunk stays below `1 - diversity_threshold`.
pub fn diversity_filter(chunks: Vec<RetrievedChunk>, diversity_threshold: f32) -> Vec<RetrievedChunk> {
    let limit = 1.0 - diversity_threshold;
    let mut kept: Vec<RetrievedChunk> = Vec::with_capacity(chunks.len());

    for candidate in chunks {
        if kept.is_empty() {
            kept.push(candidate);
            continue;
        }
        let too_similar = kept
            .iter()
            .any(|k| token_jaccard(&candidate.text, &k.text) >= limit);
        if !too_similar {
            kept.push(candidate);
        }
    }
    kept
}

/// Move structured chunks (headings, lists, procedural content) ahead of
/// regular ones, preserving relative order within each group.
pub fn prioritize_structured(chunks: Vec<RetrievedChunk>) -> Vec<RetrievedChunk> {
    let (structured, regular): (Vec<_>, Vec<_>) =
        chunks.into_iter().partition(RetrievedChunk::is_structured);
    let mut out = structured;
    out.extend(regular);
    out
}

/// Context-expansion hook. Configured but intentionally inert: strategy
/// configs carry the flag and the pipeline calls through here, but no
/// expansion behavior is defined yet.
pub fn expand_context(chunks: Vec<RetrievedChunk>, _enabled: bool) -> Vec<RetrievedChunk> {
    chunks
}
