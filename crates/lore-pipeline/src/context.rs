//! Per-intent context composition.
//!
//! Turns an ordered chunk list into the context block handed to the
//! generation provider. Overview groups by section, how-to leads with
//! procedural content, everything else is a flat numbered list.

use lore_core::{IntentCategory, RetrievedChunk};

/// Step-marker keywords that tag a chunk as procedural even when the index
/// did not flag it.
const STEP_MARKERS: &[&str] = &[
    "step ",
    "1.",
    "2.",
    "first,",
    "then ",
    "next,",
    "finally",
];

/// Whether the text reads like step-by-step instructions.
pub fn has_step_markers(text: &str) -> bool {
    let lowered = text.to_lowercase();
    STEP_MARKERS.iter().any(|m| lowered.contains(m))
}

/// Compose the generation context for an intent.
pub fn compose_context(intent: IntentCategory, chunks: &[RetrievedChunk]) -> String {
    match intent {
        IntentCategory::Overview => sectioned_context(chunks),
        IntentCategory::HowTo => procedural_first_context(chunks),
        IntentCategory::Comparison | IntentCategory::Factual => flat_context(chunks),
    }
}

/// Group chunks into labeled blocks by section heading, preserving
/// first-seen section order. Chunks without a section land under "General".
fn sectioned_context(chunks: &[RetrievedChunk]) -> String {
    let mut order: Vec<&str> = Vec::new();
    for chunk in chunks {
        let section = chunk.section.as_deref().unwrap_or("General");
        if !order.contains(&section) {
            order.push(section);
        }
    }

    let mut out = String::new();
    for section in order {
        out.push_str("## ");
        out.push_str(section);
        out.push('\n');
        for chunk in chunks {
            if chunk.section.as_deref().unwrap_or("General") == section {
                out.push_str(&format!("[{}] {}\n", chunk.source, chunk.text));
            }
        }
        out.push('\n');
    }
    out
}

/// Procedural chunks (flagged or step-marker-bearing) first, then the rest.
fn procedural_first_context(chunks: &[RetrievedChunk]) -> String {
    let (steps, rest): (Vec<_>, Vec<_>) = chunks
        .iter()
        .partition(|c| c.procedural || has_step_markers(&c.text));

    let mut out = String::new();
    if !steps.is_empty() {
        out.push_str("### Instructions\n");
        for chunk in &steps {
            out.push_str(&format!("[{}] {}\n", chunk.source, chunk.text));
        }
        out.push('\n');
    }
    if !rest.is_empty() {
        out.push_str("### Reference\n");
        for chunk in &rest {
            out.push_str(&format!("[{}] {}\n", chunk.source, chunk.text));
        }
    }
    out
}

/// Flat numbered list: `[chunk i] source / content`.
fn flat_context(chunks: &[RetrievedChunk]) -> String {
    let mut out = String::new();
    for (i, chunk) in chunks.iter().enumerate() {
        out.push_str(&format!("[chunk {}] {}\n{}\n\n", i + 1, chunk.source, chunk.text));
    }
    out
}
