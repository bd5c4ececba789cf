use serde::{Deserialize, Serialize};

/// A retrieved content unit with an associated relevance score.
///
/// Chunks come out of a vector index search with their payload already
/// flattened: text, source identifier, positional metadata, and the
/// structural flags the enhancer and context formatter key on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedChunk {
    /// Index point id.
    pub id: String,
    /// Source identifier (file path, URL, document title).
    pub source: String,
    /// The chunk text.
    pub text: String,
    /// Relevance score in [0, 1] as reported by the index.
    pub score: f32,
    /// Collection this chunk was retrieved from.
    pub collection: String,
    /// Position of the chunk within its parent document, when known.
    #[serde(default)]
    pub position: Option<usize>,
    /// Section heading the chunk sits under, when known.
    #[serde(default)]
    pub section: Option<String>,
    /// Chunk starts with or is a heading.
    #[serde(default)]
    pub heading: bool,
    /// Chunk contains list markup.
    #[serde(default)]
    pub list: bool,
    /// Chunk carries procedural (step-by-step) content.
    #[serde(default)]
    pub procedural: bool,
}

impl RetrievedChunk {
    /// Whether this chunk counts as structured content for prioritization:
    /// headings, lists, or procedural steps.
    pub fn is_structured(&self) -> bool {
        self.heading || self.list || self.procedural
    }

    /// A preview of the chunk text capped at `max_chars` characters
    /// (respecting char boundaries), used for source attribution.
    pub fn preview(&self, max_chars: usize) -> String {
        if self.text.chars().count() <= max_chars {
            self.text.clone()
        } else {
            self.text.chars().take(max_chars).collect()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn chunk(text: &str) -> RetrievedChunk {
        RetrievedChunk {
            id: "c1".to_string(),
            source: "doc.md".to_string(),
            text: text.to_string(),
            score: 0.5,
            collection: "docs".to_string(),
            position: None,
            section: None,
            heading: false,
            list: false,
            procedural: false,
        }
    }

    #[test]
    fn test_preview_short_text_unchanged() {
        let c = chunk("short");
        assert_eq!(c.preview(200), "short");
    }

    #[test]
    fn test_preview_caps_at_char_boundary() {
        let c = chunk("héllo wörld");
        let p = c.preview(4);
        assert_eq!(p, "héll");
    }

    #[test]
    fn test_is_structured_flags() {
        let mut c = chunk("x");
        assert!(!c.is_structured());
        c.list = true;
        assert!(c.is_structured());
        c.list = false;
        c.procedural = true;
        assert!(c.is_structured());
    }
}
