use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Which path of the pipeline produced an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnswerPath {
    /// Served from the query-result cache without touching providers.
    CacheHit,
    /// Built on the summary-first overview path.
    SummaryBased,
    /// Built through intent-tuned chunk retrieval.
    StrategyBased,
    /// Nothing retrievable (or a provider failed); no grounded answer.
    NoResult,
}

/// An attributed source reference on an [`AnswerResult`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceRef {
    /// Chunk or summary id.
    pub id: String,
    /// Source identifier (file path, URL, document title).
    pub source: String,
    /// Text preview, at most 200 characters.
    pub preview: String,
    /// Relevance score of the underlying chunk.
    pub score: f32,
    /// Whether the underlying chunk carries step-by-step content
    /// (populated for how-to answers).
    #[serde(default)]
    pub has_steps: bool,
}

/// A grounded answer with attributed sources and a confidence score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerResult {
    /// The generated answer text.
    pub answer: String,
    /// Ordered source references backing the answer.
    pub sources: Vec<SourceRef>,
    /// Overall confidence in [0, 1].
    pub confidence: f32,
    /// The original query, echoed back.
    pub query: String,
    /// Which pipeline path produced this answer.
    pub path: AnswerPath,
    /// Response metadata: intent tag, degradation notes, counters.
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl AnswerResult {
    /// Build a terminal no-result answer with zero confidence.
    pub fn no_result(query: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            answer: message.into(),
            sources: Vec::new(),
            confidence: 0.0,
            query: query.into(),
            path: AnswerPath::NoResult,
            metadata: HashMap::new(),
        }
    }

    /// Attach a metadata entry, chainable.
    pub fn with_meta(mut self, key: &str, value: serde_json::Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }

    /// Record a non-fatal degradation note under the `degraded` key,
    /// appending to any existing notes.
    pub fn note_degraded(&mut self, note: &str) {
        let entry = self
            .metadata
            .entry("degraded".to_string())
            .or_insert_with(|| serde_json::Value::Array(Vec::new()));
        if let serde_json::Value::Array(notes) = entry {
            notes.push(serde_json::Value::String(note.to_string()));
        }
    }
}
