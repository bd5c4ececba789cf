//! Core types and error definitions for the Lore retrieval pipeline.
//!
//! This crate provides the foundational types shared across all Lore crates:
//! the unified error enum, the intent classification model, retrieved-chunk
//! and answer-result types, and the text normalization utilities used by
//! both the cache and the diversity filter.
//!
//! # Main types
//!
//! - [`LoreError`] — Unified error enum for all Lore subsystems.
//! - [`LoreResult`] — Convenience alias for `Result<T, LoreError>`.
//! - [`IntentCategory`] / [`IntentResult`] — Classified query purpose.
//! - [`RetrievedChunk`] — A retrieved content unit with a relevance score.
//! - [`AnswerResult`] / [`SourceRef`] — A grounded answer with attributed
//!   sources and a confidence score.

/// Answer results and attributed source references.
pub mod answer;
/// Retrieved content chunks and their structural flags.
pub mod chunk;
/// Intent classification result types.
pub mod intent;
/// Text normalization and token-set similarity.
pub mod text;

pub use answer::{AnswerPath, AnswerResult, SourceRef};
pub use chunk::RetrievedChunk;
pub use intent::{AnalysisMethod, ConfidenceBand, IntentCategory, IntentResult};

/// Top-level error type for the Lore pipeline.
///
/// Each variant corresponds to a failure class defined by the pipeline's
/// error taxonomy. Degraded-but-successful conditions (semantic fallback
/// failure, empty overview path, cache I/O trouble) are *not* errors; they
/// are recorded in answer metadata by the callers that observe them.
#[derive(Debug, thiserror::Error)]
pub enum LoreError {
    /// Invalid configuration, raised on construction or update. Fail-fast:
    /// never caught internally.
    #[error("Validation error: {0}")]
    Validation(String),

    /// An embedding or generation provider call failed.
    #[error("Provider error: {0}")]
    Provider(String),

    /// A referenced collection or record does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A cache backing-store failure. Callers treat these as a miss/no-op.
    #[error("Cache error: {0}")]
    Cache(String),

    /// A JSON serialization or deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenience `Result` alias using [`LoreError`].
pub type LoreResult<T> = Result<T, LoreError>;
