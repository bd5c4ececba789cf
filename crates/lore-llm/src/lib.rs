//! Generation provider abstraction for the Lore retrieval pipeline.
//!
//! The pipeline only ever talks to a [`GenerationProvider`]: the
//! orchestrator for answer synthesis, the overview generator for summary
//! aggregation, and the intent classifier for its semantic fallback.
//!
//! # Main types
//!
//! - [`GenerationProvider`] — Trait for text generation backends.
//! - [`ScriptedGeneration`] — Deterministic offline provider (tests, demos).
//! - `HttpGeneration` — OpenAI-compatible HTTP backend (feature `http-llm`).

/// OpenAI-compatible HTTP generation backend.
#[cfg(feature = "http-llm")]
pub mod http;
/// Provider trait and streaming types.
pub mod provider;
/// Deterministic scripted provider.
pub mod scripted;

#[cfg(feature = "http-llm")]
pub use http::{GenerationConfig, HttpGeneration};
pub use provider::GenerationProvider;
pub use scripted::ScriptedGeneration;
