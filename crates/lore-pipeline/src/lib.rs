//! Query orchestration for the Lore retrieval pipeline.
//!
//! Wires intent classification, strategy-tuned vector retrieval, the
//! summary-first overview path, the shared cache, and a generation provider
//! into one request/response cycle with confidence scoring and source
//! attribution.
//!
//! # Main types
//!
//! - [`QueryEngine`] — The orchestrator; one per service, shared across
//!   concurrent queries.
//! - [`QueryRequest`] — A query with collection scope and options.
//! - [`OverviewGenerator`] — The summary-first answer path.
//!
//! # Example
//!
//! ```no_run
//! use lore_cache::{CacheConfig, CacheManager};
//! use lore_index::{HashedEmbedding, InMemoryVectorIndex, SummaryIndex, VectorRetriever};
//! use lore_intent::IntentClassifier;
//! use lore_llm::ScriptedGeneration;
//! use lore_pipeline::{OverviewGenerator, QueryEngine, QueryRequest};
//! use std::sync::Arc;
//!
//! # async fn run() -> lore_core::LoreResult<()> {
//! let embedder = Arc::new(HashedEmbedding::default());
//! let index = Arc::new(InMemoryVectorIndex::new());
//! let generator = Arc::new(ScriptedGeneration::new("answer"));
//! let cache = Arc::new(CacheManager::new(CacheConfig::default()));
//!
//! let engine = QueryEngine::new(
//!     IntentClassifier::new()?,
//!     VectorRetriever::new(embedder.clone(), index.clone()),
//!     OverviewGenerator::new(Arc::new(SummaryIndex::new(embedder, index)), generator.clone())
//!         .with_cache(cache.clone()),
//!     generator,
//!     cache,
//! );
//!
//! let answer = engine
//!     .answer(&QueryRequest::new("What is this about?", "docs"))
//!     .await?;
//! println!("{} ({:.2})", answer.answer, answer.confidence);
//! # Ok(())
//! # }
//! ```

/// Answer confidence scoring.
pub mod confidence;
/// Per-intent context composition.
pub mod context;
/// The query orchestrator.
pub mod engine;
/// Summary-first overview generation.
pub mod overview;
/// Prompt templates.
pub mod prompts;

pub use engine::{QueryEngine, QueryRequest};
pub use overview::OverviewGenerator;
