//! Vector retrieval for the Lore pipeline.
//!
//! Provides the embedding and vector-index abstractions, the retriever
//! that turns a query into scored [`lore_core::RetrievedChunk`]s, the pure
//! post-retrieval enhancers (diversity filtering, structured-content
//! prioritization), and the per-collection summary index backing the
//! overview fast path.
//!
//! # Main types
//!
//! - [`EmbeddingProvider`] — Trait for query/document embedding.
//! - [`HashedEmbedding`] — Deterministic local hashed bag-of-words embedder.
//! - [`VectorIndex`] — Trait for collection-scoped similarity search.
//! - [`InMemoryVectorIndex`] — Brute-force cosine index.
//! - [`VectorRetriever`] — Embeds a query and searches a collection.
//! - [`SummaryIndex`] — `<collection>_summaries` namespace wrapper.

/// Embedding provider trait and implementations.
pub mod embedding;
/// Pure post-retrieval enhancement functions.
pub mod enhance;
/// Vector index trait and in-memory implementation.
pub mod index;
/// Query retriever.
pub mod retriever;
/// Document-summary index for the overview fast path.
pub mod summary;

pub use embedding::{EmbeddingProvider, HashedEmbedding};
pub use enhance::{diversity_filter, expand_context, prioritize_structured};
pub use index::{InMemoryVectorIndex, IndexHit, VectorIndex, VectorPoint};
pub use retriever::VectorRetriever;
pub use summary::{DocumentSummaryRecord, OverviewStats, SummaryIndex};
