use crate::embedding::EmbeddingProvider;
use crate::index::{IndexHit, VectorIndex};
use lore_core::{LoreResult, RetrievedChunk};
use std::sync::Arc;
use tracing::debug;

/// Embeds a query and performs top-k similarity search against a
/// collection, mapping index hits back to [`RetrievedChunk`]s.
pub struct VectorRetriever {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
}

impl VectorRetriever {
    /// Create a retriever over the given embedder and index.
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, index: Arc<dyn VectorIndex>) -> Self {
        Self { embedder, index }
    }

    /// Retrieve up to `top_k` chunks above `threshold` for the query.
    ///
    /// An empty result is valid. Provider or index failures surface as
    /// errors.
    pub async fn retrieve(
        &self,
        collection: &str,
        query: &str,
        top_k: usize,
        threshold: f32,
    ) -> LoreResult<Vec<RetrievedChunk>> {
        let vector = self.embedder.embed_query(query).await?;
        let hits = self.index.search(collection, &vector, top_k, threshold).await?;

        debug!(
            collection = %collection,
            hits = hits.len(),
            top_k,
            threshold,
            "vector retrieval"
        );

        Ok(hits
            .into_iter()
            .map(|hit| hit_to_chunk(hit, collection))
            .collect())
    }
}

/// Flatten a payload-bearing hit into a [`RetrievedChunk`]. Missing payload
/// fields fall back to neutral defaults rather than failing retrieval.
fn hit_to_chunk(hit: IndexHit, collection: &str) -> RetrievedChunk {
    let payload = &hit.payload;
    RetrievedChunk {
        id: hit.id,
        source: payload["source"].as_str().unwrap_or("unknown").to_string(),
        text: payload["text"].as_str().unwrap_or_default().to_string(),
        score: hit.score,
        collection: collection.to_string(),
        position: payload["position"].as_u64().map(|p| p as usize),
        section: payload["section"].as_str().map(str::to_string),
        heading: payload["heading"].as_bool().unwrap_or(false),
        list: payload["list"].as_bool().unwrap_or(false),
        procedural: payload["procedural"].as_bool().unwrap_or(false),
    }
}
