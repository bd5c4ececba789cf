use crate::embedding::EmbeddingProvider;
use crate::index::{VectorIndex, VectorPoint};
use chrono::{DateTime, Utc};
use lore_core::{LoreError, LoreResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// A document-level summary stored in a collection's summary index.
///
/// Created once per document during ingestion; removed when the parent
/// document or collection is deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSummaryRecord {
    /// Record id.
    pub id: Uuid,
    /// Id of the summarized source document.
    pub document_id: String,
    /// The summary text.
    pub summary: String,
    /// Document type classification ("technical", "tutorial", ...).
    pub doc_type: String,
    /// Source identifier for attribution.
    pub source: String,
    /// Character length of the original document.
    pub original_length: usize,
    /// When the summary was generated.
    pub generated_at: DateTime<Utc>,
    /// Similarity score populated on retrieval.
    #[serde(default)]
    pub score: Option<f32>,
}

/// Per-collection overview readiness.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverviewStats {
    /// Base collection name.
    pub collection: String,
    /// Number of summaries indexed for this collection.
    pub summary_count: usize,
    /// Whether the summary-first path can serve this collection.
    pub ready: bool,
}

/// Summary index: a secondary vector-index namespace
/// (`<collection>_summaries`) holding one record per source document.
pub struct SummaryIndex {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
}

/// Namespace for a collection's summary index.
pub fn summary_collection(base: &str) -> String {
    format!("{base}_summaries")
}

impl SummaryIndex {
    /// Create a summary index over the given embedder and vector index.
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, index: Arc<dyn VectorIndex>) -> Self {
        Self { embedder, index }
    }

    /// Index one summary record for a collection (ingestion side).
    pub async fn index_summary(
        &self,
        collection: &str,
        record: &DocumentSummaryRecord,
    ) -> LoreResult<()> {
        let namespace = summary_collection(collection);
        self.index
            .ensure_collection(&namespace, self.embedder.dimension())
            .await?;

        let vector = self.embedder.embed_query(&record.summary).await?;
        let payload = serde_json::to_value(record)?;
        self.index
            .upsert(
                &namespace,
                vec![VectorPoint {
                    id: record.id.to_string(),
                    vector,
                    payload,
                }],
            )
            .await?;

        debug!(collection = %collection, document = %record.document_id, "indexed summary");
        Ok(())
    }

    /// Retrieve up to `limit` summaries relevant to the query, with
    /// similarity scores filled in. Zero results is valid.
    pub async fn search_summaries(
        &self,
        collection: &str,
        query: &str,
        limit: usize,
        threshold: f32,
    ) -> LoreResult<Vec<DocumentSummaryRecord>> {
        let namespace = summary_collection(collection);
        let vector = self.embedder.embed_query(query).await?;
        let hits = self.index.search(&namespace, &vector, limit, threshold).await?;

        let mut records = Vec::with_capacity(hits.len());
        for hit in hits {
            let mut record: DocumentSummaryRecord = serde_json::from_value(hit.payload)
                .map_err(|e| {
                    LoreError::Provider(format!("malformed summary payload '{}': {e}", hit.id))
                })?;
            record.score = Some(hit.score);
            records.push(record);
        }
        Ok(records)
    }

    /// Overview readiness for a collection: how many summaries are indexed.
    pub async fn overview_stats(&self, collection: &str) -> LoreResult<OverviewStats> {
        let namespace = summary_collection(collection);
        let summary_count = match self.index.count(&namespace).await {
            Ok(n) => n,
            Err(LoreError::NotFound(_)) => 0,
            Err(e) => return Err(e),
        };
        Ok(OverviewStats {
            collection: collection.to_string(),
            summary_count,
            ready: summary_count > 0,
        })
    }

    /// Drop a collection's summary namespace (document/collection deletion
    /// side). Missing namespace is `NotFound`.
    pub async fn delete_summaries(&self, collection: &str) -> LoreResult<()> {
        self.index.delete_collection(&summary_collection(collection)).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::embedding::HashedEmbedding;
    use crate::index::InMemoryVectorIndex;

    fn record(document_id: &str, summary: &str, doc_type: &str) -> DocumentSummaryRecord {
        DocumentSummaryRecord {
            id: Uuid::new_v4(),
            document_id: document_id.to_string(),
            summary: summary.to_string(),
            doc_type: doc_type.to_string(),
            source: format!("{document_id}.md"),
            original_length: summary.len() * 10,
            generated_at: Utc::now(),
            score: None,
        }
    }

    fn make_index() -> SummaryIndex {
        SummaryIndex::new(
            Arc::new(HashedEmbedding::default()),
            Arc::new(InMemoryVectorIndex::new()),
        )
    }

    #[tokio::test]
    async fn test_index_and_search_summaries() {
        let summaries = make_index();
        summaries
            .index_summary("docs", &record("d1", "overview of the indexing subsystem", "technical"))
            .await
            .unwrap();
        summaries
            .index_summary("docs", &record("d2", "tutorial for first-time setup", "tutorial"))
            .await
            .unwrap();

        let found = summaries
            .search_summaries("docs", "indexing subsystem overview", 20, 0.0)
            .await
            .unwrap();
        assert_eq!(found.len(), 2);
        assert!(found[0].score.is_some());
        assert_eq!(found[0].document_id, "d1");
    }

    #[tokio::test]
    async fn test_unindexed_collection_is_empty_not_error() {
        let summaries = make_index();
        let found = summaries
            .search_summaries("ghost", "anything at all", 20, 0.15)
            .await
            .unwrap();
        assert!(found.is_empty());

        let stats = summaries.overview_stats("ghost").await.unwrap();
        assert_eq!(stats.summary_count, 0);
        assert!(!stats.ready);
    }

    #[tokio::test]
    async fn test_overview_stats_ready() {
        let summaries = make_index();
        summaries
            .index_summary("docs", &record("d1", "summary text body", "technical"))
            .await
            .unwrap();

        let stats = summaries.overview_stats("docs").await.unwrap();
        assert_eq!(stats.summary_count, 1);
        assert!(stats.ready);
    }

    #[tokio::test]
    async fn test_delete_summaries() {
        let summaries = make_index();
        summaries
            .index_summary("docs", &record("d1", "summary text body", "technical"))
            .await
            .unwrap();
        summaries.delete_summaries("docs").await.unwrap();
        let stats = summaries.overview_stats("docs").await.unwrap();
        assert_eq!(stats.summary_count, 0);
    }
}
