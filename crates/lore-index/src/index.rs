use async_trait::async_trait;
use lore_core::{LoreError, LoreResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// A point stored in a vector index: id, vector, and arbitrary payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorPoint {
    /// Point identifier, unique within its collection.
    pub id: String,
    /// Embedding vector; must match the collection dimension.
    pub vector: Vec<f32>,
    /// Arbitrary payload carried back on search hits.
    pub payload: serde_json::Value,
}

/// A ranked search hit.
#[derive(Debug, Clone)]
pub struct IndexHit {
    /// Point identifier.
    pub id: String,
    /// Similarity score in [0, 1].
    pub score: f32,
    /// The stored payload.
    pub payload: serde_json::Value,
}

/// Trait for collection-scoped vector similarity search.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Create the collection if it does not exist.
    async fn ensure_collection(&self, name: &str, dims: usize) -> LoreResult<()>;

    /// Insert or replace points. The collection must exist.
    async fn upsert(&self, collection: &str, points: Vec<VectorPoint>) -> LoreResult<()>;

    /// Top-`limit` hits above `threshold`, ranked by descending score.
    ///
    /// A collection that was never created behaves as empty: searching it
    /// returns no hits rather than an error.
    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
        threshold: f32,
    ) -> LoreResult<Vec<IndexHit>>;

    /// Drop a collection and all its points.
    async fn delete_collection(&self, name: &str) -> LoreResult<()>;

    /// Number of points in a collection; `NotFound` if it does not exist.
    async fn count(&self, collection: &str) -> LoreResult<usize>;
}

struct Collection {
    dims: usize,
    points: HashMap<String, VectorPoint>,
}

/// In-memory vector index using brute-force cosine similarity.
///
/// Suitable for tests and small corpora; a remote index implements the
/// same trait for production deployments.
pub struct InMemoryVectorIndex {
    collections: RwLock<HashMap<String, Collection>>,
}

impl InMemoryVectorIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryVectorIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    async fn ensure_collection(&self, name: &str, dims: usize) -> LoreResult<()> {
        let mut collections = self.collections.write().await;
        if let Some(existing) = collections.get(name) {
            if existing.dims != dims {
                return Err(LoreError::Validation(format!(
                    "collection '{name}' exists with dimension {} (requested {dims})",
                    existing.dims
                )));
            }
            return Ok(());
        }
        collections.insert(
            name.to_string(),
            Collection {
                dims,
                points: HashMap::new(),
            },
        );
        debug!(collection = %name, dims, "created collection");
        Ok(())
    }

    async fn upsert(&self, collection: &str, points: Vec<VectorPoint>) -> LoreResult<()> {
        let mut collections = self.collections.write().await;
        let coll = collections
            .get_mut(collection)
            .ok_or_else(|| LoreError::NotFound(format!("collection '{collection}'")))?;

        for point in points {
            if point.vector.len() != coll.dims {
                return Err(LoreError::Validation(format!(
                    "point '{}' has dimension {} (collection '{collection}' is {})",
                    point.id,
                    point.vector.len(),
                    coll.dims
                )));
            }
            coll.points.insert(point.id.clone(), point);
        }
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
        threshold: f32,
    ) -> LoreResult<Vec<IndexHit>> {
        let collections = self.collections.read().await;
        let Some(coll) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let mut hits: Vec<IndexHit> = coll
            .points
            .values()
            .filter_map(|p| {
                let score = cosine_similarity(vector, &p.vector);
                if score >= threshold {
                    Some(IndexHit {
                        id: p.id.clone(),
                        score,
                        payload: p.payload.clone(),
                    })
                } else {
                    None
                }
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        hits.truncate(limit);
        Ok(hits)
    }

    async fn delete_collection(&self, name: &str) -> LoreResult<()> {
        let mut collections = self.collections.write().await;
        if collections.remove(name).is_none() {
            return Err(LoreError::NotFound(format!("collection '{name}'")));
        }
        Ok(())
    }

    async fn count(&self, collection: &str) -> LoreResult<usize> {
        let collections = self.collections.read().await;
        collections
            .get(collection)
            .map(|c| c.points.len())
            .ok_or_else(|| LoreError::NotFound(format!("collection '{collection}'")))
    }
}

/// Cosine similarity clamped to [0, 1] (negative similarities floor at 0
/// so index scores stay in the documented range).
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let na: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 {
        0.0
    } else {
        (dot / (na * nb)).max(0.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn point(id: &str, vector: Vec<f32>) -> VectorPoint {
        VectorPoint {
            id: id.to_string(),
            vector,
            payload: serde_json::json!({ "text": id }),
        }
    }

    #[tokio::test]
    async fn test_ensure_upsert_search() {
        let index = InMemoryVectorIndex::new();
        index.ensure_collection("docs", 3).await.unwrap();
        index
            .upsert(
                "docs",
                vec![point("near", vec![1.0, 0.0, 0.0]), point("far", vec![0.0, 0.0, 1.0])],
            )
            .await
            .unwrap();

        let hits = index.search("docs", &[1.0, 0.0, 0.0], 10, 0.0).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, "near");
        assert!(hits[0].score > hits[1].score);
    }

    #[tokio::test]
    async fn test_threshold_filters_hits() {
        let index = InMemoryVectorIndex::new();
        index.ensure_collection("docs", 2).await.unwrap();
        index
            .upsert(
                "docs",
                vec![point("a", vec![1.0, 0.0]), point("b", vec![0.0, 1.0])],
            )
            .await
            .unwrap();

        let hits = index.search("docs", &[1.0, 0.0], 10, 0.5).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "a");
    }

    #[tokio::test]
    async fn test_missing_collection_searches_empty() {
        let index = InMemoryVectorIndex::new();
        let hits = index.search("nope", &[1.0], 10, 0.0).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_dimension_mismatch_rejected() {
        let index = InMemoryVectorIndex::new();
        index.ensure_collection("docs", 3).await.unwrap();
        let err = index
            .upsert("docs", vec![point("bad", vec![1.0, 0.0])])
            .await
            .unwrap_err();
        assert!(matches!(err, LoreError::Validation(_)));

        let err = index.ensure_collection("docs", 5).await.unwrap_err();
        assert!(matches!(err, LoreError::Validation(_)));
    }

    #[tokio::test]
    async fn test_upsert_replaces_point() {
        let index = InMemoryVectorIndex::new();
        index.ensure_collection("docs", 2).await.unwrap();
        index
            .upsert("docs", vec![point("p", vec![1.0, 0.0])])
            .await
            .unwrap();
        index
            .upsert("docs", vec![point("p", vec![0.0, 1.0])])
            .await
            .unwrap();
        assert_eq!(index.count("docs").await.unwrap(), 1);

        let hits = index.search("docs", &[0.0, 1.0], 1, 0.9).await.unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_collection() {
        let index = InMemoryVectorIndex::new();
        index.ensure_collection("docs", 2).await.unwrap();
        index.delete_collection("docs").await.unwrap();
        assert!(matches!(
            index.count("docs").await.unwrap_err(),
            LoreError::NotFound(_)
        ));
        assert!(matches!(
            index.delete_collection("docs").await.unwrap_err(),
            LoreError::NotFound(_)
        ));
    }

    #[test]
    fn test_cosine_clamps_negative() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]), 0.0);
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
    }
}
