//! Summary-first overview generation.
//!
//! For broad "what is this about" queries, an answer aggregated from
//! document-level summaries beats stitching raw chunks: it covers the whole
//! collection instead of whichever chunks happened to rank. The generator
//! returns `None` when a collection has no indexed summaries, and the
//! orchestrator falls back to standard retrieval.

use crate::confidence::overview_confidence;
use crate::prompts::aggregation_prompt;
use lore_cache::CacheManager;
use lore_core::{AnswerPath, AnswerResult, LoreResult, SourceRef};
use lore_index::{DocumentSummaryRecord, SummaryIndex};
use lore_llm::GenerationProvider;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// How many summaries to pull from the summary index.
const SUMMARY_LIMIT: usize = 20;
/// Similarity floor for summary retrieval; deliberately permissive so broad
/// queries still match.
const SUMMARY_THRESHOLD: f32 = 0.15;
/// Character budget for the aggregation context.
const CONTEXT_BUDGET: usize = 8000;

/// Builds overview answers from a collection's summary index.
pub struct OverviewGenerator {
    summaries: Arc<SummaryIndex>,
    generator: Arc<dyn GenerationProvider>,
    cache: Option<Arc<CacheManager>>,
}

impl OverviewGenerator {
    /// Create a generator without overview-answer caching.
    pub fn new(summaries: Arc<SummaryIndex>, generator: Arc<dyn GenerationProvider>) -> Self {
        Self {
            summaries,
            generator,
            cache: None,
        }
    }

    /// Attach the shared cache; overview answers are then served from and
    /// written to the overview namespace. Chainable.
    pub fn with_cache(mut self, cache: Arc<CacheManager>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Generate an overview answer, or `None` when the collection has no
    /// indexed summaries. Provider failures propagate as errors; the caller
    /// decides how to terminalize them.
    pub async fn generate(&self, collection: &str, query: &str) -> LoreResult<Option<AnswerResult>> {
        if let Some(cache) = &self.cache {
            if let Some(payload) = cache.get_overview(collection, query) {
                match serde_json::from_value::<AnswerResult>(payload) {
                    Ok(answer) => {
                        debug!(collection = %collection, "overview cache hit");
                        return Ok(Some(answer));
                    }
                    Err(e) => warn!(error = %e, "discarding malformed cached overview"),
                }
            }
        }

        let mut records = self
            .summaries
            .search_summaries(collection, query, SUMMARY_LIMIT, SUMMARY_THRESHOLD)
            .await?;
        if records.is_empty() {
            return Ok(None);
        }
        let available = records.len();

        records.sort_by(|a, b| {
            adjusted_score(b)
                .partial_cmp(&adjusted_score(a))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let selected = select_within_budget(&records, CONTEXT_BUDGET);

        let block = summary_block(&selected);
        let prompt = aggregation_prompt(&block, query);
        let answer_text = self.generator.invoke(&prompt).await?;

        let avg = selected.iter().map(|r| raw_score(r)).sum::<f32>() / selected.len() as f32;
        let unique_sources: HashSet<&str> =
            selected.iter().map(|r| r.source.as_str()).collect();
        let confidence = overview_confidence(avg, selected.len(), unique_sources.len());

        let sources = selected
            .iter()
            .map(|r| SourceRef {
                id: r.id.to_string(),
                source: r.source.clone(),
                preview: preview(&r.summary, 200),
                score: raw_score(r),
                has_steps: false,
            })
            .collect();

        let answer = AnswerResult {
            answer: answer_text,
            sources,
            confidence,
            query: query.to_string(),
            path: AnswerPath::SummaryBased,
            metadata: std::collections::HashMap::new(),
        }
        .with_meta("intent", serde_json::json!("overview"))
        .with_meta("summary_count", serde_json::json!(available))
        .with_meta("summaries_used", serde_json::json!(selected.len()));

        debug!(
            collection = %collection,
            available,
            used = selected.len(),
            confidence,
            "overview answer generated"
        );

        if let Some(cache) = &self.cache {
            match serde_json::to_value(&answer) {
                Ok(payload) => cache.set_overview(collection, query, payload),
                Err(e) => warn!(error = %e, "overview answer not cacheable"),
            }
        }

        Ok(Some(answer))
    }
}

fn raw_score(record: &DocumentSummaryRecord) -> f32 {
    record.score.unwrap_or(0.0)
}

/// Ranking score: raw similarity weighted by document type and summary
/// length. Technical docs and tutorials get a mild boost; longer summaries
/// carry more signal, capped at 1.2x.
fn adjusted_score(record: &DocumentSummaryRecord) -> f32 {
    let type_weight = match record.doc_type.as_str() {
        "technical" => 1.1,
        "tutorial" => 1.05,
        _ => 1.0,
    };
    let length_weight = (1.0 + record.summary.len() as f32 / 5000.0).min(1.2);
    raw_score(record) * type_weight * length_weight
}

/// Greedy selection under a character budget. The top-ranked summary is
/// always included, even when it alone exceeds the budget.
fn select_within_budget(
    records: &[DocumentSummaryRecord],
    budget: usize,
) -> Vec<&DocumentSummaryRecord> {
    let mut selected = Vec::new();
    let mut used = 0usize;
    for record in records {
        let len = record.summary.len();
        if selected.is_empty() || used + len <= budget {
            used += len;
            selected.push(record);
        }
    }
    selected
}

fn summary_block(selected: &[&DocumentSummaryRecord]) -> String {
    let mut out = String::new();
    for record in selected {
        out.push_str(&format!(
            "[source: {} | type: {} | score: {:.2}]\n{}\n\n",
            record.source,
            record.doc_type,
            raw_score(record),
            record.summary
        ));
    }
    out
}

fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        text.chars().take(max_chars).collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use lore_index::{HashedEmbedding, InMemoryVectorIndex};
    use lore_llm::ScriptedGeneration;
    use uuid::Uuid;

    fn record(source: &str, summary: &str, doc_type: &str, score: f32) -> DocumentSummaryRecord {
        DocumentSummaryRecord {
            id: Uuid::new_v4(),
            document_id: source.to_string(),
            summary: summary.to_string(),
            doc_type: doc_type.to_string(),
            source: format!("{source}.md"),
            original_length: summary.len() * 10,
            generated_at: Utc::now(),
            score: Some(score),
        }
    }

    #[test]
    fn test_adjusted_score_weights() {
        let technical = record("a", "short", "technical", 0.5);
        let plain = record("b", "short", "guide", 0.5);
        assert!(adjusted_score(&technical) > adjusted_score(&plain));

        let long = record("c", &"x".repeat(5000), "guide", 0.5);
        // length weight 1 + 5000/5000 = 2.0, capped at 1.2
        assert!((adjusted_score(&long) - 0.5 * 1.2).abs() < 1e-6);
    }

    #[test]
    fn test_budget_always_keeps_one() {
        let records = vec![record("a", &"x".repeat(20_000), "guide", 0.9)];
        let selected = select_within_budget(&records, CONTEXT_BUDGET);
        assert_eq!(selected.len(), 1);
    }

    #[test]
    fn test_budget_stops_admitting() {
        let records = vec![
            record("a", &"x".repeat(5000), "guide", 0.9),
            record("b", &"y".repeat(5000), "guide", 0.8),
            record("c", "tiny", "guide", 0.7),
        ];
        let selected = select_within_budget(&records, CONTEXT_BUDGET);
        // second 5000-char summary busts the 8000 budget; the tiny one fits
        let sources: Vec<&str> = selected.iter().map(|r| r.source.as_str()).collect();
        assert_eq!(sources, vec!["a.md", "c.md"]);
    }

    #[tokio::test]
    async fn test_empty_collection_yields_none() {
        let summaries = Arc::new(SummaryIndex::new(
            Arc::new(HashedEmbedding::default()),
            Arc::new(InMemoryVectorIndex::new()),
        ));
        let generator = Arc::new(ScriptedGeneration::new("unused"));
        let overview = OverviewGenerator::new(summaries, generator.clone());

        let result = overview.generate("empty", "what is this about").await.unwrap();
        assert!(result.is_none());
        assert_eq!(generator.call_count(), 0);
    }

    #[tokio::test]
    async fn test_generates_answer_with_confidence_and_sources() {
        let summaries = Arc::new(SummaryIndex::new(
            Arc::new(HashedEmbedding::default()),
            Arc::new(InMemoryVectorIndex::new()),
        ));
        for i in 0..5 {
            summaries
                .index_summary(
                    "docs",
                    &record(
                        &format!("doc{i}"),
                        &format!("summary {i} describing the documentation content"),
                        "technical",
                        0.5,
                    ),
                )
                .await
                .unwrap();
        }
        let generator = Arc::new(ScriptedGeneration::new("An overview of the docs."));
        let overview = OverviewGenerator::new(summaries, generator.clone());

        let answer = overview
            .generate("docs", "what is this documentation about")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(answer.path, AnswerPath::SummaryBased);
        assert_eq!(answer.answer, "An overview of the docs.");
        assert!(answer.confidence > 0.0 && answer.confidence <= 1.0);
        assert_eq!(answer.sources.len(), 5);
        assert_eq!(generator.call_count(), 1);
        assert_eq!(answer.metadata["summary_count"], serde_json::json!(5));
    }

    #[tokio::test]
    async fn test_cached_overview_skips_generation() {
        let summaries = Arc::new(SummaryIndex::new(
            Arc::new(HashedEmbedding::default()),
            Arc::new(InMemoryVectorIndex::new()),
        ));
        summaries
            .index_summary("docs", &record("d", "the only summary text", "guide", 0.6))
            .await
            .unwrap();

        let cache = Arc::new(CacheManager::new(lore_cache::CacheConfig::default()));
        let generator = Arc::new(ScriptedGeneration::new("generated overview"));
        let overview =
            OverviewGenerator::new(summaries, generator.clone()).with_cache(cache);

        let first = overview.generate("docs", "overview please").await.unwrap().unwrap();
        let second = overview.generate("docs", "overview please").await.unwrap().unwrap();
        assert_eq!(first.answer, second.answer);
        assert_eq!(generator.call_count(), 1);
    }
}
