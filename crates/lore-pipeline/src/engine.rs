//! The query orchestrator.
//!
//! One [`QueryEngine::answer`] call runs the full cycle: cache lookup,
//! intent classification, the summary-first overview path or intent-tuned
//! retrieval with enhancement, context composition, generation, confidence
//! scoring, and cache store. Provider failures terminate the query with a
//! zero-confidence answer carrying the error in metadata; only invalid
//! strategy overrides surface as `Err`.

use crate::confidence::strategy_confidence;
use crate::context::{compose_context, has_step_markers};
use crate::overview::OverviewGenerator;
use crate::prompts::answer_prompt;
use lore_cache::CacheManager;
use lore_core::{
    AnswerPath, AnswerResult, IntentCategory, IntentResult, LoreError, LoreResult, RetrievedChunk,
    SourceRef,
};
use lore_index::{diversity_filter, expand_context, prioritize_structured, VectorRetriever};
use lore_intent::{IntentClassifier, RetrievalConfig, RetrievalOverrides, StrategyManager};
use lore_llm::GenerationProvider;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Below this many chunks an overview query widens its retrieval.
const WIDEN_MIN: usize = 10;
/// Similarity floor for the widened pass.
const WIDEN_THRESHOLD: f32 = 0.1;
/// How many candidates the widened pass pulls before section spreading.
const WIDEN_LIMIT: usize = 40;
/// Chunks kept per section in the widened result.
const WIDEN_PER_SECTION: usize = 2;
/// Total cap on the widened result.
const WIDEN_CAP: usize = 20;

/// One answer request.
#[derive(Debug, Clone)]
pub struct QueryRequest {
    /// The user query.
    pub query: String,
    /// Target collection.
    pub collection: String,
    /// Append a citation block to the answer text.
    pub include_sources: bool,
    /// Per-request strategy override; validated before use.
    pub strategy_override: Option<RetrievalConfig>,
}

impl QueryRequest {
    /// A request with default options.
    pub fn new(query: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            collection: collection.into(),
            include_sources: false,
            strategy_override: None,
        }
    }

    /// Request a citation block appended to the answer. Chainable.
    pub fn with_sources(mut self) -> Self {
        self.include_sources = true;
        self
    }

    /// Override the retrieval strategy for this request. Chainable.
    pub fn with_strategy(mut self, config: RetrievalConfig) -> Self {
        self.strategy_override = Some(config);
        self
    }
}

/// The pipeline orchestrator. One instance serves many concurrent queries;
/// per-query state is local, only the cache is shared.
pub struct QueryEngine {
    classifier: IntentClassifier,
    strategies: StrategyManager,
    retriever: VectorRetriever,
    overview: OverviewGenerator,
    generator: Arc<dyn GenerationProvider>,
    cache: Arc<CacheManager>,
}

impl QueryEngine {
    /// Wire an engine from its components, with the default strategy table.
    pub fn new(
        classifier: IntentClassifier,
        retriever: VectorRetriever,
        overview: OverviewGenerator,
        generator: Arc<dyn GenerationProvider>,
        cache: Arc<CacheManager>,
    ) -> Self {
        Self {
            classifier,
            strategies: StrategyManager::new(),
            retriever,
            overview,
            generator,
            cache,
        }
    }

    /// The active strategy for an intent.
    pub fn strategy_for(&self, intent: IntentCategory) -> RetrievalConfig {
        self.strategies.config_for(intent)
    }

    /// Merge a strategy override into the engine's table (validated).
    pub fn merge_strategy(
        &mut self,
        intent: IntentCategory,
        overrides: &RetrievalOverrides,
    ) -> LoreResult<RetrievalConfig> {
        self.strategies.merge(intent, overrides)
    }

    /// Restore the default strategy table.
    pub fn reset_strategies(&mut self) {
        self.strategies.reset();
    }

    /// The shared cache, for the admin surface (`stats`, `clear`).
    pub fn cache(&self) -> &CacheManager {
        &self.cache
    }

    /// Answer a query.
    ///
    /// Returns `Err` only for an invalid `strategy_override`; every other
    /// failure mode terminates in an [`AnswerResult`] (zero-confidence with
    /// error metadata for provider failures, degradation notes otherwise).
    pub async fn answer(&self, request: &QueryRequest) -> LoreResult<AnswerResult> {
        // Cache first: exact key, then fuzzy over the collection.
        if let Some(payload) =
            self.cache
                .get_query_result(&request.query, &request.collection, None)
        {
            match serde_json::from_value::<AnswerResult>(payload) {
                Ok(mut answer) => {
                    info!(collection = %request.collection, "answer served from cache");
                    answer.path = AnswerPath::CacheHit;
                    if request.include_sources {
                        append_citations(&mut answer);
                    }
                    return Ok(answer);
                }
                Err(e) => warn!(error = %e, "discarding malformed cached answer"),
            }
        }

        let intent = self.classify_cached(&request.query).await;
        debug!(
            category = %intent.category,
            score = intent.score,
            "query classified"
        );

        let config = match &request.strategy_override {
            Some(custom) => {
                custom.validate()?;
                custom.clone()
            }
            None => self.strategies.config_for(intent.category),
        };

        let mut degraded: Vec<String> = Vec::new();

        // Summary-first fast path for overview queries.
        if intent.category == IntentCategory::Overview && config.summary_first {
            match self.overview.generate(&request.collection, &request.query).await {
                Ok(Some(answer)) => {
                    let answer = self.finalize(answer, request, intent.category);
                    return Ok(answer);
                }
                Ok(None) => {
                    warn!(collection = %request.collection, "no summaries indexed, falling back to retrieval");
                    degraded.push("overview path empty".to_string());
                }
                Err(e) => return Ok(self.provider_failure(request, intent.category, &e)),
            }
        }

        let mut chunks = match self
            .retriever
            .retrieve(
                &request.collection,
                &request.query,
                config.top_k,
                config.score_threshold,
            )
            .await
        {
            Ok(chunks) => chunks,
            Err(e) => return Ok(self.provider_failure(request, intent.category, &e)),
        };

        // Thin overview results widen to a per-section spread.
        if intent.category == IntentCategory::Overview && chunks.len() < WIDEN_MIN {
            match self
                .retriever
                .retrieve(&request.collection, &request.query, WIDEN_LIMIT, WIDEN_THRESHOLD)
                .await
            {
                Ok(wide) => {
                    let spread = section_spread(wide, WIDEN_PER_SECTION, WIDEN_CAP);
                    if spread.len() > chunks.len() {
                        debug!(narrow = chunks.len(), widened = spread.len(), "overview widened");
                        chunks = spread;
                    }
                }
                Err(e) => {
                    warn!(error = %e, "overview widening failed, keeping narrow result");
                    degraded.push("overview widening failed".to_string());
                }
            }
        }

        if chunks.is_empty() {
            let mut answer = AnswerResult::no_result(
                &request.query,
                no_result_message(intent.category),
            )
            .with_meta("intent", serde_json::json!(intent.category.tag()));
            for note in &degraded {
                answer.note_degraded(note);
            }
            info!(collection = %request.collection, intent = %intent.category, "no retrievable content");
            return Ok(answer);
        }

        if config.enable_diversity_filter {
            chunks = diversity_filter(chunks, config.diversity_threshold);
        }
        if config.prefer_structured {
            chunks = prioritize_structured(chunks);
        }
        chunks = expand_context(chunks, config.enable_context_expansion);

        let context = compose_context(intent.category, &chunks);
        let prompt = answer_prompt(intent.category, &context, &request.query);
        let answer_text = match self.generator.invoke(&prompt).await {
            Ok(text) => text,
            Err(e) => return Ok(self.provider_failure(request, intent.category, &e)),
        };

        let confidence = strategy_confidence(intent.category, intent.band, &chunks);
        let sources = format_sources(intent.category, &chunks);

        let mut answer = AnswerResult {
            answer: answer_text,
            sources,
            confidence,
            query: request.query.clone(),
            path: AnswerPath::StrategyBased,
            metadata: HashMap::new(),
        }
        .with_meta("intent", serde_json::json!(intent.category.tag()))
        .with_meta("band", serde_json::to_value(intent.band)?)
        .with_meta("method", serde_json::to_value(intent.method)?)
        .with_meta("chunks", serde_json::json!(chunks.len()));
        for note in &degraded {
            answer.note_degraded(note);
        }

        let answer = self.finalize(answer, request, intent.category);
        info!(
            collection = %request.collection,
            intent = %intent.category,
            confidence = answer.confidence,
            "answer generated"
        );
        Ok(answer)
    }

    /// Intent classification with the global intent cache in front.
    async fn classify_cached(&self, query: &str) -> IntentResult {
        if let Some(cached) = self
            .cache
            .get_intent(query)
            .and_then(|v| serde_json::from_value::<IntentResult>(v).ok())
        {
            return cached;
        }
        let result = self.classifier.classify(query).await;
        match serde_json::to_value(&result) {
            Ok(payload) => self.cache.set_intent(query, payload),
            Err(e) => warn!(error = %e, "intent result not cacheable"),
        }
        result
    }

    /// Store the answer in the query-result cache, then append the
    /// citation block when requested. The cached payload stays
    /// un-decorated so later hits can decorate (or not) per request.
    fn finalize(
        &self,
        mut answer: AnswerResult,
        request: &QueryRequest,
        intent: IntentCategory,
    ) -> AnswerResult {
        match serde_json::to_value(&answer) {
            Ok(payload) => {
                self.cache
                    .set_query_result(&request.query, &request.collection, intent, payload);
            }
            Err(e) => warn!(error = %e, "answer not cacheable"),
        }
        if request.include_sources {
            append_citations(&mut answer);
        }
        answer
    }

    /// Terminal answer for a failed provider call. Not retried, not an
    /// `Err`: callers always get an `AnswerResult`.
    fn provider_failure(
        &self,
        request: &QueryRequest,
        intent: IntentCategory,
        err: &LoreError,
    ) -> AnswerResult {
        error!(error = %err, collection = %request.collection, "provider call failed");
        AnswerResult::no_result(
            &request.query,
            "The query could not be answered because a provider call failed.",
        )
        .with_meta("error", serde_json::json!(err.to_string()))
        .with_meta("intent", serde_json::json!(intent.tag()))
    }
}

/// Append a numbered citation block to the answer text. No-op when the
/// answer carries no sources.
fn append_citations(answer: &mut AnswerResult) {
    if answer.sources.is_empty() {
        return;
    }
    answer.answer.push_str("\n\nSources:\n");
    for (i, source) in answer.sources.iter().enumerate() {
        answer.answer.push_str(&format!(
            "{}. {} (score {:.2})\n",
            i + 1,
            source.source,
            source.score
        ));
    }
}

/// The intent-specific message for a query with nothing retrievable.
fn no_result_message(intent: IntentCategory) -> &'static str {
    match intent {
        IntentCategory::Overview => {
            "No indexed content is available to summarize for this collection."
        }
        IntentCategory::HowTo => "No step-by-step instructions were found for this request.",
        IntentCategory::Comparison => "Not enough material was found to compare these topics.",
        IntentCategory::Factual => "No matching facts were found in the indexed content.",
    }
}

/// Spread a ranked chunk list across sections: keep at most `per_section`
/// chunks per section (in rank order) up to `cap` total. Chunks without a
/// section share one bucket.
fn section_spread(
    chunks: Vec<RetrievedChunk>,
    per_section: usize,
    cap: usize,
) -> Vec<RetrievedChunk> {
    let mut taken: HashMap<String, usize> = HashMap::new();
    let mut out = Vec::new();
    for chunk in chunks {
        if out.len() >= cap {
            break;
        }
        let section = chunk.section.clone().unwrap_or_default();
        let count = taken.entry(section).or_insert(0);
        if *count < per_section {
            *count += 1;
            out.push(chunk);
        }
    }
    out
}

/// Source references with capped previews; `has_steps` is populated for
/// how-to answers only.
fn format_sources(intent: IntentCategory, chunks: &[RetrievedChunk]) -> Vec<SourceRef> {
    chunks
        .iter()
        .map(|chunk| SourceRef {
            id: chunk.id.clone(),
            source: chunk.source.clone(),
            preview: chunk.preview(200),
            score: chunk.score,
            has_steps: intent == IntentCategory::HowTo
                && (chunk.procedural || has_step_markers(&chunk.text)),
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn chunk(id: &str, section: Option<&str>, score: f32) -> RetrievedChunk {
        RetrievedChunk {
            id: id.to_string(),
            source: format!("{id}.md"),
            text: "text".to_string(),
            score,
            collection: "docs".to_string(),
            position: None,
            section: section.map(str::to_string),
            heading: false,
            list: false,
            procedural: false,
        }
    }

    #[test]
    fn test_section_spread_limits_per_section() {
        let chunks = vec![
            chunk("a", Some("Intro"), 0.9),
            chunk("b", Some("Intro"), 0.8),
            chunk("c", Some("Intro"), 0.7),
            chunk("d", Some("Setup"), 0.6),
        ];
        let out = section_spread(chunks, 2, 20);
        let ids: Vec<&str> = out.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "d"]);
    }

    #[test]
    fn test_section_spread_caps_total() {
        let chunks: Vec<_> = (0..30)
            .map(|i| chunk(&format!("c{i}"), Some(&format!("s{i}")), 0.5))
            .collect();
        let out = section_spread(chunks, 2, 20);
        assert_eq!(out.len(), 20);
    }

    #[test]
    fn test_section_spread_missing_sections_share_bucket() {
        let chunks = vec![
            chunk("a", None, 0.9),
            chunk("b", None, 0.8),
            chunk("c", None, 0.7),
        ];
        let out = section_spread(chunks, 2, 20);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_sources_has_steps_only_for_howto() {
        let mut procedural = chunk("a", None, 0.9);
        procedural.procedural = true;
        let chunks = vec![procedural];

        let howto = format_sources(IntentCategory::HowTo, &chunks);
        assert!(howto[0].has_steps);
        let factual = format_sources(IntentCategory::Factual, &chunks);
        assert!(!factual[0].has_steps);
    }

    #[test]
    fn test_append_citations_noop_without_sources() {
        let mut answer = AnswerResult::no_result("q", "nothing found");
        append_citations(&mut answer);
        assert_eq!(answer.answer, "nothing found");

        answer.sources.push(SourceRef {
            id: "a".to_string(),
            source: "a.md".to_string(),
            preview: String::new(),
            score: 0.8,
            has_steps: false,
        });
        append_citations(&mut answer);
        assert!(answer.answer.contains("1. a.md (score 0.80)"));
    }

    #[test]
    fn test_no_result_messages_differ_by_intent() {
        let mut seen = std::collections::HashSet::new();
        for intent in IntentCategory::ALL {
            assert!(seen.insert(no_result_message(intent)));
        }
    }
}
