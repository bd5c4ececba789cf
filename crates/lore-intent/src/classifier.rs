use lore_core::{AnalysisMethod, ConfidenceBand, IntentCategory, IntentResult, LoreError, LoreResult};
use lore_llm::GenerationProvider;
use regex::Regex;
use std::sync::Arc;
use tracing::{debug, warn};

/// Keyword score required to accept the pattern-table result.
const KEYWORD_ACCEPT: f32 = 0.3;
/// Keyword score at which the confidence band becomes high.
const KEYWORD_HIGH: f32 = 0.5;
/// Penalty per negative pattern match.
const NEGATIVE_PENALTY: f32 = 0.2;

const CLASSIFY_PROMPT: &str = "Classify the intent of this search query. \
Respond with exactly one word: overview, how-to, comparison, or factual.\n\n\
Query: ";

/// Pattern table for one category: weighted positive patterns and
/// unweighted negative patterns, all matched against the lowercased query.
struct CategoryTable {
    category: IntentCategory,
    positive: Vec<(Regex, f32)>,
    negative: Vec<Regex>,
}

/// Classifies query intent by pattern-table scoring with an optional
/// semantic fallback through a generation provider.
///
/// Per category: score = (weight of positive patterns matched / total
/// positive weight) − 0.2 × (negative pattern matches), floored at zero.
/// The best category is accepted when its score reaches 0.3; below that
/// the semantic path (if configured) decides, and any semantic trouble
/// degrades to factual/low instead of failing the query.
///
/// The keyword path is fully deterministic.
pub struct IntentClassifier {
    tables: Vec<CategoryTable>,
    semantic: Option<Arc<dyn GenerationProvider>>,
}

impl IntentClassifier {
    /// Build the classifier with the default pattern tables and no
    /// semantic fallback.
    pub fn new() -> LoreResult<Self> {
        // Patterns are lowercase literals/alternations; queries are
        // lowercased before matching. Scripts without whitespace word
        // separators rarely match and flow to the semantic path instead.
        let tables = vec![
            table(
                IntentCategory::Overview,
                &["what is", "what are", r"\babout\b", "overview", "summar"],
                &["how to", "step by step", "difference", r"\bvs\b|versus"],
            )?,
            table(
                IntentCategory::HowTo,
                &[
                    "how to",
                    "how do i",
                    "how can i",
                    r"\bsteps?\b",
                    r"install|configure|set ?up",
                ],
                &["what is", "difference"],
            )?,
            table(
                IntentCategory::Comparison,
                &[
                    "compar",
                    r"\bvs\b|versus",
                    "difference",
                    r"\bbetween\b",
                    r"\bbetter\b",
                    "pros and cons",
                ],
                &["how to"],
            )?,
            table(
                IntentCategory::Factual,
                &[
                    r"\bwhen\b",
                    r"\bwhere\b",
                    r"\bwho\b",
                    "how many",
                    "how much",
                    r"what version|\bdefine\b",
                ],
                &[],
            )?,
        ];

        Ok(Self {
            tables,
            semantic: None,
        })
    }

    /// Attach a generation provider for the semantic fallback. Chainable.
    pub fn with_semantic(mut self, provider: Arc<dyn GenerationProvider>) -> Self {
        self.semantic = Some(provider);
        self
    }

    /// Keyword scores for every category, in table order.
    pub fn keyword_scores(&self, query: &str) -> Vec<(IntentCategory, f32)> {
        let lowered = query.to_lowercase();
        self.tables
            .iter()
            .map(|t| (t.category, score_table(t, &lowered)))
            .collect()
    }

    /// Classify a query.
    pub async fn classify(&self, query: &str) -> IntentResult {
        let scores = self.keyword_scores(query);
        // First strictly-greater wins, so ties resolve in table order.
        let (mut category, mut score) = scores[0];
        for &(cat, s) in &scores[1..] {
            if s > score {
                category = cat;
                score = s;
            }
        }

        if score >= KEYWORD_ACCEPT {
            let band = if score >= KEYWORD_HIGH {
                ConfidenceBand::High
            } else {
                ConfidenceBand::Medium
            };
            debug!(category = %category, score, "keyword classification");
            return IntentResult {
                category,
                band,
                score,
                method: AnalysisMethod::Keyword,
            };
        }

        match &self.semantic {
            Some(provider) => self.classify_semantic(query, provider.as_ref()).await,
            None => IntentResult::fallback(AnalysisMethod::Disabled),
        }
    }

    async fn classify_semantic(
        &self,
        query: &str,
        provider: &dyn GenerationProvider,
    ) -> IntentResult {
        let prompt = format!("{CLASSIFY_PROMPT}{query}");
        match provider.invoke(&prompt).await {
            Ok(response) => match IntentCategory::parse_loose(&response) {
                Some(category) => {
                    debug!(category = %category, "semantic classification");
                    IntentResult {
                        category,
                        band: ConfidenceBand::Medium,
                        score: 0.5,
                        method: AnalysisMethod::Semantic,
                    }
                }
                None => {
                    warn!(response = %response, "unparseable semantic classification");
                    IntentResult::fallback(AnalysisMethod::Fallback)
                }
            },
            Err(e) => {
                warn!(error = %e, "semantic classification failed");
                IntentResult::fallback(AnalysisMethod::Fallback)
            }
        }
    }
}

fn table(
    category: IntentCategory,
    positive: &[&str],
    negative: &[&str],
) -> LoreResult<CategoryTable> {
    let compile = |p: &&str| -> LoreResult<Regex> {
        Regex::new(p).map_err(|e| LoreError::Validation(format!("bad intent pattern '{p}': {e}")))
    };
    Ok(CategoryTable {
        category,
        positive: positive
            .iter()
            .map(|p| compile(p).map(|r| (r, 1.0)))
            .collect::<LoreResult<Vec<_>>>()?,
        negative: negative.iter().map(|p| compile(p)).collect::<LoreResult<Vec<_>>>()?,
    })
}

fn score_table(table: &CategoryTable, lowered: &str) -> f32 {
    let total: f32 = table.positive.iter().map(|(_, w)| w).sum();
    if total == 0.0 {
        return 0.0;
    }
    let matched: f32 = table
        .positive
        .iter()
        .filter(|(re, _)| re.is_match(lowered))
        .map(|(_, w)| w)
        .sum();
    let negatives = table.negative.iter().filter(|re| re.is_match(lowered)).count() as f32;
    (matched / total - NEGATIVE_PENALTY * negatives).max(0.0)
}
