use serde::{Deserialize, Serialize};
use std::fmt;

/// The classified purpose of a user query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IntentCategory {
    /// Broad "what is this about" queries, answered summary-first.
    Overview,
    /// Procedural "how do I" queries.
    HowTo,
    /// Queries weighing two or more things against each other.
    Comparison,
    /// Specific fact lookups. The default when nothing else matches.
    Factual,
}

impl IntentCategory {
    /// All categories, in classification-table order.
    pub const ALL: [IntentCategory; 4] = [
        IntentCategory::Overview,
        IntentCategory::HowTo,
        IntentCategory::Comparison,
        IntentCategory::Factual,
    ];

    /// Stable tag used in cache keys and source annotations.
    pub fn tag(&self) -> &'static str {
        match self {
            IntentCategory::Overview => "overview",
            IntentCategory::HowTo => "how-to",
            IntentCategory::Comparison => "comparison",
            IntentCategory::Factual => "factual",
        }
    }

    /// Parse a category from a provider response token.
    ///
    /// Accepts the tag spelling as well as common loose spellings
    /// ("howto", "how to"). Case-insensitive. Returns `None` for anything
    /// else; callers degrade to [`IntentCategory::Factual`].
    pub fn parse_loose(s: &str) -> Option<Self> {
        let token = s.trim().trim_matches(|c: char| !c.is_alphanumeric());
        match token.to_lowercase().as_str() {
            "overview" => Some(IntentCategory::Overview),
            "howto" | "how-to" | "how_to" => Some(IntentCategory::HowTo),
            "comparison" | "compare" => Some(IntentCategory::Comparison),
            "factual" | "fact" => Some(IntentCategory::Factual),
            _ => None,
        }
    }
}

impl fmt::Display for IntentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Confidence band attached to an [`IntentResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceBand {
    /// Strong keyword evidence (score >= 0.5).
    High,
    /// Keyword evidence above the acceptance threshold, or semantic result.
    Medium,
    /// Defaulted or degraded classification.
    Low,
}

/// How an intent classification was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisMethod {
    /// Pattern-table scoring. Deterministic.
    Keyword,
    /// Generation-provider classification after inconclusive keywords.
    Semantic,
    /// Semantic path failed; degraded to the default category.
    Fallback,
    /// No provider configured and keywords inconclusive.
    Disabled,
}

/// The outcome of classifying a query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentResult {
    /// The winning category.
    pub category: IntentCategory,
    /// Confidence band for downstream weighting.
    pub band: ConfidenceBand,
    /// The numeric keyword score of the winning category (0 when the
    /// keyword path was inconclusive and a non-keyword method decided).
    pub score: f32,
    /// Which path produced this result.
    pub method: AnalysisMethod,
}

impl IntentResult {
    /// The degraded default: factual, low confidence.
    pub fn fallback(method: AnalysisMethod) -> Self {
        Self {
            category: IntentCategory::Factual,
            band: ConfidenceBand::Low,
            score: 0.0,
            method,
        }
    }
}
