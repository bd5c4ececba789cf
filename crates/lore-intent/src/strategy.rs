use lore_core::{IntentCategory, LoreError, LoreResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Retrieval tuning for one intent category.
///
/// Invariants (`top_k > 0`, thresholds in [0, 1]) are enforced on
/// construction and on every update; violations are
/// [`LoreError::Validation`] and fail fast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Number of chunks to retrieve.
    pub top_k: usize,
    /// Minimum similarity score for a chunk to be admitted.
    pub score_threshold: f32,
    /// Whether to run the diversity filter.
    pub enable_diversity_filter: bool,
    /// Diversity filter strength; admits candidates with pairwise
    /// similarity below `1 - diversity_threshold`.
    pub diversity_threshold: f32,
    /// Context-expansion flag (currently inert downstream).
    pub enable_context_expansion: bool,
    /// Whether to move structured chunks ahead of regular ones.
    pub prefer_structured: bool,
    /// Whether the summary-first overview path may serve this intent.
    pub summary_first: bool,
}

impl RetrievalConfig {
    /// Check the configuration invariants.
    pub fn validate(&self) -> LoreResult<()> {
        if self.top_k == 0 {
            return Err(LoreError::Validation("top_k must be positive".to_string()));
        }
        if !(0.0..=1.0).contains(&self.score_threshold) {
            return Err(LoreError::Validation(format!(
                "score_threshold {} outside [0, 1]",
                self.score_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.diversity_threshold) {
            return Err(LoreError::Validation(format!(
                "diversity_threshold {} outside [0, 1]",
                self.diversity_threshold
            )));
        }
        Ok(())
    }

    /// The built-in default for an intent category.
    pub fn default_for(intent: IntentCategory) -> Self {
        match intent {
            IntentCategory::Overview => Self {
                top_k: 15,
                score_threshold: 0.2,
                enable_diversity_filter: true,
                diversity_threshold: 0.6,
                enable_context_expansion: true,
                prefer_structured: true,
                summary_first: true,
            },
            IntentCategory::HowTo => Self {
                top_k: 10,
                score_threshold: 0.25,
                enable_diversity_filter: true,
                diversity_threshold: 0.4,
                enable_context_expansion: false,
                prefer_structured: true,
                summary_first: false,
            },
            IntentCategory::Comparison => Self {
                top_k: 12,
                score_threshold: 0.2,
                enable_diversity_filter: true,
                diversity_threshold: 0.7,
                enable_context_expansion: false,
                prefer_structured: false,
                summary_first: false,
            },
            IntentCategory::Factual => Self {
                top_k: 5,
                score_threshold: 0.3,
                enable_diversity_filter: false,
                diversity_threshold: 0.5,
                enable_context_expansion: false,
                prefer_structured: false,
                summary_first: false,
            },
        }
    }
}

/// Partial override of a [`RetrievalConfig`]; unset fields keep the base
/// value. Applied through [`StrategyManager::merge`], which re-validates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetrievalOverrides {
    /// Override for `top_k`.
    pub top_k: Option<usize>,
    /// Override for `score_threshold`.
    pub score_threshold: Option<f32>,
    /// Override for `enable_diversity_filter`.
    pub enable_diversity_filter: Option<bool>,
    /// Override for `diversity_threshold`.
    pub diversity_threshold: Option<f32>,
    /// Override for `enable_context_expansion`.
    pub enable_context_expansion: Option<bool>,
    /// Override for `prefer_structured`.
    pub prefer_structured: Option<bool>,
    /// Override for `summary_first`.
    pub summary_first: Option<bool>,
}

impl RetrievalOverrides {
    /// Merge this patch over a base configuration.
    pub fn apply(&self, base: &RetrievalConfig) -> RetrievalConfig {
        RetrievalConfig {
            top_k: self.top_k.unwrap_or(base.top_k),
            score_threshold: self.score_threshold.unwrap_or(base.score_threshold),
            enable_diversity_filter: self
                .enable_diversity_filter
                .unwrap_or(base.enable_diversity_filter),
            diversity_threshold: self.diversity_threshold.unwrap_or(base.diversity_threshold),
            enable_context_expansion: self
                .enable_context_expansion
                .unwrap_or(base.enable_context_expansion),
            prefer_structured: self.prefer_structured.unwrap_or(base.prefer_structured),
            summary_first: self.summary_first.unwrap_or(base.summary_first),
        }
    }
}

/// Intent → retrieval configuration table with merge-override and reset.
pub struct StrategyManager {
    configs: HashMap<IntentCategory, RetrievalConfig>,
}

impl StrategyManager {
    /// Create a manager holding the default table.
    pub fn new() -> Self {
        let configs = IntentCategory::ALL
            .into_iter()
            .map(|intent| (intent, RetrievalConfig::default_for(intent)))
            .collect();
        Self { configs }
    }

    /// The active configuration for an intent.
    pub fn config_for(&self, intent: IntentCategory) -> RetrievalConfig {
        self.configs
            .get(&intent)
            .cloned()
            .unwrap_or_else(|| RetrievalConfig::default_for(intent))
    }

    /// Replace an intent's configuration after validating it.
    pub fn set(&mut self, intent: IntentCategory, config: RetrievalConfig) -> LoreResult<()> {
        config.validate()?;
        debug!(intent = %intent, "strategy replaced");
        self.configs.insert(intent, config);
        Ok(())
    }

    /// Merge a partial override over an intent's active configuration.
    /// The merged result is validated before it takes effect.
    pub fn merge(
        &mut self,
        intent: IntentCategory,
        overrides: &RetrievalOverrides,
    ) -> LoreResult<RetrievalConfig> {
        let merged = overrides.apply(&self.config_for(intent));
        merged.validate()?;
        self.configs.insert(intent, merged.clone());
        Ok(merged)
    }

    /// Restore the default table for every intent.
    pub fn reset(&mut self) {
        for intent in IntentCategory::ALL {
            self.configs.insert(intent, RetrievalConfig::default_for(intent));
        }
    }

    /// Restore the default configuration for one intent.
    pub fn reset_intent(&mut self, intent: IntentCategory) {
        self.configs.insert(intent, RetrievalConfig::default_for(intent));
    }
}

impl Default for StrategyManager {
    fn default() -> Self {
        Self::new()
    }
}
