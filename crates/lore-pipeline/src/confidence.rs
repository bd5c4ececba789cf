//! Confidence scoring for generated answers.
//!
//! The constants here (the 2x average multiplier, per-intent caps and
//! bonuses, band weights) are load-bearing: tests and callers depend on the
//! exact numbers, so they are kept as-is rather than tuned.

use lore_core::{ConfidenceBand, IntentCategory, RetrievedChunk};

/// Confidence for a strategy-based answer.
///
/// `min(cap, base + bonus) × band_weight` where `base = min(avg_score × 2,
/// 0.9)`. Overview earns a quantity bonus (`min(count/15, 0.2)`, cap 0.95),
/// how-to a procedural bonus (`min(procedural/3, 0.15)`, cap 0.95), other
/// intents cap at 0.9 with no bonus. Band weights: high 1.0, medium 0.9,
/// low 0.8. Empty input scores 0.
pub fn strategy_confidence(
    intent: IntentCategory,
    band: ConfidenceBand,
    chunks: &[RetrievedChunk],
) -> f32 {
    if chunks.is_empty() {
        return 0.0;
    }
    let avg = chunks.iter().map(|c| c.score).sum::<f32>() / chunks.len() as f32;
    let base = (avg * 2.0).min(0.9);

    let (bonus, cap) = match intent {
        IntentCategory::Overview => ((chunks.len() as f32 / 15.0).min(0.2), 0.95),
        IntentCategory::HowTo => {
            let procedural = chunks.iter().filter(|c| c.procedural).count();
            ((procedural as f32 / 3.0).min(0.15), 0.95)
        }
        IntentCategory::Comparison | IntentCategory::Factual => (0.0, 0.9),
    };

    let weight = match band {
        ConfidenceBand::High => 1.0,
        ConfidenceBand::Medium => 0.9,
        ConfidenceBand::Low => 0.8,
    };

    (base + bonus).min(cap) * weight
}

/// Confidence for a summary-based overview answer.
///
/// `min(0.98, base + quantity_bonus + diversity_bonus)` with `base =
/// min(avg_score × 2, 0.9)`, `quantity_bonus = min(count/10, 0.2)`, and
/// `diversity_bonus = min(unique_sources/15, 0.15)`.
pub fn overview_confidence(avg_score: f32, count: usize, unique_sources: usize) -> f32 {
    if count == 0 {
        return 0.0;
    }
    let base = (avg_score * 2.0).min(0.9);
    let quantity = (count as f32 / 10.0).min(0.2);
    let diversity = (unique_sources as f32 / 15.0).min(0.15);
    (base + quantity + diversity).min(0.98)
}
