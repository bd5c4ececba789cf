//! Query intent classification and retrieval strategy management.
//!
//! The classifier scores a query against per-category keyword pattern
//! tables and only falls back to a generation provider when keywords are
//! inconclusive; the strategy manager maps each intent category to a
//! validated retrieval configuration.
//!
//! # Main types
//!
//! - [`IntentClassifier`] — Pattern-table scoring with optional semantic
//!   fallback.
//! - [`StrategyManager`] — Intent → [`RetrievalConfig`] table with
//!   merge-override and reset.

/// Intent classifier.
pub mod classifier;
/// Retrieval strategy configuration and manager.
pub mod strategy;

pub use classifier::IntentClassifier;
pub use strategy::{RetrievalConfig, RetrievalOverrides, StrategyManager};
