//! Namespaced, TTL-based, capacity-bounded cache for the Lore pipeline.
//!
//! One [`CacheManager`] instance is shared across the process (owned by the
//! orchestrator, injected — never a module-level singleton). It supports
//! exact lookup by normalized-text digest and fuzzy lookup by token-set
//! Jaccard similarity over the original query text, lazy expiry, and
//! oldest-first batch eviction at capacity. An optional file mirror makes
//! entries survive restarts; all mirror I/O trouble degrades to a logged
//! no-op, never a failed query.
//!
//! # Main types
//!
//! - [`CacheManager`] — The process-wide cache.
//! - [`CacheConfig`] — TTLs, capacity, fuzzy threshold.
//! - [`CacheNamespace`] — The four key namespaces.
//! - [`FileCacheMirror`] — JSONL durable mirror.

/// Cache manager, entries, and configuration.
pub mod manager;
/// Durable JSONL mirror.
pub mod mirror;

pub use manager::{CacheConfig, CacheEntry, CacheManager, CacheNamespace, CacheStats};
pub use mirror::FileCacheMirror;
