use crate::mirror::FileCacheMirror;
use chrono::{DateTime, Duration, Utc};
use lore_core::text::{normalize, token_jaccard};
use lore_core::IntentCategory;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tracing::{debug, warn};

/// The four cache key namespaces, each with an independent TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CacheNamespace {
    /// Full answer results, keyed by (query, collection, intent).
    QueryResult,
    /// Intent classifications, keyed globally by query.
    Intent,
    /// Overview answers, keyed by (collection, query).
    Overview,
    /// Document summaries (reserved for the ingestion side).
    DocumentSummary,
}

impl CacheNamespace {
    /// Key prefix for this namespace.
    pub fn prefix(&self) -> &'static str {
        match self {
            CacheNamespace::QueryResult => "qr",
            CacheNamespace::Intent => "intent",
            CacheNamespace::Overview => "ov",
            CacheNamespace::DocumentSummary => "ds",
        }
    }

    /// All namespaces.
    pub const ALL: [CacheNamespace; 4] = [
        CacheNamespace::QueryResult,
        CacheNamespace::Intent,
        CacheNamespace::Overview,
        CacheNamespace::DocumentSummary,
    ];
}

/// Cache tuning: per-namespace TTLs, capacity bounds, fuzzy threshold.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL for query-result entries.
    pub query_result_ttl: Duration,
    /// TTL for intent entries.
    pub intent_ttl: Duration,
    /// TTL for overview entries.
    pub overview_ttl: Duration,
    /// TTL for document-summary entries.
    pub document_summary_ttl: Duration,
    /// Maximum entry count before eviction kicks in.
    pub max_entries: usize,
    /// How many oldest entries one eviction removes.
    pub evict_batch: usize,
    /// Minimum token-Jaccard similarity for a fuzzy query-result hit.
    pub fuzzy_threshold: f32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            query_result_ttl: Duration::days(1),
            intent_ttl: Duration::days(3),
            overview_ttl: Duration::days(7),
            document_summary_ttl: Duration::days(30),
            max_entries: 1000,
            evict_batch: 100,
            fuzzy_threshold: 0.85,
        }
    }
}

impl CacheConfig {
    fn ttl_for(&self, namespace: CacheNamespace) -> Duration {
        match namespace {
            CacheNamespace::QueryResult => self.query_result_ttl,
            CacheNamespace::Intent => self.intent_ttl,
            CacheNamespace::Overview => self.overview_ttl,
            CacheNamespace::DocumentSummary => self.document_summary_ttl,
        }
    }
}

/// One cached record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Full namespaced key.
    pub key: String,
    /// Namespace this entry belongs to.
    pub namespace: CacheNamespace,
    /// The cached payload.
    pub payload: serde_json::Value,
    /// Creation timestamp; drives TTL expiry and eviction order.
    pub created_at: DateTime<Utc>,
    /// Number of reads served, starting at 1 on write.
    pub access_count: u64,
    /// Original query text (query-result entries only, for fuzzy matching).
    #[serde(default)]
    pub query: Option<String>,
    /// Collection scope (query-result entries only).
    #[serde(default)]
    pub collection: Option<String>,
}

/// A point-in-time view of cache occupancy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    /// Total entries across all namespaces.
    pub total: usize,
    /// Entry count per namespace prefix.
    pub per_namespace: HashMap<String, usize>,
    /// Creation time of the oldest entry.
    pub oldest: Option<DateTime<Utc>>,
    /// Creation time of the newest entry.
    pub newest: Option<DateTime<Utc>>,
}

/// Process-wide namespaced TTL cache.
///
/// All mutation happens under a single coarse lock, which makes the
/// capacity-check + evict + insert sequence atomic under concurrent
/// writers. No lock is held across any await point (the API is fully
/// synchronous).
pub struct CacheManager {
    config: CacheConfig,
    entries: Mutex<HashMap<String, CacheEntry>>,
    mirror: Option<FileCacheMirror>,
}

impl CacheManager {
    /// Create a cache with the given configuration and no durable mirror.
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            entries: Mutex::new(HashMap::new()),
            mirror: None,
        }
    }

    /// Create a cache backed by a durable mirror, reloading whatever
    /// non-expired entries the mirror holds. Reload failures degrade to an
    /// empty cache with a warning.
    pub fn with_mirror(config: CacheConfig, mirror: FileCacheMirror) -> Self {
        let now = Utc::now();
        let mut map = HashMap::new();
        match mirror.load() {
            Ok(loaded) => {
                for entry in loaded {
                    if !is_expired(&entry, now, &config) {
                        map.insert(entry.key.clone(), entry);
                    }
                }
                debug!(entries = map.len(), "cache mirror reloaded");
            }
            Err(e) => warn!(error = %e, "cache mirror reload failed, starting empty"),
        }
        Self {
            config,
            entries: Mutex::new(map),
            mirror: Some(mirror),
        }
    }

    // --- query-result namespace ---

    /// Look up a cached answer for (query, collection).
    ///
    /// Exact digest lookup first (trying the supplied intent tag, then the
    /// remaining tags); on miss, a fuzzy scan over same-collection entries
    /// returns the highest token-Jaccard match at or above the configured
    /// threshold. Expired entries encountered on the way are purged.
    pub fn get_query_result(
        &self,
        query: &str,
        collection: &str,
        intent: Option<IntentCategory>,
    ) -> Option<serde_json::Value> {
        let digest = digest(query);
        let now = Utc::now();
        let mut entries = self.entries.lock();

        // Exact lookup across intent tags, preferred tag first.
        let mut tags: Vec<&'static str> = Vec::with_capacity(4);
        if let Some(intent) = intent {
            tags.push(intent.tag());
        }
        for cat in IntentCategory::ALL {
            if !tags.contains(&cat.tag()) {
                tags.push(cat.tag());
            }
        }
        for tag in tags {
            let key = query_result_key(collection, tag, &digest);
            match take_fresh(&mut entries, &key, now, &self.config) {
                Lookup::Hit(payload) => return Some(payload),
                Lookup::Expired | Lookup::Miss => {}
            }
        }

        // Fuzzy scan over same-collection query-result entries.
        let mut expired: Vec<String> = Vec::new();
        let mut best: Option<(String, f32)> = None;
        for entry in entries.values() {
            if entry.namespace != CacheNamespace::QueryResult {
                continue;
            }
            if entry.collection.as_deref() != Some(collection) {
                continue;
            }
            if is_expired(entry, now, &self.config) {
                expired.push(entry.key.clone());
                continue;
            }
            let Some(original) = entry.query.as_deref() else {
                continue;
            };
            let similarity = token_jaccard(query, original);
            if similarity >= self.config.fuzzy_threshold
                && best.as_ref().map_or(true, |(_, s)| similarity > *s)
            {
                best = Some((entry.key.clone(), similarity));
            }
        }
        for key in expired {
            entries.remove(&key);
        }

        let (key, similarity) = best?;
        let entry = entries.get_mut(&key)?;
        entry.access_count += 1;
        debug!(similarity, "fuzzy cache hit");
        Some(entry.payload.clone())
    }

    /// Store an answer under (query, collection, intent).
    pub fn set_query_result(
        &self,
        query: &str,
        collection: &str,
        intent: IntentCategory,
        payload: serde_json::Value,
    ) {
        let key = query_result_key(collection, intent.tag(), &digest(query));
        self.insert(CacheEntry {
            key,
            namespace: CacheNamespace::QueryResult,
            payload,
            created_at: Utc::now(),
            access_count: 1,
            query: Some(query.to_string()),
            collection: Some(collection.to_string()),
        });
    }

    // --- intent namespace (globally keyed) ---

    /// Look up a cached intent classification for a query.
    pub fn get_intent(&self, query: &str) -> Option<serde_json::Value> {
        let key = format!("{}:{}", CacheNamespace::Intent.prefix(), digest(query));
        let now = Utc::now();
        let mut entries = self.entries.lock();
        match take_fresh(&mut entries, &key, now, &self.config) {
            Lookup::Hit(payload) => Some(payload),
            _ => None,
        }
    }

    /// Store an intent classification for a query.
    pub fn set_intent(&self, query: &str, payload: serde_json::Value) {
        let key = format!("{}:{}", CacheNamespace::Intent.prefix(), digest(query));
        self.insert(CacheEntry {
            key,
            namespace: CacheNamespace::Intent,
            payload,
            created_at: Utc::now(),
            access_count: 1,
            query: None,
            collection: None,
        });
    }

    // --- overview namespace ---

    /// Look up a cached overview answer for (collection, query).
    pub fn get_overview(&self, collection: &str, query: &str) -> Option<serde_json::Value> {
        let key = overview_key(collection, &digest(query));
        let now = Utc::now();
        let mut entries = self.entries.lock();
        match take_fresh(&mut entries, &key, now, &self.config) {
            Lookup::Hit(payload) => Some(payload),
            _ => None,
        }
    }

    /// Store an overview answer for (collection, query).
    pub fn set_overview(&self, collection: &str, query: &str, payload: serde_json::Value) {
        let key = overview_key(collection, &digest(query));
        self.insert(CacheEntry {
            key,
            namespace: CacheNamespace::Overview,
            payload,
            created_at: Utc::now(),
            access_count: 1,
            query: None,
            collection: Some(collection.to_string()),
        });
    }

    // --- admin surface ---

    /// Remove all entries, or only those in one namespace. Returns the
    /// number of entries removed.
    pub fn clear(&self, namespace: Option<CacheNamespace>) -> usize {
        let mut entries = self.entries.lock();
        let before = entries.len();
        match namespace {
            None => entries.clear(),
            Some(ns) => {
                let prefix = format!("{}:", ns.prefix());
                entries.retain(|key, _| !key.starts_with(&prefix));
            }
        }
        let removed = before - entries.len();
        self.rewrite_mirror(&entries);
        removed
    }

    /// Occupancy statistics.
    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.lock();
        let mut per_namespace: HashMap<String, usize> = CacheNamespace::ALL
            .iter()
            .map(|ns| (ns.prefix().to_string(), 0))
            .collect();
        let mut oldest: Option<DateTime<Utc>> = None;
        let mut newest: Option<DateTime<Utc>> = None;

        for entry in entries.values() {
            *per_namespace
                .entry(entry.namespace.prefix().to_string())
                .or_insert(0) += 1;
            if oldest.map_or(true, |t| entry.created_at < t) {
                oldest = Some(entry.created_at);
            }
            if newest.map_or(true, |t| entry.created_at > t) {
                newest = Some(entry.created_at);
            }
        }

        CacheStats {
            total: entries.len(),
            per_namespace,
            oldest,
            newest,
        }
    }

    // --- internals ---

    fn insert(&self, entry: CacheEntry) {
        let mut entries = self.entries.lock();
        if entries.len() >= self.config.max_entries {
            let batch = self.config.evict_batch.max(1);
            let mut by_age: Vec<(DateTime<Utc>, String)> = entries
                .values()
                .map(|e| (e.created_at, e.key.clone()))
                .collect();
            by_age.sort();
            for (_, key) in by_age.into_iter().take(batch) {
                entries.remove(&key);
            }
            debug!(evicted = batch, "cache eviction");
            self.rewrite_mirror(&entries);
        }

        if let Some(mirror) = &self.mirror {
            if let Err(e) = mirror.append(&entry) {
                warn!(error = %e, "cache mirror append failed");
            }
        }
        entries.insert(entry.key.clone(), entry);
    }

    fn rewrite_mirror(&self, entries: &HashMap<String, CacheEntry>) {
        if let Some(mirror) = &self.mirror {
            if let Err(e) = mirror.rewrite(entries.values()) {
                warn!(error = %e, "cache mirror rewrite failed");
            }
        }
    }
}

enum Lookup {
    Hit(serde_json::Value),
    Expired,
    Miss,
}

/// Exact-key lookup with lazy expiry: a fresh hit increments the access
/// counter; an expired entry is removed on the spot.
fn take_fresh(
    entries: &mut HashMap<String, CacheEntry>,
    key: &str,
    now: DateTime<Utc>,
    config: &CacheConfig,
) -> Lookup {
    let Some(entry) = entries.get_mut(key) else {
        return Lookup::Miss;
    };
    if is_expired(entry, now, config) {
        entries.remove(key);
        return Lookup::Expired;
    }
    entry.access_count += 1;
    Lookup::Hit(entry.payload.clone())
}

fn is_expired(entry: &CacheEntry, now: DateTime<Utc>, config: &CacheConfig) -> bool {
    now - entry.created_at > config.ttl_for(entry.namespace)
}

/// Hex sha256 digest over normalized text.
fn digest(text: &str) -> String {
    let normalized = normalize(text);
    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    hex::encode(hasher.finalize())
}

fn query_result_key(collection: &str, tag: &str, digest: &str) -> String {
    format!(
        "{}:{collection}:{tag}:{digest}",
        CacheNamespace::QueryResult.prefix()
    )
}

fn overview_key(collection: &str, digest: &str) -> String {
    format!("{}:{collection}:{digest}", CacheNamespace::Overview.prefix())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn cache() -> CacheManager {
        CacheManager::new(CacheConfig::default())
    }

    #[test]
    fn test_set_then_get_exact() {
        let cache = cache();
        let payload = serde_json::json!({ "answer": "42" });
        cache.set_query_result("what is this", "docs", IntentCategory::Factual, payload.clone());

        let hit = cache
            .get_query_result("what is this", "docs", Some(IntentCategory::Factual))
            .unwrap();
        assert_eq!(hit, payload);
    }

    #[test]
    fn test_get_without_intent_finds_any_tag() {
        let cache = cache();
        cache.set_query_result(
            "what is this",
            "docs",
            IntentCategory::Overview,
            serde_json::json!(1),
        );
        assert!(cache.get_query_result("what is this", "docs", None).is_some());
    }

    #[test]
    fn test_normalization_shares_keys() {
        let cache = cache();
        cache.set_query_result("What is   this?", "docs", IntentCategory::Factual, serde_json::json!(1));
        // Same normalized text, different punctuation/case.
        assert!(cache
            .get_query_result("what is this", "docs", Some(IntentCategory::Factual))
            .is_some());
    }

    #[test]
    fn test_access_count_increments_once_per_get() {
        let cache = cache();
        cache.set_query_result("q", "docs", IntentCategory::Factual, serde_json::json!(1));
        cache.get_query_result("q", "docs", Some(IntentCategory::Factual));
        cache.get_query_result("q", "docs", Some(IntentCategory::Factual));

        let entries = cache.entries.lock();
        let entry = entries.values().next().unwrap();
        assert_eq!(entry.access_count, 3); // 1 on write + 2 gets
    }

    #[test]
    fn test_fuzzy_hit_over_stopword_noise() {
        let cache = cache();
        cache.set_query_result(
            "how to configure the vector index backend",
            "docs",
            IntentCategory::HowTo,
            serde_json::json!({ "answer": "cached" }),
        );

        // One extra token: Jaccard 7/8 = 0.875, above the 0.85 default.
        let hit = cache.get_query_result(
            "how to configure the vector search index backend",
            "docs",
            None,
        );
        assert!(hit.is_some());
    }

    #[test]
    fn test_fuzzy_scoped_to_collection() {
        let cache = cache();
        cache.set_query_result(
            "how to configure the vector index backend",
            "docs",
            IntentCategory::HowTo,
            serde_json::json!(1),
        );
        let miss = cache.get_query_result(
            "how to configure the vector search index backend",
            "other-collection",
            None,
        );
        assert!(miss.is_none());
    }

    #[test]
    fn test_dissimilar_query_misses() {
        let cache = cache();
        cache.set_query_result("alpha beta gamma delta", "docs", IntentCategory::Factual, serde_json::json!(1));
        assert!(cache
            .get_query_result("completely different words", "docs", None)
            .is_none());
    }

    #[test]
    fn test_intent_namespace_is_global() {
        let cache = cache();
        cache.set_intent("what is this", serde_json::json!({ "category": "overview" }));
        assert!(cache.get_intent("What is this?").is_some());
    }

    #[test]
    fn test_eviction_removes_oldest_batch() {
        let config = CacheConfig {
            max_entries: 5,
            evict_batch: 2,
            ..Default::default()
        };
        let cache = CacheManager::new(config);
        for i in 0..5 {
            cache.set_intent(&format!("query number {i}"), serde_json::json!(i));
            // Distinct timestamps for deterministic age ordering.
            std::thread::sleep(std::time::Duration::from_millis(2));
        }
        assert_eq!(cache.stats().total, 5);

        cache.set_intent("query number 5", serde_json::json!(5));
        // 5 - 2 evicted + 1 inserted
        assert_eq!(cache.stats().total, 4);
        // The two oldest are gone.
        assert!(cache.get_intent("query number 0").is_none());
        assert!(cache.get_intent("query number 1").is_none());
        assert!(cache.get_intent("query number 4").is_some());
    }

    #[test]
    fn test_clear_by_namespace() {
        let cache = cache();
        cache.set_intent("q1", serde_json::json!(1));
        cache.set_query_result("q2", "docs", IntentCategory::Factual, serde_json::json!(2));
        cache.set_overview("docs", "q3", serde_json::json!(3));

        let removed = cache.clear(Some(CacheNamespace::Intent));
        assert_eq!(removed, 1);
        assert_eq!(cache.stats().total, 2);

        let removed = cache.clear(None);
        assert_eq!(removed, 2);
        assert_eq!(cache.stats().total, 0);
    }

    #[test]
    fn test_stats_shape() {
        let cache = cache();
        cache.set_intent("q1", serde_json::json!(1));
        cache.set_query_result("q2", "docs", IntentCategory::Factual, serde_json::json!(2));

        let stats = cache.stats();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.per_namespace["intent"], 1);
        assert_eq!(stats.per_namespace["qr"], 1);
        assert_eq!(stats.per_namespace["ov"], 0);
        assert!(stats.oldest.is_some());
        assert!(stats.newest.is_some());
        assert!(stats.oldest <= stats.newest);
    }

    #[test]
    fn test_expired_entry_not_returned_and_purged() {
        let config = CacheConfig {
            intent_ttl: Duration::milliseconds(5),
            ..Default::default()
        };
        let cache = CacheManager::new(config);
        cache.set_intent("short lived", serde_json::json!(1));
        std::thread::sleep(std::time::Duration::from_millis(20));

        assert!(cache.get_intent("short lived").is_none());
        // Purged on access, not just hidden.
        assert_eq!(cache.stats().total, 0);
    }
}
