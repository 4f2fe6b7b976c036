//! Caching layer for source lookup results
//!
//! Maps a variant fingerprint plus source identifier to a previously obtained
//! [`SourceResult`], with bounded capacity and least-recently-used eviction.
//! `Found`/`NotFound` results live for the configured result TTL; `Failed`
//! results use a separate, shorter TTL so a consistently failing source is
//! not hammered but recovers quickly.
//!
//! The cache is a performance optimization, never a correctness dependency:
//! a poisoned lock degrades every access to a miss instead of failing the
//! batch.
//!
//! # Example
//!
//! ```
//! use ferro_annotate::cache::AnnotationCache;
//! use ferro_annotate::config::CacheConfig;
//! use ferro_annotate::annotation::SourceResult;
//! use ferro_annotate::variant::VariantKey;
//!
//! let cache = AnnotationCache::new(CacheConfig::default());
//! let key = VariantKey::new("chr1", 100, "A", "G");
//! cache.put(&key, "clinvar", SourceResult::NotFound);
//! assert!(cache.get(&key, "clinvar").is_some());
//! println!("Cache stats: {:?}", cache.stats());
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};

use crate::annotation::SourceResult;
use crate::config::CacheConfig;
use crate::variant::VariantKey;

/// Cache key: variant fingerprint plus source identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    key: VariantKey,
    source: String,
}

/// A stored lookup result with its insertion timestamp
struct StoredEntry {
    result: SourceResult,
    inserted_at: Instant,
    ttl: Duration,
    /// Access stamp for LRU tracking, bumped on every hit
    last_access: AtomicU64,
}

impl StoredEntry {
    fn is_expired(&self) -> bool {
        self.inserted_at.elapsed() >= self.ttl
    }
}

/// Statistics for cache usage
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Number of cache hits
    pub hits: u64,
    /// Number of cache misses (including expired entries)
    pub misses: u64,
    /// Number of entries currently in cache
    pub size: usize,
    /// Maximum cache capacity
    pub capacity: usize,
    /// Number of LRU evictions
    pub evictions: u64,
    /// Number of entries dropped because their TTL elapsed
    pub expirations: u64,
}

impl CacheStats {
    /// Calculate hit rate as a percentage
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

/// Thread-safe bounded cache for source lookup results
pub struct AnnotationCache {
    entries: RwLock<HashMap<CacheKey, StoredEntry>>,
    config: CacheConfig,
    /// Access counter for LRU tracking
    access_counter: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    expirations: AtomicU64,
}

impl AnnotationCache {
    /// Create a new cache with the given configuration
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: RwLock::new(HashMap::with_capacity(config.capacity.min(1024))),
            config,
            access_counter: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            expirations: AtomicU64::new(0),
        }
    }

    /// Get a live (non-expired) result for a (key, source) pair
    ///
    /// A hit bumps the entry's access stamp. Statistics counters use
    /// `Relaxed` ordering; counts may be slightly inconsistent under heavy
    /// concurrent access, which is acceptable for non-critical statistics.
    pub fn get(&self, key: &VariantKey, source: &str) -> Option<SourceResult> {
        // A poisoned lock degrades to a miss: caching is an optimization,
        // never a correctness dependency.
        let entries = match self.entries.read() {
            Ok(guard) => guard,
            Err(_) => return None,
        };

        let cache_key = CacheKey {
            key: key.clone(),
            source: source.to_string(),
        };

        match entries.get(&cache_key) {
            Some(entry) if !entry.is_expired() => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                let stamp = self.access_counter.fetch_add(1, Ordering::Relaxed);
                entry.last_access.store(stamp, Ordering::Relaxed);
                Some(entry.result.clone())
            }
            Some(_) => {
                // Expired entries count as misses; removal is deferred to the
                // next put so reads stay on the read lock.
                self.expirations.fetch_add(1, Ordering::Relaxed);
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Insert a lookup result for a (key, source) pair
    ///
    /// `Failed` results get the failure TTL, everything else the result TTL.
    /// Entries are immutable once written; an insert over an existing pair
    /// only happens after the previous entry expired.
    pub fn put(&self, key: &VariantKey, source: &str, result: SourceResult) {
        let ttl = if result.is_failed() {
            self.config.failure_ttl
        } else {
            self.config.result_ttl
        };

        let stamp = self.access_counter.fetch_add(1, Ordering::Relaxed);
        let mut entries = match self.entries.write() {
            Ok(guard) => guard,
            Err(_) => return,
        };

        let cache_key = CacheKey {
            key: key.clone(),
            source: source.to_string(),
        };

        if entries.len() >= self.config.capacity && !entries.contains_key(&cache_key) {
            self.make_room(&mut entries);
        }

        entries.insert(
            cache_key,
            StoredEntry {
                result,
                inserted_at: Instant::now(),
                ttl,
                last_access: AtomicU64::new(stamp),
            },
        );
    }

    /// Drop expired entries, then evict the least recently used entry if the
    /// cache is still full
    fn make_room(&self, entries: &mut HashMap<CacheKey, StoredEntry>) {
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired());
        let expired = before - entries.len();
        if expired > 0 {
            self.expirations.fetch_add(expired as u64, Ordering::Relaxed);
        }

        if entries.len() < self.config.capacity {
            return;
        }

        if let Some(lru_key) = entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_access.load(Ordering::Relaxed))
            .map(|(k, _)| k.clone())
        {
            entries.remove(&lru_key);
            self.evictions.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Clear the cache
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let size = self.entries.read().map(|e| e.len()).unwrap_or(0);
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            size,
            capacity: self.config.capacity,
            evictions: self.evictions.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
        }
    }

    /// Get the number of entries in the cache
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for AnnotationCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}
