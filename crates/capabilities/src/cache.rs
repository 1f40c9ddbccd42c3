//! In-memory caches for raw HTTP responses and parsed capability documents.
//!
//! Entries are written once per key: a second insert for a key that already
//! holds a live value keeps the first value. An optional TTL bounds how long
//! an entry is served; without one entries live until invalidated.

use metrics::counter;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info};

use wms_protocol::CapabilityDocument;

use crate::config::ClientConfig;

struct Entry<V> {
    value: V,
    inserted_at: Instant,
}

/// Hit/miss counters and current size of one cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

/// A keyed, write-once cache shared between concurrent requests.
pub struct MemoCache<V> {
    name: &'static str,
    ttl: Option<Duration>,
    entries: RwLock<HashMap<String, Entry<V>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<V: Clone> MemoCache<V> {
    pub fn new(name: &'static str, ttl: Option<Duration>) -> Self {
        info!(cache = name, ttl_secs = ?ttl.map(|t| t.as_secs()), "Initializing capabilities cache");
        Self {
            name,
            ttl,
            entries: RwLock::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    fn is_live(&self, entry: &Entry<V>) -> bool {
        self.ttl
            .map(|ttl| entry.inserted_at.elapsed() < ttl)
            .unwrap_or(true)
    }

    /// Get a live value for `key`.
    pub async fn get(&self, key: &str) -> Option<V> {
        let guard = self.entries.read().await;
        match guard.get(key) {
            Some(entry) if self.is_live(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                counter!("capabilities_cache_hits_total", "cache" => self.name).increment(1);
                debug!(cache = self.name, key = key, "Cache hit");
                Some(entry.value.clone())
            }
            Some(_) => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                counter!("capabilities_cache_misses_total", "cache" => self.name).increment(1);
                debug!(cache = self.name, key = key, "Cache entry expired");
                None
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                counter!("capabilities_cache_misses_total", "cache" => self.name).increment(1);
                debug!(cache = self.name, key = key, "Cache miss");
                None
            }
        }
    }

    /// Store `value` unless a live value is already present, and return the
    /// value the cache now holds.
    pub async fn insert(&self, key: String, value: V) -> V {
        let mut guard = self.entries.write().await;
        if let Some(existing) = guard.get(&key) {
            if self.is_live(existing) {
                return existing.value.clone();
            }
        }
        debug!(cache = self.name, key = %key, "Cached entry");
        guard.insert(
            key,
            Entry {
                value: value.clone(),
                inserted_at: Instant::now(),
            },
        );
        value
    }

    /// Drop the entry for `key`. Returns whether one was present.
    pub async fn invalidate(&self, key: &str) -> bool {
        let removed = self.entries.write().await.remove(key).is_some();
        if removed {
            debug!(cache = self.name, key = key, "Cache entry invalidated");
        }
        removed
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
        debug!(cache = self.name, "Cache cleared");
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.len().await,
        }
    }
}

/// Raw response bodies keyed by exact request URL.
pub type ResponseCache = MemoCache<Arc<str>>;

/// Parsed documents keyed by canonical capabilities URL.
pub type DocumentCache = MemoCache<Arc<CapabilityDocument>>;

/// The two caches, built once and shared by every negotiation.
#[derive(Clone)]
pub struct CacheStores {
    pub responses: Arc<ResponseCache>,
    pub documents: Arc<DocumentCache>,
}

impl CacheStores {
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            responses: Arc::new(MemoCache::new("capabilities_http", ttl)),
            documents: Arc::new(MemoCache::new("capabilities_parse", ttl)),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.cache_ttl())
    }

    /// Empty both caches.
    pub async fn clear(&self) {
        self.responses.clear().await;
        self.documents.clear().await;
    }
}

impl Default for CacheStores {
    fn default() -> Self {
        Self::new(None)
    }
}
