use crate::backend::{CacheBackend, CachedResponse};
use moka::Expiry;
use moka::sync::Cache;
use std::time::{Duration, Instant};
use tracing::trace;

const DEFAULT_CAPACITY: u64 = 10_000;

#[derive(Debug, Clone)]
struct Entry {
    response: CachedResponse,
    ttl: Duration,
}

/// Each entry lives for the expiration it was stored with.
#[derive(Debug)]
struct PerEntryExpiry;

impl Expiry<String, Entry> for PerEntryExpiry {
    fn expire_after_create(&self, _key: &String, value: &Entry, _created_at: Instant) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// In-process backend on top of `moka`, bounded by entry count.
#[derive(Debug, Clone)]
pub struct MemoryCache {
    entries: Cache<String, Entry>,
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl MemoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(capacity: u64) -> Self {
        let entries = Cache::builder().max_capacity(capacity).expire_after(PerEntryExpiry).build();
        Self { entries }
    }

    /// Number of live entries after pending maintenance has run.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.entries.run_pending_tasks();
        self.entries.entry_count()
    }
}

impl CacheBackend for MemoryCache {
    fn get(&self, key: &str) -> Option<CachedResponse> {
        let hit = self.entries.get(key).map(|entry| entry.response);
        trace!(key, hit = hit.is_some(), "Cache lookup");
        hit
    }

    fn set(&self, key: String, value: CachedResponse, expiration: Duration) {
        trace!(key = %key, ttl = ?expiration, "Cache store");
        self.entries.insert(key, Entry { response: value, ttl: expiration });
    }

    fn delete(&self, key: &str) {
        self.entries.invalidate(key);
    }
}
