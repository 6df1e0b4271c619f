use crate::clock::Clock;
use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

struct CacheEntry<V> {
    value: Arc<V>,
    inserted_at: DateTime<Utc>,
}

/// Time-bounded memo of query results keyed by query shape.
///
/// Entries older than the TTL are misses and are overwritten by the next `set`.
pub struct ResultCache<V> {
    entries: DashMap<String, CacheEntry<V>>,
    ttl: TimeDelta,
    clock: Arc<dyn Clock>,
}

impl<V> ResultCache<V> {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            ttl: TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX),
            clock,
        }
    }

    fn is_fresh(&self, entry: &CacheEntry<V>, now: DateTime<Utc>) -> bool {
        now - entry.inserted_at < self.ttl
    }

    pub fn get(&self, key: &str) -> Option<Arc<V>> {
        let now = self.clock.now();
        let entry = self.entries.get(key)?;
        if self.is_fresh(&entry, now) {
            trace!(key, "cache hit");
            Some(Arc::clone(&entry.value))
        } else {
            None
        }
    }

    pub fn set(&self, key: impl Into<String>, value: Arc<V>) {
        self.entries.insert(
            key.into(),
            CacheEntry {
                value,
                inserted_at: self.clock.now(),
            },
        );
    }

    /// Returns how many entries were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| self.is_fresh(entry, now));
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
