use async_trait::async_trait;
use chrono::{DateTime, Utc};
use logvista_core::event::AccessEvent;
use logvista_core::site::SiteId;
use logvista_core::stats::Dimension;
use logvista_core::stats::types::{DimensionRow, StatPoint, TimeWindow};
use logvista_core::store::{EventStore, StoreError};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Wraps a real store and counts query round trips.
pub struct CountingStore {
    inner: Arc<dyn EventStore>,
    reads: AtomicUsize,
}

impl CountingStore {
    pub fn new(inner: Arc<dyn EventStore>) -> Self {
        Self {
            inner,
            reads: AtomicUsize::new(0),
        }
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    fn count(&self) {
        self.reads.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl EventStore for CountingStore {
    async fn ensure_site(&self, site: &SiteId) -> Result<(), StoreError> {
        self.inner.ensure_site(site).await
    }

    async fn insert_batch(&self, site: &SiteId, events: &[AccessEvent]) -> Result<(), StoreError> {
        self.inner.insert_batch(site, events).await
    }

    async fn aggregate(&self, site: &SiteId, window: TimeWindow) -> Result<StatPoint, StoreError> {
        self.count();
        self.inner.aggregate(site, window).await
    }

    async fn hourly(
        &self,
        site: &SiteId,
        start: DateTime<Utc>,
        buckets: usize,
    ) -> Result<Vec<StatPoint>, StoreError> {
        self.count();
        self.inner.hourly(site, start, buckets).await
    }

    async fn breakdown(
        &self,
        site: &SiteId,
        window: TimeWindow,
        dimension: Dimension,
        limit: usize,
    ) -> Result<Vec<DimensionRow>, StoreError> {
        self.count();
        self.inner.breakdown(site, window, dimension, limit).await
    }
}
