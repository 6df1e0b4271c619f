//! Shared fixtures for unit tests.

use crate::enrichment::geoip::Location;
use crate::event::AccessEvent;
use crate::site::SiteId;
use crate::stats::query::Dimension;
use crate::stats::types::{DimensionRow, StatPoint, TimeWindow};
use crate::store::{EventStore, SqliteEventStore, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tempfile::TempDir;

pub(crate) fn event(
    ip: &str,
    timestamp: DateTime<Utc>,
    page_view: bool,
    bytes: u64,
) -> AccessEvent {
    AccessEvent {
        ip: ip.to_string(),
        page_view,
        timestamp,
        method: "GET".to_string(),
        path: "/".to_string(),
        status: if page_view { 200 } else { 404 },
        bytes_sent: bytes,
        referer: "-".to_string(),
        browser: "Chrome".to_string(),
        os: "Windows 10".to_string(),
        device: "desktop".to_string(),
        location: Location::new("Shanghai", "China"),
    }
}

/// A combined-format line as nginx writes it, timestamped in UTC.
pub(crate) fn log_line(
    ip: &str,
    timestamp: DateTime<Utc>,
    path: &str,
    status: u16,
    bytes: u64,
) -> String {
    format!(
        "{ip} - - [{}] \"GET {path} HTTP/1.1\" {status} {bytes} \"-\" \"Mozilla/5.0\"\n",
        timestamp.format("%d/%b/%Y:%H:%M:%S %z")
    )
}

/// A fresh on-disk store; the directory lives as long as the returned guard.
pub(crate) async fn sqlite_store(sites: &[&str]) -> (Arc<SqliteEventStore>, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteEventStore::open(&dir.path().join("events.db"))
        .await
        .unwrap();
    for site in sites {
        store.ensure_site(&SiteId::from(*site)).await.unwrap();
    }
    (Arc::new(store), dir)
}

/// Counts backend round trips and can be told to fail inserts.
pub(crate) struct CountingStore {
    inner: Arc<dyn EventStore>,
    pub(crate) reads: AtomicUsize,
    pub(crate) inserts: AtomicUsize,
    pub(crate) fail_inserts: AtomicBool,
}

impl CountingStore {
    pub(crate) fn new(inner: Arc<dyn EventStore>) -> Self {
        Self {
            inner,
            reads: AtomicUsize::new(0),
            inserts: AtomicUsize::new(0),
            fail_inserts: AtomicBool::new(false),
        }
    }

    pub(crate) fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub(crate) fn inserts(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventStore for CountingStore {
    async fn ensure_site(&self, site: &SiteId) -> Result<(), StoreError> {
        self.inner.ensure_site(site).await
    }

    async fn insert_batch(&self, site: &SiteId, events: &[AccessEvent]) -> Result<(), StoreError> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(StoreError::InvalidSite(format!("{site} (injected failure)")));
        }
        self.inner.insert_batch(site, events).await
    }

    async fn aggregate(&self, site: &SiteId, window: TimeWindow) -> Result<StatPoint, StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.aggregate(site, window).await
    }

    async fn hourly(
        &self,
        site: &SiteId,
        start: DateTime<Utc>,
        buckets: usize,
    ) -> Result<Vec<StatPoint>, StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.hourly(site, start, buckets).await
    }

    async fn breakdown(
        &self,
        site: &SiteId,
        window: TimeWindow,
        dimension: Dimension,
        limit: usize,
    ) -> Result<Vec<DimensionRow>, StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.breakdown(site, window, dimension, limit).await
    }
}
