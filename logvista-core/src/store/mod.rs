//! Persistence gateway for classified events.

mod sqlite;


pub use sqlite::SqliteEventStore;

use crate::event::AccessEvent;
use crate::site::SiteId;
use crate::stats::query::Dimension;
use crate::stats::types::{DimensionRow, StatPoint, TimeWindow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("site id '{0}' cannot be used as a table name")]
    InvalidSite(String),

    #[error("column {column} holds out-of-range value {value}")]
    Value { column: &'static str, value: i64 },

    #[error("failed to prepare database directory: {0}")]
    Io(#[from] std::io::Error),
}

/// Append-only event storage with the aggregate queries the stats engine needs.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Idempotent. Must run before the first insert or query for `site`.
    async fn ensure_site(&self, site: &SiteId) -> Result<(), StoreError>;

    /// All rows become visible together or not at all.
    async fn insert_batch(&self, site: &SiteId, events: &[AccessEvent]) -> Result<(), StoreError>;

    async fn aggregate(&self, site: &SiteId, window: TimeWindow) -> Result<StatPoint, StoreError>;

    /// `buckets` consecutive one-hour aggregates starting at `start`. Always `buckets` long.
    async fn hourly(
        &self,
        site: &SiteId,
        start: DateTime<Utc>,
        buckets: usize,
    ) -> Result<Vec<StatPoint>, StoreError>;

    /// Ordered by uv desc, then pv desc, then value asc.
    async fn breakdown(
        &self,
        site: &SiteId,
        window: TimeWindow,
        dimension: Dimension,
        limit: usize,
    ) -> Result<Vec<DimensionRow>, StoreError>;
}
