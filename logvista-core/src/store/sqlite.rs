use crate::event::AccessEvent;
use crate::site::SiteId;
use crate::stats::query::Dimension;
use crate::stats::types::{DimensionRow, StatPoint, TimeWindow};
use crate::store::{EventStore, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow, SqliteSynchronous,
};
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

const SECONDS_PER_HOUR: i64 = 3600;

const STAT_COLUMNS: &str = "COUNT(CASE WHEN pageview_flag = 1 THEN 1 END) AS pv, \
     COUNT(DISTINCT CASE WHEN pageview_flag = 1 THEN ip END) AS uv, \
     COALESCE(SUM(bytes_sent), 0) AS traffic";

pub struct SqliteEventStore {
    pool: SqlitePool,
}

impl SqliteEventStore {
    /// Opens or creates the database file, creating its directory when needed.
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5));
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        debug!(path = %path.display(), "event store opened");
        Ok(Self { pool })
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Stored timestamps are whole seconds: an integer `ts` is at or past `bound`
/// exactly when it is at or past `ceil(bound)`.
fn epoch_secs(instant: DateTime<Utc>) -> i64 {
    instant.timestamp() + i64::from(instant.timestamp_subsec_nanos() > 0)
}

/// Quoted table identifier. Only validated ids reach SQL text.
fn table(site: &SiteId) -> Result<String, StoreError> {
    if site.is_valid() {
        Ok(format!("\"events_{}\"", site.as_str()))
    } else {
        Err(StoreError::InvalidSite(site.to_string()))
    }
}

fn index_name(site: &SiteId, suffix: &str) -> String {
    format!("\"idx_events_{}_{}\"", site.as_str(), suffix)
}

fn unsigned(row: &SqliteRow, column: &'static str) -> Result<u64, StoreError> {
    let value: i64 = row.try_get(column)?;
    u64::try_from(value).map_err(|_| StoreError::Value { column, value })
}

fn stat_point(row: &SqliteRow) -> Result<StatPoint, StoreError> {
    Ok(StatPoint {
        pv: unsigned(row, "pv")?,
        uv: unsigned(row, "uv")?,
        traffic: unsigned(row, "traffic")?,
    })
}

#[async_trait]
impl EventStore for SqliteEventStore {
    async fn ensure_site(&self, site: &SiteId) -> Result<(), StoreError> {
        let table = table(site)?;

        let mut tx = self.pool.begin().await?;
        sqlx::query(&format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                ip TEXT NOT NULL,
                pageview_flag INTEGER NOT NULL DEFAULT 0,
                timestamp INTEGER NOT NULL,
                method TEXT NOT NULL,
                url TEXT NOT NULL,
                status_code INTEGER NOT NULL,
                bytes_sent INTEGER NOT NULL,
                referer TEXT NOT NULL,
                user_browser TEXT NOT NULL,
                user_os TEXT NOT NULL,
                user_device TEXT NOT NULL,
                domestic_location TEXT NOT NULL,
                global_location TEXT NOT NULL
            )"
        ))
        .execute(&mut *tx)
        .await?;
        sqlx::query(&format!(
            "CREATE INDEX IF NOT EXISTS {} ON {table} (timestamp)",
            index_name(site, "ts")
        ))
        .execute(&mut *tx)
        .await?;
        sqlx::query(&format!(
            "CREATE INDEX IF NOT EXISTS {} ON {table} (pageview_flag, timestamp, ip)",
            index_name(site, "pv_ts_ip")
        ))
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(())
    }

    async fn insert_batch(&self, site: &SiteId, events: &[AccessEvent]) -> Result<(), StoreError> {
        if events.is_empty() {
            return Ok(());
        }
        let table = table(site)?;

        let mut builder = QueryBuilder::<Sqlite>::new(format!(
            "INSERT INTO {table} (ip, pageview_flag, timestamp, method, url, status_code, \
             bytes_sent, referer, user_browser, user_os, user_device, domestic_location, \
             global_location) "
        ));
        builder.push_values(events, |mut row, event| {
            row.push_bind(&event.ip)
                .push_bind(i64::from(event.page_view))
                .push_bind(event.timestamp.timestamp())
                .push_bind(&event.method)
                .push_bind(&event.path)
                .push_bind(i64::from(event.status))
                .push_bind(i64::try_from(event.bytes_sent).unwrap_or(i64::MAX))
                .push_bind(&event.referer)
                .push_bind(&event.browser)
                .push_bind(&event.os)
                .push_bind(&event.device)
                .push_bind(&event.location.domestic)
                .push_bind(&event.location.global);
        });

        let mut tx = self.pool.begin().await?;
        builder.build().execute(&mut *tx).await?;
        tx.commit().await?;

        Ok(())
    }

    async fn aggregate(&self, site: &SiteId, window: TimeWindow) -> Result<StatPoint, StoreError> {
        let table = table(site)?;

        let row = sqlx::query(&format!(
            "SELECT {STAT_COLUMNS} FROM {table} WHERE timestamp >= ? AND timestamp < ?"
        ))
        .bind(epoch_secs(window.start))
        .bind(epoch_secs(window.end))
        .fetch_one(&self.pool)
        .await?;

        stat_point(&row)
    }

    async fn hourly(
        &self,
        site: &SiteId,
        start: DateTime<Utc>,
        buckets: usize,
    ) -> Result<Vec<StatPoint>, StoreError> {
        let table = table(site)?;
        let start_ts = start.timestamp();
        let end_ts = start_ts + SECONDS_PER_HOUR * buckets as i64;

        let rows = sqlx::query(&format!(
            "SELECT (timestamp - ?) / {SECONDS_PER_HOUR} AS bucket, {STAT_COLUMNS} \
             FROM {table} WHERE timestamp >= ? AND timestamp < ? \
             GROUP BY bucket"
        ))
        .bind(start_ts)
        .bind(start_ts)
        .bind(end_ts)
        .fetch_all(&self.pool)
        .await?;

        let mut points = vec![StatPoint::default(); buckets];
        for row in &rows {
            let bucket: i64 = row.try_get("bucket")?;
            let slot = usize::try_from(bucket)
                .ok()
                .and_then(|i| points.get_mut(i))
                .ok_or(StoreError::Value {
                    column: "bucket",
                    value: bucket,
                })?;
            *slot = stat_point(row)?;
        }

        Ok(points)
    }

    async fn breakdown(
        &self,
        site: &SiteId,
        window: TimeWindow,
        dimension: Dimension,
        limit: usize,
    ) -> Result<Vec<DimensionRow>, StoreError> {
        let table = table(site)?;
        let column = dimension.column();

        let rows = sqlx::query(&format!(
            "SELECT {column} AS value, {STAT_COLUMNS} \
             FROM {table} WHERE timestamp >= ? AND timestamp < ? \
             GROUP BY {column} \
             ORDER BY uv DESC, pv DESC, value ASC \
             LIMIT ?"
        ))
        .bind(epoch_secs(window.start))
        .bind(epoch_secs(window.end))
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok::<_, StoreError>(DimensionRow {
                    value: row.try_get("value")?,
                    stats: stat_point(row)?,
                })
            })
            .collect()
    }
}
