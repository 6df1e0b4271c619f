use crate::clock::{Clock, SystemClock};
use crate::cursor::CursorStore;
use crate::enrichment::geoip::GeoEnricher;
use crate::event::{AccessEvent, Classifier};
use crate::scan::result::{ScanError, ScanResult};
use crate::site::{Site, SiteRegistry};
use crate::store::EventStore;
use chrono::{DateTime, Utc};
use std::io::SeekFrom;
use std::sync::Arc;
use std::time::Instant;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncSeekExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Incremental reader: each scan ingests only the bytes appended since the last one.
pub struct Scanner {
    store: Arc<dyn EventStore>,
    cursors: Arc<CursorStore>,
    classifier: Arc<Classifier>,
    geo: GeoEnricher,
    clock: Arc<dyn Clock>,
    batch_size: usize,
}

struct Batch {
    events: Vec<AccessEvent>,
    dropped: usize,
    earliest: Option<DateTime<Utc>>,
}

impl Scanner {
    pub fn new(
        store: Arc<dyn EventStore>,
        cursors: Arc<CursorStore>,
        classifier: Arc<Classifier>,
        geo: GeoEnricher,
    ) -> Self {
        Self {
            store,
            cursors,
            classifier,
            geo,
            clock: Arc::new(SystemClock),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Scans every site in order, then persists all cursors once.
    ///
    /// Cancellation is observed between sites: the running site completes and the
    /// remaining ones are reported as skipped.
    pub async fn scan_all(
        &self,
        sites: &SiteRegistry,
        cancel: &CancellationToken,
    ) -> Vec<ScanResult> {
        let mut results = Vec::with_capacity(sites.len());
        for site in sites.iter() {
            if cancel.is_cancelled() {
                debug!(site = %site.id, "shutdown requested, skipping site");
                results.push(ScanResult::skipped(site));
                continue;
            }
            results.push(self.scan(site).await);
        }

        let cursors = Arc::clone(&self.cursors);
        match tokio::task::spawn_blocking(move || cursors.persist_all()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!(error = %e, "failed to persist scan cursors"),
            Err(e) => error!(error = %e, "cursor persist task failed"),
        }

        results
    }

    pub async fn scan(&self, site: &Site) -> ScanResult {
        let started = Instant::now();
        let mut result = ScanResult::empty(site);

        if let Err(e) = self.scan_into(site, &mut result).await {
            warn!(site = %site.id, error = %e, "scan failed");
            result.error = Some(e);
        }

        result.duration = started.elapsed();
        if result.entries_read > 0 || result.error.is_some() {
            info!(
                site = %site.id,
                entries = result.entries_read,
                dropped = result.entries_dropped,
                bytes = result.bytes_read,
                elapsed_ms = result.duration.as_millis() as u64,
                "site scanned"
            );
        }
        result
    }

    async fn scan_into(&self, site: &Site, result: &mut ScanResult) -> Result<(), ScanError> {
        let io_err = |source| ScanError::Io {
            path: site.log_path.clone(),
            source,
        };

        let mut file = File::open(&site.log_path).await.map_err(io_err)?;
        let size = file.metadata().await.map_err(io_err)?.len();

        let cursor = self.cursors.cursor_for(&site.id);
        let start = if size < cursor.size {
            warn!(
                site = %site.id,
                previous_size = cursor.size,
                size,
                "log rotation detected"
            );
            result.rotated = true;
            0
        } else {
            cursor.offset.min(size)
        };

        if start < size {
            self.store.ensure_site(&site.id).await?;
            file.seek(SeekFrom::Start(start)).await.map_err(io_err)?;
            self.ingest_range(site, file, size - start, result)
                .await
                .map_err(io_err)?;
        }

        self.cursors.advance(&site.id, size, size, self.clock.now());
        Ok(())
    }

    /// Reads at most `len` bytes, so anything appended after the stat waits for the next scan.
    async fn ingest_range(
        &self,
        site: &Site,
        file: File,
        len: u64,
        result: &mut ScanResult,
    ) -> std::io::Result<()> {
        let mut reader = BufReader::new(file.take(len));
        let mut batch = Batch {
            events: Vec::with_capacity(self.batch_size),
            dropped: 0,
            earliest: None,
        };
        let mut line = Vec::new();

        // Flush what was read so far even when the read fails midway.
        let outcome = loop {
            line.clear();
            let n = match reader.read_until(b'\n', &mut line).await {
                Ok(0) => break Ok(()),
                Ok(n) => n,
                Err(e) => break Err(e),
            };
            result.bytes_read += n as u64;

            let text = String::from_utf8_lossy(&line);
            let text = text.trim_end_matches(['\n', '\r']);
            if text.is_empty() {
                continue;
            }

            let mut event = match self.classifier.classify(text) {
                Ok(event) => event,
                Err(e) => {
                    trace!(site = %site.id, error = %e, "skipping malformed line");
                    continue;
                }
            };
            event.location = self.geo.locate(&event.ip).await;
            result.entries_read += 1;
            batch.events.push(event);

            if batch.events.len() >= self.batch_size {
                self.flush(site, &mut batch).await;
            }
        };

        self.flush(site, &mut batch).await;
        result.entries_dropped = batch.dropped;
        result.earliest_event = batch.earliest;
        outcome
    }

    /// A failed flush loses its batch; scanning continues.
    async fn flush(&self, site: &Site, batch: &mut Batch) {
        if batch.events.is_empty() {
            return;
        }

        match self.store.insert_batch(&site.id, &batch.events).await {
            Ok(()) => {
                let oldest = batch.events.iter().map(|e| e.timestamp).min();
                batch.earliest = match (batch.earliest, oldest) {
                    (Some(a), Some(b)) => Some(a.min(b)),
                    (a, b) => a.or(b),
                };
                trace!(site = %site.id, rows = batch.events.len(), "batch flushed");
            }
            Err(e) => {
                error!(
                    site = %site.id,
                    rows = batch.events.len(),
                    error = %e,
                    "failed to flush batch, dropping it"
                );
                batch.dropped += batch.events.len();
            }
        }
        batch.events.clear();
    }
}
