use crate::scan::ScanResult;
use crate::server::setup::App;
use std::sync::Arc;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;

/// Totals of one pass over all sites.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PassSummary {
    pub sites: usize,
    pub entries: usize,
    pub dropped: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl PassSummary {
    pub fn from_results(results: &[ScanResult]) -> Self {
        results.iter().fold(
            PassSummary {
                sites: results.len(),
                ..Default::default()
            },
            |mut acc, r| {
                acc.entries += r.entries_read;
                acc.dropped += r.entries_dropped;
                acc.failed += usize::from(r.error.is_some());
                acc.skipped += usize::from(r.skipped);
                acc
            },
        )
    }
}

/// Scans immediately, then once per `scan_interval` until cancelled.
pub async fn run_periodic_scans(app: Arc<App>, cancel: CancellationToken) {
    let mut ticker = interval_at(Instant::now() + app.scan_interval, app.scan_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tracing::info!(
        interval_secs = app.scan_interval.as_secs(),
        "scheduler started"
    );
    run_scan_pass(&app, &cancel).await;

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                run_scan_pass(&app, &cancel).await;
            }
        }
    }

    tracing::info!("scheduler stopping");
}

/// One pass: scan every site, drop rollups the new data touches, purge stale cache entries.
pub async fn run_scan_pass(app: &App, cancel: &CancellationToken) -> Vec<ScanResult> {
    let results = app.scanner.scan_all(&app.sites, cancel).await;

    for result in &results {
        if let Some(earliest) = result.earliest_event {
            app.stats.engine().invalidate_from(&result.site, earliest);
        }
    }
    let purged = app.stats.purge_expired();

    let summary = PassSummary::from_results(&results);
    tracing::info!(
        sites = summary.sites,
        entries = summary.entries,
        dropped = summary.dropped,
        failed = summary.failed,
        skipped = summary.skipped,
        cache_purged = purged,
        "scan pass complete"
    );

    results
}
