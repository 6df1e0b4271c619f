use crate::clock::ManualClock;
use crate::cursor::CursorStore;
use crate::enrichment::geoip::GeoEnricher;
use crate::event::{Classifier, PageViewFilter};
use crate::scan::{ScanError, Scanner};
use crate::site::{Site, SiteId, SiteRegistry};
use crate::stats::types::{StatPoint, TimeWindow};
use crate::store::EventStore;
use crate::test_support::{CountingStore, log_line, sqlite_store};
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use pretty_assertions::assert_eq;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

struct Fixture {
    dir: TempDir,
    _db_dir: TempDir,
    store: Arc<CountingStore>,
    cursors: Arc<CursorStore>,
    scanner: Scanner,
    site: Site,
}

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 10, 10, 2, 0, 0).unwrap()
}

async fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let (sqlite, db_dir) = sqlite_store(&[]).await;
    let store = Arc::new(CountingStore::new(sqlite));
    let cursors = Arc::new(CursorStore::open(dir.path().join("scan_state.json")).unwrap());
    let classifier = Arc::new(Classifier::new(PageViewFilter::default(), None));
    let scanner = Scanner::new(store.clone(), cursors.clone(), classifier, GeoEnricher::disabled())
        .with_batch_size(100)
        .with_clock(Arc::new(ManualClock::new(base_time() + TimeDelta::hours(1))));
    let site = Site {
        id: SiteId::from("blog"),
        name: "Blog".to_string(),
        log_path: dir.path().join("access.log"),
    };

    Fixture {
        dir,
        _db_dir: db_dir,
        store,
        cursors,
        scanner,
        site,
    }
}

fn append_lines(path: &Path, count: usize, first_index: usize) {
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .unwrap();
    for i in first_index..first_index + count {
        let ip = format!("10.0.{}.{}", i / 250, i % 250);
        let ts = base_time() + TimeDelta::seconds(i as i64);
        file.write_all(log_line(&ip, ts, "/index.html", 200, 100).as_bytes())
            .unwrap();
    }
}

fn file_len(path: &Path) -> u64 {
    std::fs::metadata(path).unwrap().len()
}

async fn total(fixture: &Fixture) -> StatPoint {
    fixture
        .store
        .aggregate(
            &fixture.site.id,
            TimeWindow::new(base_time() - TimeDelta::days(1), base_time() + TimeDelta::days(1)),
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn scan_consumes_the_file_and_a_rescan_reads_nothing() {
    // Arrange
    let f = fixture().await;
    append_lines(&f.site.log_path, 3, 0);

    // Act
    let first = f.scanner.scan(&f.site).await;
    let second = f.scanner.scan(&f.site).await;

    // Assert
    assert!(first.is_ok());
    assert_eq!(first.entries_read, 3);
    assert_eq!(second.entries_read, 0);
    let cursor = f.cursors.cursor_for(&f.site.id);
    assert_eq!(cursor.offset, file_len(&f.site.log_path));
    assert_eq!(cursor.size, cursor.offset);
    assert_eq!(total(&f).await, StatPoint::new(3, 3, 300));
}

#[tokio::test]
async fn appended_lines_are_ingested_exactly_once() {
    // Arrange
    let f = fixture().await;
    append_lines(&f.site.log_path, 100, 0);

    // Act
    let first = f.scanner.scan(&f.site).await;
    append_lines(&f.site.log_path, 50, 100);
    let second = f.scanner.scan(&f.site).await;

    // Assert
    assert_eq!(first.entries_read, 100);
    assert_eq!(second.entries_read, 50);
    assert_eq!(f.store.inserts(), 2);
    assert_eq!(total(&f).await.pv, 150);
}

#[tokio::test]
async fn batches_are_flushed_at_the_configured_size() {
    let f = fixture().await;
    append_lines(&f.site.log_path, 250, 0);

    f.scanner.scan(&f.site).await;

    assert_eq!(f.store.inserts(), 3);
    assert_eq!(total(&f).await.pv, 250);
}

#[tokio::test]
async fn shrinking_file_resets_the_offset() {
    // Arrange
    let f = fixture().await;
    append_lines(&f.site.log_path, 10, 0);
    f.scanner.scan(&f.site).await;
    std::fs::remove_file(&f.site.log_path).unwrap();
    append_lines(&f.site.log_path, 2, 500);

    // Act
    let result = f.scanner.scan(&f.site).await;

    // Assert
    assert!(result.rotated);
    assert_eq!(result.entries_read, 2);
    assert_eq!(total(&f).await.pv, 12);
}

#[tokio::test]
async fn malformed_lines_are_skipped_and_not_counted() {
    let f = fixture().await;
    append_lines(&f.site.log_path, 1, 0);
    std::fs::OpenOptions::new()
        .append(true)
        .open(&f.site.log_path)
        .unwrap()
        .write_all(b"garbage line\n\n\xff\xfe not utf8\n")
        .unwrap();
    append_lines(&f.site.log_path, 1, 1);

    let result = f.scanner.scan(&f.site).await;

    assert_eq!(result.entries_read, 2);
    assert_eq!(result.bytes_read, file_len(&f.site.log_path));
}

#[tokio::test]
async fn trailing_line_without_newline_is_read() {
    let f = fixture().await;
    let line = log_line("1.2.3.4", base_time(), "/", 200, 1);
    std::fs::write(&f.site.log_path, line.trim_end()).unwrap();

    let result = f.scanner.scan(&f.site).await;

    assert_eq!(result.entries_read, 1);
}

#[tokio::test]
async fn missing_file_reports_io_error_and_keeps_cursor() {
    let f = fixture().await;

    let result = f.scanner.scan(&f.site).await;

    assert!(matches!(result.error, Some(ScanError::Io { .. })));
    assert_eq!(f.cursors.snapshot().len(), 0);
}

#[tokio::test]
async fn failed_flush_drops_the_batch_and_moves_on() {
    // Arrange
    let f = fixture().await;
    append_lines(&f.site.log_path, 5, 0);
    f.store.fail_inserts.store(true, Ordering::SeqCst);

    // Act
    let result = f.scanner.scan(&f.site).await;

    // Assert
    assert!(result.is_ok());
    assert_eq!(result.entries_read, 5);
    assert_eq!(result.entries_dropped, 5);
    assert_eq!(result.earliest_event, None);
    assert_eq!(
        f.cursors.cursor_for(&f.site.id).offset,
        file_len(&f.site.log_path)
    );
}

#[tokio::test]
async fn earliest_event_is_the_oldest_stored_timestamp() {
    let f = fixture().await;
    append_lines(&f.site.log_path, 1, 30);
    append_lines(&f.site.log_path, 1, 10);

    let result = f.scanner.scan(&f.site).await;

    assert_eq!(
        result.earliest_event,
        Some(base_time() + TimeDelta::seconds(10))
    );
}

#[tokio::test]
async fn scan_all_persists_cursors_once_per_pass() {
    // Arrange
    let f = fixture().await;
    append_lines(&f.site.log_path, 4, 0);
    let registry = SiteRegistry::new(vec![f.site.clone()]);

    // Act
    let results = f.scanner.scan_all(&registry, &CancellationToken::new()).await;
    let reopened = CursorStore::open(f.dir.path().join("scan_state.json")).unwrap();

    // Assert
    assert_eq!(results.len(), 1);
    assert_eq!(
        reopened.cursor_for(&f.site.id).offset,
        file_len(&f.site.log_path)
    );
}

#[tokio::test]
async fn cancelled_pass_skips_remaining_sites() {
    let f = fixture().await;
    append_lines(&f.site.log_path, 4, 0);
    let registry = SiteRegistry::new(vec![f.site.clone()]);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let results = f.scanner.scan_all(&registry, &cancel).await;

    assert!(results[0].skipped);
    assert_eq!(results[0].entries_read, 0);
    assert!(results[0].error.is_none());
    assert_eq!(f.store.inserts(), 0);
}
