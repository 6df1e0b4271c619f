use crate::site::{Site, SiteId};
use crate::store::StoreError;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("event store unavailable: {0}")]
    Store(#[from] StoreError),
}

/// Outcome of scanning one site once.
#[derive(Debug)]
pub struct ScanResult {
    pub site: SiteId,
    pub site_name: String,
    /// Classified events in the scanned byte range, flushed or not.
    pub entries_read: usize,
    /// Events lost to failed batch flushes.
    pub entries_dropped: usize,
    pub bytes_read: u64,
    pub duration: Duration,
    pub error: Option<ScanError>,
    /// Oldest event that reached the store in this scan.
    pub earliest_event: Option<DateTime<Utc>>,
    pub rotated: bool,
    /// Not scanned because shutdown was requested first.
    pub skipped: bool,
}

impl ScanResult {
    pub(crate) fn empty(site: &Site) -> Self {
        Self {
            site: site.id.clone(),
            site_name: site.name.clone(),
            entries_read: 0,
            entries_dropped: 0,
            bytes_read: 0,
            duration: Duration::ZERO,
            error: None,
            earliest_event: None,
            rotated: false,
            skipped: false,
        }
    }

    pub(crate) fn skipped(site: &Site) -> Self {
        Self {
            skipped: true,
            ..Self::empty(site)
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}
