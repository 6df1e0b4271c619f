mod engine_tests;

use crate::clock::ManualClock;
use crate::site::{Site, SiteId, SiteRegistry};
use crate::stats::engine::StatsEngine;
use crate::store::EventStore;
use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use std::path::PathBuf;
use std::sync::Arc;

/// Thursday 2024-10-10 14:00 at UTC+8.
pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 10, 10, 6, 0, 0).unwrap()
}

pub(super) fn utc8() -> FixedOffset {
    FixedOffset::east_opt(8 * 3600).unwrap()
}

pub(super) fn registry() -> Arc<SiteRegistry> {
    Arc::new(SiteRegistry::new(vec![Site {
        id: SiteId::from("blog"),
        name: "Blog".to_string(),
        log_path: PathBuf::from("/dev/null"),
    }]))
}

pub(super) fn engine(store: Arc<dyn EventStore>, clock: Arc<ManualClock>) -> StatsEngine {
    StatsEngine::new(store, registry(), clock, utc8())
}
