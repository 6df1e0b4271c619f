use crate::enrichment::geoip::Location;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Sentinel for browser, OS and device of automated agents.
pub const BOT: &str = "bot";
/// Bucket for client values the user-agent engine could not name.
pub const OTHER: &str = "other";

/// One classified request. Never mutated after enrichment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessEvent {
    pub ip: String,
    pub page_view: bool,
    pub timestamp: DateTime<Utc>,
    pub method: String,
    pub path: String,
    pub status: u16,
    pub bytes_sent: u64,
    pub referer: String,
    pub browser: String,
    pub os: String,
    pub device: String,
    pub location: Location,
}
