//! Turning one raw access-log line into an [`AccessEvent`].
//!
//! Everything here is pure: no clock, no I/O. Geo labels are filled in later by
//! [`crate::enrichment::geoip::GeoEnricher`].

mod classify;
mod decode;
mod line;
mod page_view;
mod record;


pub use classify::{Classifier, MalformedLine};
pub use page_view::{DEFAULT_EXCLUDE_PATTERNS, DEFAULT_STATUS_CODES, PageViewFilter};
pub use record::{AccessEvent, BOT, OTHER};
