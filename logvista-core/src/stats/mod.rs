//! Aggregate queries over stored events, with day rollup memoization and a TTL result cache.

pub mod cache;
pub mod engine;
pub mod error;
pub mod query;
pub mod range;
pub mod service;
pub mod types;

#[cfg(test)]
mod tests;

pub use cache::ResultCache;
pub use engine::StatsEngine;
pub use error::QueryError;
pub use query::{Dimension, LocationScope, Query, StatsQuery, StatsRequest, ViewType};
pub use range::RangeLabel;
pub use service::StatsService;
pub use types::{DailyRollup, DayTotal, DimensionRow, QueryResult, StatPoint, Timeseries};
