use crate::site::SiteSummary;
use crate::stats::cache::ResultCache;
use crate::stats::engine::StatsEngine;
use crate::stats::error::QueryError;
use crate::stats::query::{StatsQuery, StatsRequest};
use crate::stats::types::QueryResult;
use std::sync::Arc;
use tracing::debug;

/// The query surface: engine results behind the TTL cache.
pub struct StatsService {
    engine: Arc<StatsEngine>,
    cache: ResultCache<QueryResult>,
}

impl StatsService {
    pub fn new(engine: Arc<StatsEngine>, cache: ResultCache<QueryResult>) -> Self {
        Self { engine, cache }
    }

    pub fn engine(&self) -> &StatsEngine {
        &self.engine
    }

    pub fn sites(&self) -> Vec<SiteSummary> {
        self.engine.sites().summaries()
    }

    pub async fn query(&self, query: &StatsQuery) -> Result<Arc<QueryResult>, QueryError> {
        let key = query.cache_key();
        if let Some(hit) = self.cache.get(&key) {
            return Ok(hit);
        }

        let result = Arc::new(self.engine.execute(query).await?);
        debug!(key = %key, "query result cached");
        self.cache.set(key, Arc::clone(&result));
        Ok(result)
    }

    /// Bypasses the cache without reading or updating it.
    pub async fn query_fresh(&self, query: &StatsQuery) -> Result<QueryResult, QueryError> {
        self.engine.execute(query).await
    }

    pub async fn handle(&self, request: &StatsRequest) -> Result<Arc<QueryResult>, QueryError> {
        let query = StatsQuery::from_request(request)?;
        self.query(&query).await
    }

    pub fn purge_expired(&self) -> usize {
        self.cache.purge_expired()
    }

    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }
}
