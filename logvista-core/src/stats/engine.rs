use crate::clock::Clock;
use crate::site::{SiteId, SiteRegistry};
use crate::stats::error::QueryError;
use crate::stats::query::{Query, StatsQuery, ViewType};
use crate::stats::range::{local_date, local_midnight};
use crate::stats::types::{DailyRollup, DayTotal, HOURS_PER_DAY, QueryResult, Timeseries};
use crate::store::EventStore;
use chrono::{DateTime, FixedOffset, NaiveDate, TimeDelta, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::trace;

#[derive(Default)]
struct RollupMemo {
    days: HashMap<SiteId, BTreeMap<NaiveDate, DailyRollup>>,
    /// Bumped by every invalidation so in-flight computations do not store stale days.
    generations: HashMap<SiteId, u64>,
}

pub struct StatsEngine {
    store: Arc<dyn EventStore>,
    sites: Arc<SiteRegistry>,
    clock: Arc<dyn Clock>,
    offset: FixedOffset,
    memo: Mutex<RollupMemo>,
}

impl StatsEngine {
    pub fn new(
        store: Arc<dyn EventStore>,
        sites: Arc<SiteRegistry>,
        clock: Arc<dyn Clock>,
        offset: FixedOffset,
    ) -> Self {
        Self {
            store,
            sites,
            clock,
            offset,
            memo: Mutex::new(RollupMemo::default()),
        }
    }

    pub fn sites(&self) -> &SiteRegistry {
        &self.sites
    }

    pub async fn execute(&self, query: &StatsQuery) -> Result<QueryResult, QueryError> {
        if !self.sites.contains(&query.site) {
            return Err(QueryError::UnknownSite(query.site.to_string()));
        }

        let now = self.clock.now();
        let resolved = query.range.resolve(now, self.offset);

        match query.query {
            Query::Overall => {
                let stats = self.store.aggregate(&query.site, resolved.window).await?;
                Ok(QueryResult::Overall(stats))
            }
            Query::Timeseries(view) => {
                let mut rollups = Vec::with_capacity(resolved.days.len());
                for date in resolved.days {
                    rollups.push(self.rollup(&query.site, date, now).await?);
                }
                let series = match view {
                    ViewType::Hourly => Timeseries::Hourly(rollups),
                    ViewType::Daily => {
                        Timeseries::Daily(rollups.iter().map(DayTotal::from).collect())
                    }
                };
                Ok(QueryResult::Timeseries(series))
            }
            Query::Breakdown { dimension, limit } => {
                let rows = self
                    .store
                    .breakdown(&query.site, resolved.window, dimension, limit)
                    .await?;
                Ok(QueryResult::Breakdown(rows))
            }
        }
    }

    /// Days that have fully elapsed are memoized; today and future days are always recomputed.
    pub async fn rollup(
        &self,
        site: &SiteId,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<DailyRollup, QueryError> {
        let start = local_midnight(date, self.offset);
        let complete = start + TimeDelta::days(1) <= now;

        let generation = {
            let memo = self.memo.lock().unwrap_or_else(PoisonError::into_inner);
            if complete {
                if let Some(hit) = memo.days.get(site).and_then(|days| days.get(&date)) {
                    trace!(%site, %date, "rollup memo hit");
                    return Ok(hit.clone());
                }
            }
            memo.generations.get(site).copied().unwrap_or(0)
        };

        let points = self.store.hourly(site, start, HOURS_PER_DAY).await?;
        let rollup = DailyRollup::new(date, points);

        if complete {
            let mut memo = self.memo.lock().unwrap_or_else(PoisonError::into_inner);
            if memo.generations.get(site).copied().unwrap_or(0) == generation {
                memo.days
                    .entry(site.clone())
                    .or_default()
                    .insert(date, rollup.clone());
            }
        }

        Ok(rollup)
    }

    /// Drops memoized days on or after the local date of `instant`.
    pub fn invalidate_from(&self, site: &SiteId, instant: DateTime<Utc>) {
        let from = local_date(instant, self.offset);
        let mut memo = self.memo.lock().unwrap_or_else(PoisonError::into_inner);

        *memo.generations.entry(site.clone()).or_insert(0) += 1;
        if let Some(days) = memo.days.get_mut(site) {
            let dropped = days.split_off(&from);
            if !dropped.is_empty() {
                trace!(%site, %from, dropped = dropped.len(), "rollup memo invalidated");
            }
        }
    }

    pub fn memoized_days(&self, site: &SiteId) -> usize {
        self.memo
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .days
            .get(site)
            .map_or(0, BTreeMap::len)
    }
}
