use super::{engine, now};
use crate::clock::ManualClock;
use crate::site::SiteId;
use crate::stats::types::{QueryResult, StatPoint, Timeseries};
use crate::stats::{QueryError, StatsQuery};
use crate::store::EventStore;
use crate::test_support::{CountingStore, event, sqlite_store};
use chrono::{NaiveDate, TimeDelta, TimeZone, Utc};
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn blog() -> SiteId {
    SiteId::from("blog")
}

fn yesterday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 10, 9).unwrap()
}

#[tokio::test]
async fn overall_today_counts_events_since_local_midnight() {
    // Arrange
    let (store, _dir) = sqlite_store(&["blog"]).await;
    store
        .insert_batch(
            &blog(),
            &[
                // 23:30 local on the 9th, outside today.
                event("1.1.1.1", Utc.with_ymd_and_hms(2024, 10, 9, 15, 30, 0).unwrap(), true, 1),
                event("1.1.1.1", Utc.with_ymd_and_hms(2024, 10, 9, 16, 30, 0).unwrap(), true, 10),
                event("2.2.2.2", Utc.with_ymd_and_hms(2024, 10, 10, 1, 0, 0).unwrap(), false, 20),
            ],
        )
        .await
        .unwrap();
    let engine = engine(store, Arc::new(ManualClock::new(now())));

    // Act
    let result = engine
        .execute(&StatsQuery::parse("overall", "blog", "today", None, None, None).unwrap())
        .await
        .unwrap();

    // Assert
    assert_eq!(result, QueryResult::Overall(StatPoint::new(1, 1, 30)));
}

#[tokio::test]
async fn overall_today_includes_the_current_second() {
    // Arrange
    let (store, _dir) = sqlite_store(&["blog"]).await;
    store
        .insert_batch(&blog(), &[event("1.1.1.1", now(), true, 7)])
        .await
        .unwrap();
    let clock = Arc::new(ManualClock::new(now() + TimeDelta::milliseconds(500)));
    let engine = engine(store, clock);

    // Act
    let result = engine
        .execute(&StatsQuery::parse("overall", "blog", "today", None, None, None).unwrap())
        .await
        .unwrap();

    // Assert
    assert_eq!(result, QueryResult::Overall(StatPoint::new(1, 1, 7)));
}

#[tokio::test]
async fn custom_timeseries_covers_whole_days_while_overall_is_exact() {
    // Arrange
    let (store, _dir) = sqlite_store(&["blog"]).await;
    store
        .insert_batch(
            &blog(),
            &[
                // 10:00 local on the 9th, before the interval.
                event("1.1.1.1", Utc.with_ymd_and_hms(2024, 10, 9, 2, 0, 0).unwrap(), true, 3),
                event("2.2.2.2", Utc.with_ymd_and_hms(2024, 10, 9, 4, 30, 0).unwrap(), true, 4),
            ],
        )
        .await
        .unwrap();
    let engine = engine(store, Arc::new(ManualClock::new(now())));
    let range = "2024-10-09T04:00:00Z/2024-10-09T05:00:00Z";

    // Act
    let overall = engine
        .execute(&StatsQuery::parse("overall", "blog", range, None, None, None).unwrap())
        .await
        .unwrap();
    let query = StatsQuery::parse("timeseries", "blog", range, Some("daily"), None, None).unwrap();
    let series = engine.execute(&query).await.unwrap();

    // Assert
    assert_eq!(overall, QueryResult::Overall(StatPoint::new(1, 1, 4)));
    let QueryResult::Timeseries(Timeseries::Daily(days)) = series else {
        panic!("expected a daily timeseries");
    };
    assert_eq!(days.len(), 1);
    assert_eq!(days[0].total, StatPoint::new(2, 2, 7));
}

#[tokio::test]
async fn unregistered_sites_are_not_found() {
    let (store, _dir) = sqlite_store(&["blog"]).await;
    let engine = engine(store, Arc::new(ManualClock::new(now())));

    let err = engine
        .execute(&StatsQuery::parse("overall", "shop", "today", None, None, None).unwrap())
        .await
        .unwrap_err();

    assert!(err.is_not_found());
}

#[tokio::test]
async fn rollup_total_matches_direct_aggregate() {
    // Arrange
    let (store, _dir) = sqlite_store(&["blog"]).await;
    let start = Utc.with_ymd_and_hms(2024, 10, 8, 16, 0, 0).unwrap();
    let events: Vec<_> = (0..24)
        .map(|h| {
            event(
                &format!("10.1.0.{h}"),
                start + TimeDelta::minutes(h * 60 + 15),
                h % 4 != 0,
                100,
            )
        })
        .collect();
    store.insert_batch(&blog(), &events).await.unwrap();
    let engine = engine(store.clone(), Arc::new(ManualClock::new(now())));

    // Act
    let rollup = engine.rollup(&blog(), yesterday(), now()).await.unwrap();
    let direct = store
        .aggregate(
            &blog(),
            crate::stats::types::TimeWindow::new(start, start + TimeDelta::days(1)),
        )
        .await
        .unwrap();

    // Assert
    assert_eq!(rollup.total(), direct);
    assert_eq!(rollup.hourly().len(), 24);
    assert_eq!(rollup.hourly()[1].stats, StatPoint::new(1, 1, 100));
    assert_eq!(rollup.hourly()[0].stats, StatPoint::new(0, 0, 100));
}

#[tokio::test]
async fn completed_days_are_memoized_until_invalidated() {
    // Arrange
    let (sqlite, _dir) = sqlite_store(&["blog"]).await;
    let store = Arc::new(CountingStore::new(sqlite));
    let engine = engine(store.clone(), Arc::new(ManualClock::new(now())));

    // Act
    engine.rollup(&blog(), yesterday(), now()).await.unwrap();
    engine.rollup(&blog(), yesterday(), now()).await.unwrap();
    let reads_while_memoized = store.reads();
    engine.invalidate_from(&blog(), Utc.with_ymd_and_hms(2024, 10, 9, 3, 0, 0).unwrap());
    engine.rollup(&blog(), yesterday(), now()).await.unwrap();

    // Assert
    assert_eq!(reads_while_memoized, 1);
    assert_eq!(store.reads(), 2);
    assert_eq!(engine.memoized_days(&blog()), 1);
}

#[tokio::test]
async fn today_is_never_memoized() {
    let (sqlite, _dir) = sqlite_store(&["blog"]).await;
    let store = Arc::new(CountingStore::new(sqlite));
    let engine = engine(store.clone(), Arc::new(ManualClock::new(now())));
    let today = NaiveDate::from_ymd_opt(2024, 10, 10).unwrap();

    engine.rollup(&blog(), today, now()).await.unwrap();
    engine.rollup(&blog(), today, now()).await.unwrap();

    assert_eq!(store.reads(), 2);
    assert_eq!(engine.memoized_days(&blog()), 0);
}

#[tokio::test]
async fn invalidation_only_drops_later_days() {
    let (store, _dir) = sqlite_store(&["blog"]).await;
    let engine = engine(store, Arc::new(ManualClock::new(now())));
    for day in [6, 7, 8, 9] {
        let date = NaiveDate::from_ymd_opt(2024, 10, day).unwrap();
        engine.rollup(&blog(), date, now()).await.unwrap();
    }

    // 2024-10-08 02:00 local.
    engine.invalidate_from(&blog(), Utc.with_ymd_and_hms(2024, 10, 7, 18, 0, 0).unwrap());

    assert_eq!(engine.memoized_days(&blog()), 2);
}

#[tokio::test]
async fn daily_timeseries_lists_one_total_per_day() {
    // Arrange
    let (store, _dir) = sqlite_store(&["blog"]).await;
    store
        .insert_batch(
            &blog(),
            &[event("1.1.1.1", Utc.with_ymd_and_hms(2024, 10, 8, 2, 0, 0).unwrap(), true, 5)],
        )
        .await
        .unwrap();
    let engine = engine(store, Arc::new(ManualClock::new(now())));

    // Act
    let query =
        StatsQuery::parse("timeseries", "blog", "last7days", Some("daily"), None, None).unwrap();
    let result = engine.execute(&query).await.unwrap();

    // Assert
    let QueryResult::Timeseries(Timeseries::Daily(days)) = result else {
        panic!("expected a daily timeseries");
    };
    assert_eq!(days.len(), 7);
    let total: StatPoint = days.iter().map(|d| d.total).sum();
    assert_eq!(total, StatPoint::new(1, 1, 5));
    assert_eq!(days[4].date, NaiveDate::from_ymd_opt(2024, 10, 8).unwrap());
    assert_eq!(days[4].total.pv, 1);
}

#[tokio::test]
async fn store_failures_surface_as_query_errors() {
    // Table for "blog" never created.
    let (store, _dir) = sqlite_store(&[]).await;
    let engine = engine(store, Arc::new(ManualClock::new(now())));

    let err = engine
        .execute(&StatsQuery::parse("url", "blog", "today", None, None, None).unwrap())
        .await
        .unwrap_err();

    assert!(matches!(err, QueryError::Store(_)));
    assert!(!err.is_client_error());
}
