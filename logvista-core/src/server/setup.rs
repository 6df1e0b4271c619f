use crate::clock::{Clock, SystemClock};
use crate::conf::RuntimeConfig;
use crate::cursor::CursorStore;
use crate::enrichment::geoip::{GeoEnricher, MaxMindGeoLookup};
use crate::enrichment::user_agent::build_ua_engine;
use crate::event::{Classifier, PageViewFilter};
use crate::scan::Scanner;
use crate::server::scheduler::run_periodic_scans;
use crate::site::SiteRegistry;
use crate::stats::{ResultCache, StatsEngine, StatsService};
use crate::store::{EventStore, SqliteEventStore};
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Everything a running instance shares between the scan and query paths.
pub struct App {
    pub sites: Arc<SiteRegistry>,
    pub cursors: Arc<CursorStore>,
    pub scanner: Scanner,
    pub stats: StatsService,
    pub scan_interval: Duration,
    pub shutdown_grace: Duration,
}

/// Run the ingestion service until Ctrl-C or SIGTERM.
pub fn run(config: RuntimeConfig) -> Result<()> {
    use tokio::runtime::Builder;

    let runtime = Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build Tokio runtime")?;

    runtime.block_on(async move {
        let store = open_store(&config).await?;
        let app = Arc::new(build_app_with(&config, store.clone(), Arc::new(SystemClock)).await?);

        let cancel = CancellationToken::new();
        ctrlc::set_handler({
            let cancel = cancel.clone();
            move || {
                tracing::info!("shutdown requested");
                cancel.cancel();
            }
        })?;

        run_until_cancelled(app, cancel).await;
        store.close().await;
        Ok(())
    })
}

/// Opens the SQLite store under `data_dir`. Callers close it once the app is done.
pub async fn open_store(config: &RuntimeConfig) -> Result<Arc<SqliteEventStore>> {
    let db_path = config.server.database_path();
    let store = SqliteEventStore::open(&db_path)
        .await
        .with_context(|| format!("failed to open event store {}", db_path.display()))?;

    Ok(Arc::new(store))
}

pub async fn build_app_with(
    config: &RuntimeConfig,
    store: Arc<dyn EventStore>,
    clock: Arc<dyn Clock>,
) -> Result<App> {
    let server = &config.server;
    let identity = &config.identity;

    let sites = Arc::new(SiteRegistry::from_config(&config.sites));
    for site in sites.iter() {
        store
            .ensure_site(&site.id)
            .await
            .with_context(|| format!("failed to prepare storage for site {}", site.id))?;
    }

    let filter = PageViewFilter::new(
        config.pv_filter.status_codes.iter().copied(),
        &config.pv_filter.exclude_patterns,
    )?;

    let ua_engine = if identity.enable_user_agent {
        Some(build_ua_engine(identity.ua_engine, identity.ua_regexes.as_deref())?)
    } else {
        None
    };

    let geo = match (&identity.geoip_db, identity.enable_geoip) {
        (Some(path), true) => {
            let lookup = MaxMindGeoLookup::open(path, identity.home_country.as_deref())?;
            GeoEnricher::new(Arc::new(lookup))
        }
        _ => GeoEnricher::disabled(),
    };

    let geo_enabled = geo.is_enabled();
    let cursor_path = server.cursor_path();
    let cursors = Arc::new(CursorStore::open(&cursor_path)?);

    let scanner = Scanner::new(
        Arc::clone(&store),
        Arc::clone(&cursors),
        Arc::new(Classifier::new(filter, ua_engine)),
        geo,
    )
    .with_batch_size(server.batch_size)
    .with_clock(Arc::clone(&clock));

    let offset = server.utc_offset();
    let engine = StatsEngine::new(
        Arc::clone(&store),
        Arc::clone(&sites),
        Arc::clone(&clock),
        offset,
    );
    let cache = ResultCache::new(server.cache_ttl(), clock);

    tracing::info!(
        sites = sites.len(),
        cursor_file = %cursor_path.display(),
        utc_offset = %offset,
        geo_enabled,
        "application initialized"
    );

    Ok(App {
        sites,
        cursors,
        scanner,
        stats: StatsService::new(Arc::new(engine), cache),
        scan_interval: server.scan_interval(),
        shutdown_grace: server.shutdown_grace(),
    })
}

/// Drives the scheduler until `cancel` fires, then waits up to the grace period for it.
pub async fn run_until_cancelled(app: Arc<App>, cancel: CancellationToken) {
    let scheduler = tokio::spawn(run_periodic_scans(Arc::clone(&app), cancel.clone()));

    cancel.cancelled().await;

    match tokio::time::timeout(app.shutdown_grace, scheduler).await {
        Ok(Ok(())) => tracing::info!("scheduler stopped"),
        Ok(Err(e)) => tracing::error!(error = %e, "scheduler task failed"),
        Err(_) => tracing::warn!(
            grace_secs = app.shutdown_grace.as_secs(),
            "scheduler did not stop within the grace period"
        ),
    }
}
