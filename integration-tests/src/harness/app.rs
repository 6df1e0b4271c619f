use crate::harness::store::CountingStore;
use chrono::{DateTime, TimeZone, Utc};
use logvista_core::clock::ManualClock;
use logvista_core::conf::parse_config;
use logvista_core::scan::ScanResult;
use logvista_core::server::{App, build_app_with, run_scan_pass};
use logvista_core::stats::{QueryResult, StatsQuery};
use logvista_core::store::SqliteEventStore;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

/// A combined-format line timestamped in UTC.
pub fn log_line(ip: &str, ts: DateTime<Utc>, path: &str, status: u16, bytes: u64) -> String {
    format!(
        "{ip} - - [{}] \"GET {path} HTTP/1.1\" {status} {bytes} \"https://ref.example/\" \"Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0\"\n",
        ts.format("%d/%b/%Y:%H:%M:%S %z")
    )
}

/// A full application over a temp directory, with a manual clock at UTC offset 0.
pub struct TestApp {
    pub dir: TempDir,
    pub app: App,
    pub store: Arc<CountingStore>,
    pub clock: Arc<ManualClock>,
}

impl TestApp {
    /// 2024-10-10 12:00 UTC.
    pub fn default_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 10, 10, 12, 0, 0).unwrap()
    }

    pub async fn start(sites: &[&str]) -> Self {
        let dir = tempfile::tempdir().unwrap();
        Self::start_in(dir, sites).await
    }

    /// Builds an app over an existing directory, as a restarted process would.
    pub async fn start_in(dir: TempDir, sites: &[&str]) -> Self {
        let site_entries: Vec<String> = sites
            .iter()
            .map(|id| {
                format!(
                    r#"{{ id = "{id}", log_path = "{}" }}"#,
                    dir.path().join(format!("{id}.log")).display()
                )
            })
            .collect();
        let source = format!(
            r#"
server {{
  data_dir           = "{data}"
  utc_offset_minutes = 0
  batch_size         = 100
}}
sites = [{sites}]
"#,
            data = dir.path().join("data").display(),
            sites = site_entries.join(", "),
        );
        let config = parse_config(&source, Path::new("test.hcl")).unwrap().config;

        let sqlite = SqliteEventStore::open(&config.server.database_path())
            .await
            .unwrap();
        let store = Arc::new(CountingStore::new(Arc::new(sqlite)));
        let clock = Arc::new(ManualClock::new(Self::default_now()));
        let app = build_app_with(&config, store.clone(), clock.clone())
            .await
            .unwrap();

        Self {
            dir,
            app,
            store,
            clock,
        }
    }

    pub fn log_path(&self, site: &str) -> PathBuf {
        self.dir.path().join(format!("{site}.log"))
    }

    pub fn append(&self, site: &str, lines: &[String]) {
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.log_path(site))
            .unwrap();
        for line in lines {
            file.write_all(line.as_bytes()).unwrap();
        }
    }

    pub async fn scan(&self) -> Vec<ScanResult> {
        run_scan_pass(&self.app, &CancellationToken::new()).await
    }

    pub fn query(&self, kind: &str, site: &str, range: &str, view: Option<&str>) -> StatsQuery {
        StatsQuery::parse(kind, site, range, view, None, None).unwrap()
    }

    pub async fn cached(&self, query: &StatsQuery) -> Arc<QueryResult> {
        self.app.stats.query(query).await.unwrap()
    }

    pub async fn fresh(&self, query: &StatsQuery) -> QueryResult {
        self.app.stats.query_fresh(query).await.unwrap()
    }

    /// Drops the app but keeps its directory for a restart.
    pub fn into_dir(self) -> TempDir {
        self.dir
    }
}
