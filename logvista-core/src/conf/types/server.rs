use chrono::{FixedOffset, Local, Offset};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const MIN_SCAN_INTERVAL_SECS: u64 = 5;
pub const MAX_BATCH_SIZE: usize = 1000;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Holds the database, the cursor file and (optionally) the log file.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_scan_interval_secs")]
    pub scan_interval_secs: u64,

    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Fixed offset used for day/hour bucketing. Defaults to the host offset at startup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utc_offset_minutes: Option<i32>,

    #[serde(default = "default_shutdown_grace_secs")]
    pub shutdown_grace_secs: u64,

    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    #[serde(default)]
    pub log_destination: LogDestination,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogDestination {
    #[default]
    Stdout,
    File,
}

impl ServerConfig {
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("logvista.db")
    }

    pub fn cursor_path(&self) -> PathBuf {
        self.data_dir.join("scan_state.json")
    }

    pub fn log_file_name(&self) -> &'static str {
        "logvista.log"
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval_secs)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn utc_offset(&self) -> FixedOffset {
        self.utc_offset_minutes
            .and_then(|m| m.checked_mul(60))
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Local::now().offset().fix())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            scan_interval_secs: default_scan_interval_secs(),
            batch_size: default_batch_size(),
            utc_offset_minutes: None,
            shutdown_grace_secs: default_shutdown_grace_secs(),
            cache_ttl_secs: default_cache_ttl_secs(),
            log_destination: LogDestination::default(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_scan_interval_secs() -> u64 {
    300
}

fn default_batch_size() -> usize {
    100
}

fn default_shutdown_grace_secs() -> u64 {
    5
}

fn default_cache_ttl_secs() -> u64 {
    300
}
