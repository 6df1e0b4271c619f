use crate::conf::types::server::{MAX_BATCH_SIZE, MIN_SCAN_INTERVAL_SECS};
use crate::conf::types::{RuntimeConfig, UaEngineKind};
use crate::site::is_valid_site_id;
use owo_colors::OwoColorize;
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;

/// A parsed config whose hard errors are all resolved. Warnings remain in `report`.
#[derive(Debug)]
pub struct ValidatedConfig {
    pub config: RuntimeConfig,
    pub report: ValidationReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub message: String,
    /// Dotted location of the offending field, e.g. `sites[1].id`.
    pub origin: String,
    pub help: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn has_violations(&self) -> bool {
        !self.errors.is_empty() || !self.warnings.is_empty()
    }

    pub(crate) fn error(
        &mut self,
        message: String,
        origin: impl Into<String>,
        help: Option<String>,
    ) {
        self.errors.push(ValidationIssue {
            severity: Severity::Error,
            message,
            origin: origin.into(),
            help,
        });
    }

    pub(crate) fn warning(&mut self, message: String, origin: impl Into<String>) {
        self.warnings.push(ValidationIssue {
            severity: Severity::Warning,
            message,
            origin: origin.into(),
            help: None,
        });
    }

    pub fn render_plain(&self) {
        for issue in self.errors.iter().chain(self.warnings.iter()) {
            let severity = match issue.severity {
                Severity::Error => "error",
                Severity::Warning => "warning",
            };
            eprintln!("{}: {}: {}", issue.origin, severity, issue.message);
            if let Some(help) = &issue.help {
                eprintln!("  help: {}", help);
            }
        }
    }

    pub fn render_pretty(&self) {
        if self.has_violations() {
            eprintln!(
                "configuration validation found {} errors, {} warnings\n",
                self.errors.len(),
                self.warnings.len()
            );
        }

        for issue in self.errors.iter().chain(self.warnings.iter()) {
            match issue.severity {
                Severity::Error => {
                    eprintln!(
                        "  {} {}: {}",
                        "error".red().bold(),
                        issue.origin.dimmed(),
                        issue.message
                    );
                }
                Severity::Warning => {
                    eprintln!(
                        "  {} {}: {}",
                        "warning".yellow().bold(),
                        issue.origin.dimmed(),
                        issue.message
                    );
                }
            }
            if let Some(help) = &issue.help {
                eprintln!("    {}: {}", "help".cyan(), help);
            }
        }
    }
}

pub(crate) fn validate_runtime_config(config: &RuntimeConfig) -> ValidationReport {
    let mut report = ValidationReport::default();

    validate_server(config, &mut report);
    validate_sites(config, &mut report);
    validate_pv_filter(config, &mut report);
    validate_identity(config, &mut report);

    report
}

fn validate_server(config: &RuntimeConfig, report: &mut ValidationReport) {
    let server = &config.server;

    if server.batch_size == 0 || server.batch_size > MAX_BATCH_SIZE {
        report.error(
            format!("batch_size must be between 1 and {MAX_BATCH_SIZE}, got {}", server.batch_size),
            "server.batch_size",
            None,
        );
    }

    if server.scan_interval_secs < MIN_SCAN_INTERVAL_SECS {
        report.error(
            format!(
                "scan_interval_secs must be at least {MIN_SCAN_INTERVAL_SECS}, got {}",
                server.scan_interval_secs
            ),
            "server.scan_interval_secs",
            None,
        );
    }

    if let Some(minutes) = server.utc_offset_minutes {
        if !(-1439..=1439).contains(&minutes) {
            report.error(
                format!("utc_offset_minutes must be within ±1439, got {minutes}"),
                "server.utc_offset_minutes",
                Some("480 means UTC+08:00".to_string()),
            );
        }
    }
}

fn validate_sites(config: &RuntimeConfig, report: &mut ValidationReport) {
    if config.sites.is_empty() {
        report.error(
            "at least one site must be configured".to_string(),
            "sites",
            Some(
                r#"sites = [{ id = "blog", log_path = "/var/log/nginx/access.log" }]"#
                    .to_string(),
            ),
        );
        return;
    }

    let mut seen = HashSet::new();
    for (i, site) in config.sites.iter().enumerate() {
        if !is_valid_site_id(&site.id) {
            report.error(
                format!("invalid site id '{}'", site.id),
                format!("sites[{i}].id"),
                Some("site ids use 1-64 characters from [A-Za-z0-9_-]".to_string()),
            );
        }

        if !seen.insert(site.id.as_str()) {
            report.error(
                format!("duplicate site id '{}'", site.id),
                format!("sites[{i}].id"),
                None,
            );
        }

        if site.log_path.as_os_str().is_empty() {
            report.error(
                "log_path must not be empty".to_string(),
                format!("sites[{i}].log_path"),
                None,
            );
        } else if !site.log_path.exists() {
            report.warning(
                format!("log file {} does not exist yet", site.log_path.display()),
                format!("sites[{i}].log_path"),
            );
        }
    }
}

fn validate_pv_filter(config: &RuntimeConfig, report: &mut ValidationReport) {
    for (i, pattern) in config.pv_filter.exclude_patterns.iter().enumerate() {
        if let Err(err) = Regex::new(pattern) {
            report.error(
                format!("invalid exclude pattern '{pattern}': {err}"),
                format!("pv_filter.exclude_patterns[{i}]"),
                None,
            );
        }
    }

    if config.pv_filter.status_codes.is_empty() {
        report.warning(
            "no status codes are counted, every request will be a non-page-view".to_string(),
            "pv_filter.status_codes",
        );
    }
}

fn validate_identity(config: &RuntimeConfig, report: &mut ValidationReport) {
    let identity = &config.identity;

    if identity.enable_user_agent
        && identity.ua_engine == UaEngineKind::UaParser
        && identity.ua_regexes.is_none()
    {
        report.error(
            "the uaparser engine requires ua_regexes".to_string(),
            "identity.ua_regexes",
            Some(
                "point ua_regexes at a uap-core regexes.yaml, or use ua_engine = \"woothee\""
                    .to_string(),
            ),
        );
    }

    if identity.enable_geoip {
        if identity.geoip_db.is_none() {
            report.error(
                "enable_geoip requires geoip_db".to_string(),
                "identity.geoip_db",
                None,
            );
        }
        if identity.home_country.is_none() {
            report.warning(
                "home_country is not set, domestic locations will be unknown".to_string(),
                "identity.home_country",
            );
        }
    }
}
