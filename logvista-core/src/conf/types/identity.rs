use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Client identification: geo labels and user-agent decomposition.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct IdentityConfig {
    #[serde(default)]
    pub enable_geoip: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geoip_db: Option<PathBuf>,

    /// ISO 3166-1 alpha-2 code. Domestic labels use subdivisions for this country.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_country: Option<String>,

    #[serde(default = "default_true")]
    pub enable_user_agent: bool,

    #[serde(default)]
    pub ua_engine: UaEngineKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ua_regexes: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UaEngineKind {
    UaParser,
    #[default]
    Woothee,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            enable_geoip: false,
            geoip_db: None,
            home_country: None,
            enable_user_agent: true,
            ua_engine: UaEngineKind::default(),
            ua_regexes: None,
        }
    }
}

fn default_true() -> bool {
    true
}
