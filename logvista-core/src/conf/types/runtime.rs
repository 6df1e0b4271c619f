use crate::conf::types::{IdentityConfig, PvFilterConfig, ServerConfig, SiteConfig};
use serde::{Deserialize, Serialize};

/// Represents the whole configuration file.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub server: ServerConfig,

    pub sites: Vec<SiteConfig>,

    #[serde(default)]
    pub pv_filter: PvFilterConfig,

    #[serde(default)]
    pub identity: IdentityConfig,
}
