use crate::event::{DEFAULT_EXCLUDE_PATTERNS, DEFAULT_STATUS_CODES};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PvFilterConfig {
    #[serde(default = "default_status_codes")]
    pub status_codes: Vec<u16>,

    /// Regular expressions, matched case-insensitively against the decoded path.
    #[serde(default = "default_exclude_patterns")]
    pub exclude_patterns: Vec<String>,
}

impl Default for PvFilterConfig {
    fn default() -> Self {
        Self {
            status_codes: default_status_codes(),
            exclude_patterns: default_exclude_patterns(),
        }
    }
}

fn default_status_codes() -> Vec<u16> {
    DEFAULT_STATUS_CODES.to_vec()
}

fn default_exclude_patterns() -> Vec<String> {
    DEFAULT_EXCLUDE_PATTERNS
        .iter()
        .map(|p| p.to_string())
        .collect()
}
