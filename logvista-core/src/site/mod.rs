use crate::conf::types::SiteConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

const MAX_SITE_ID_LENGTH: usize = 64;

/// Stable identifier of a configured site. Also used to name the site's event table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SiteId(pub String);

impl SiteId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_valid(&self) -> bool {
        is_valid_site_id(&self.0)
    }
}

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for SiteId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Site ids end up inside SQL identifiers, so only `[A-Za-z0-9_-]` is allowed.
pub fn is_valid_site_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_SITE_ID_LENGTH
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

#[derive(Debug, Clone)]
pub struct Site {
    pub id: SiteId,
    pub name: String,
    pub log_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteSummary {
    pub id: SiteId,
    pub name: String,
}

/// Read-only table of configured sites, built once at startup and shared by reference.
///
/// Iteration follows configuration order.
#[derive(Debug, Default)]
pub struct SiteRegistry {
    sites: Vec<Site>,
}

impl SiteRegistry {
    pub fn new(sites: Vec<Site>) -> Self {
        Self { sites }
    }

    pub fn from_config(sites: &[SiteConfig]) -> Self {
        Self::new(
            sites
                .iter()
                .map(|s| Site {
                    id: SiteId::new(&s.id),
                    name: s.name.clone().unwrap_or_else(|| s.id.clone()),
                    log_path: s.log_path.clone(),
                })
                .collect(),
        )
    }

    pub fn get(&self, id: &SiteId) -> Option<&Site> {
        self.sites.iter().find(|s| &s.id == id)
    }

    pub fn contains(&self, id: &SiteId) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Site> {
        self.sites.iter()
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    pub fn summaries(&self) -> Vec<SiteSummary> {
        self.sites
            .iter()
            .map(|s| SiteSummary {
                id: s.id.clone(),
                name: s.name.clone(),
            })
            .collect()
    }
}
