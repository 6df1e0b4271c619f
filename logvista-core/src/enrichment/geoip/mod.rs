mod maxmind;

#[cfg(test)]
mod tests;

pub use maxmind::MaxMindGeoLookup;

use ipnet::IpNet;
use once_cell::sync::Lazy;
use serde::Serialize;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

pub const GEO_LOOKUP_TIMEOUT: Duration = Duration::from_millis(50);

pub const LOCAL: &str = "local";
pub const PRIVATE_NETWORK: &str = "private network";
pub const OVERSEAS: &str = "overseas";
pub const UNKNOWN: &str = "unknown";

static PRIVATE_NETS: Lazy<Vec<IpNet>> = Lazy::new(|| {
    ["10.0.0.0/8", "172.16.0.0/12", "192.168.0.0/16", "fc00::/7"]
        .iter()
        .filter_map(|cidr| cidr.parse().ok())
        .collect()
});

/// Domestic and global location labels of a client address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Location {
    pub domestic: String,
    pub global: String,
}

impl Location {
    pub fn new(domestic: impl Into<String>, global: impl Into<String>) -> Self {
        Self {
            domestic: domestic.into(),
            global: global.into(),
        }
    }

    pub fn local() -> Self {
        Self::new(LOCAL, LOCAL)
    }

    pub fn private_network() -> Self {
        Self::new(PRIVATE_NETWORK, PRIVATE_NETWORK)
    }

    pub fn unknown() -> Self {
        Self::new(UNKNOWN, UNKNOWN)
    }
}

#[derive(Debug, Error)]
pub enum GeoError {
    #[error("geo lookup exceeded {0:?}")]
    Timeout(Duration),

    #[error("geo lookup failed: {0}")]
    Lookup(String),

    #[error("geo lookup task failed: {0}")]
    Join(String),
}

/// Offline geo database capability. Implementations may block; callers bound them in time.
pub trait GeoLookup: Send + Sync {
    fn lookup(&self, ip: IpAddr) -> Result<Location, GeoError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AddressClass {
    Local,
    Private,
    Public(IpAddr),
    Invalid,
}

pub(crate) fn classify_address(raw: &str) -> AddressClass {
    if raw.is_empty() || raw == "localhost" {
        return AddressClass::Local;
    }
    let Ok(ip) = raw.parse::<IpAddr>() else {
        return AddressClass::Invalid;
    };
    // Dual-stack listeners log IPv4 clients as `::ffff:a.b.c.d`.
    let ip = ip.to_canonical();
    if ip.is_loopback() || ip.is_unspecified() {
        AddressClass::Local
    } else if PRIVATE_NETS.iter().any(|net| net.contains(&ip)) {
        AddressClass::Private
    } else {
        AddressClass::Public(ip)
    }
}

/// Best-effort geo labelling with a hard time budget per lookup.
#[derive(Clone)]
pub struct GeoEnricher {
    lookup: Option<Arc<dyn GeoLookup>>,
    timeout: Duration,
}

impl GeoEnricher {
    pub fn new(lookup: Arc<dyn GeoLookup>) -> Self {
        Self {
            lookup: Some(lookup),
            timeout: GEO_LOOKUP_TIMEOUT,
        }
    }

    /// Public addresses resolve to [`Location::unknown`] without a lookup.
    pub fn disabled() -> Self {
        Self {
            lookup: None,
            timeout: GEO_LOOKUP_TIMEOUT,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.lookup.is_some()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Never fails: timeouts and lookup errors degrade to [`Location::unknown`].
    pub async fn locate(&self, raw_ip: &str) -> Location {
        let ip = match classify_address(raw_ip) {
            AddressClass::Local => return Location::local(),
            AddressClass::Private => return Location::private_network(),
            AddressClass::Invalid => return Location::unknown(),
            AddressClass::Public(ip) => ip,
        };
        let Some(lookup) = &self.lookup else {
            return Location::unknown();
        };

        match self.lookup_bounded(Arc::clone(lookup), ip).await {
            Ok(location) => location,
            Err(err) => {
                debug!(%ip, error = %err, "geo enrichment degraded to unknown");
                Location::unknown()
            }
        }
    }

    async fn lookup_bounded(
        &self,
        lookup: Arc<dyn GeoLookup>,
        ip: IpAddr,
    ) -> Result<Location, GeoError> {
        // The blocking task keeps running past the deadline; its result is dropped.
        let task = tokio::task::spawn_blocking(move || lookup.lookup(ip));

        match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join)) => Err(GeoError::Join(join.to_string())),
            Err(_) => Err(GeoError::Timeout(self.timeout)),
        }
    }
}
