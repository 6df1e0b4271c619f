use crate::site::SiteId;
use crate::stats::error::QueryError;
use crate::stats::range::RangeLabel;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_LIMIT: usize = 10;
pub const DEFAULT_LOCATION_LIMIT: usize = 99;
pub const MAX_LIMIT: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewType {
    Hourly,
    Daily,
}

impl FromStr for ViewType {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hourly" => Ok(ViewType::Hourly),
            "daily" => Ok(ViewType::Daily),
            other => Err(QueryError::InvalidParameter {
                name: "view_type",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for ViewType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ViewType::Hourly => "hourly",
            ViewType::Daily => "daily",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocationScope {
    Domestic,
    Global,
}

impl FromStr for LocationScope {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "domestic" => Ok(LocationScope::Domestic),
            "global" => Ok(LocationScope::Global),
            other => Err(QueryError::InvalidParameter {
                name: "location_type",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for LocationScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LocationScope::Domestic => "domestic",
            LocationScope::Global => "global",
        })
    }
}

/// Grouping column of a breakdown query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    Url,
    Referer,
    Browser,
    Os,
    Device,
    Location(LocationScope),
}

impl Dimension {
    pub fn kind(&self) -> &'static str {
        match self {
            Dimension::Url => "url",
            Dimension::Referer => "referer",
            Dimension::Browser => "browser",
            Dimension::Os => "os",
            Dimension::Device => "device",
            Dimension::Location(_) => "location",
        }
    }

    /// Column in the per-site event table.
    pub fn column(&self) -> &'static str {
        match self {
            Dimension::Url => "url",
            Dimension::Referer => "referer",
            Dimension::Browser => "user_browser",
            Dimension::Os => "user_os",
            Dimension::Device => "user_device",
            Dimension::Location(LocationScope::Domestic) => "domestic_location",
            Dimension::Location(LocationScope::Global) => "global_location",
        }
    }

    fn default_limit(&self) -> usize {
        match self {
            Dimension::Location(_) => DEFAULT_LOCATION_LIMIT,
            _ => DEFAULT_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Query {
    Overall,
    Timeseries(ViewType),
    Breakdown { dimension: Dimension, limit: usize },
}

impl Query {
    pub fn kind(&self) -> &'static str {
        match self {
            Query::Overall => "overall",
            Query::Timeseries(_) => "timeseries",
            Query::Breakdown { dimension, .. } => dimension.kind(),
        }
    }
}

/// A fully validated query. Its `Display` form is the cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StatsQuery {
    pub site: SiteId,
    pub range: RangeLabel,
    pub query: Query,
}

/// Untyped query parameters as they arrive from a client.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatsRequest {
    pub kind: String,
    pub site: String,
    pub time_range: String,
    pub view_type: Option<String>,
    pub limit: Option<i64>,
    pub location_type: Option<String>,
}

impl StatsQuery {
    pub fn parse(
        kind: &str,
        site: &str,
        time_range: &str,
        view_type: Option<&str>,
        limit: Option<i64>,
        location_type: Option<&str>,
    ) -> Result<Self, QueryError> {
        let site = SiteId::new(site);
        if !site.is_valid() {
            return Err(QueryError::UnknownSite(site.0));
        }

        let range: RangeLabel = time_range.parse()?;

        let dimension = match kind {
            "overall" => None,
            "timeseries" => None,
            "url" => Some(Dimension::Url),
            "referer" => Some(Dimension::Referer),
            "browser" => Some(Dimension::Browser),
            "os" => Some(Dimension::Os),
            "device" => Some(Dimension::Device),
            "location" => {
                let scope = location_type.ok_or(QueryError::MissingParameter("location_type"))?;
                Some(Dimension::Location(scope.parse()?))
            }
            other => return Err(QueryError::UnsupportedKind(other.to_string())),
        };

        let query = match (kind, dimension) {
            ("timeseries", _) => {
                let view = view_type.ok_or(QueryError::MissingParameter("view_type"))?;
                Query::Timeseries(view.parse()?)
            }
            (_, Some(dimension)) => Query::Breakdown {
                dimension,
                limit: resolve_limit(limit, dimension)?,
            },
            _ => Query::Overall,
        };

        Ok(StatsQuery { site, range, query })
    }

    pub fn from_request(request: &StatsRequest) -> Result<Self, QueryError> {
        Self::parse(
            &request.kind,
            &request.site,
            &request.time_range,
            request.view_type.as_deref(),
            request.limit,
            request.location_type.as_deref(),
        )
    }

    pub fn cache_key(&self) -> String {
        self.to_string()
    }
}

fn resolve_limit(limit: Option<i64>, dimension: Dimension) -> Result<usize, QueryError> {
    match limit {
        None => Ok(dimension.default_limit()),
        Some(n) if n <= 0 => Err(QueryError::InvalidParameter {
            name: "limit",
            value: n.to_string(),
        }),
        Some(n) => Ok(usize::try_from(n).unwrap_or(MAX_LIMIT).min(MAX_LIMIT)),
    }
}

impl fmt::Display for StatsQuery {
    /// `<kind>|<site>|<range>|<view>|limit=<n>|location=<scope>`, `-` for absent parts.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}|{}|", self.query.kind(), self.site, self.range)?;
        match self.query {
            Query::Overall => f.write_str("-|limit=-|location=-"),
            Query::Timeseries(view) => write!(f, "{view}|limit=-|location=-"),
            Query::Breakdown { dimension, limit } => {
                write!(f, "-|limit={limit}|location=")?;
                match dimension {
                    Dimension::Location(scope) => write!(f, "{scope}"),
                    _ => f.write_str("-"),
                }
            }
        }
    }
}
