use crate::enrichment::geoip::Location;
use crate::enrichment::user_agent::{UaEngine, UserAgentInfo};
use crate::event::decode::decode_or_raw;
use crate::event::line::{TIMESTAMP_FORMAT, split_line};
use crate::event::page_view::PageViewFilter;
use crate::event::record::{AccessEvent, BOT, OTHER};
use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedLine {
    #[error("line does not match the access log grammar")]
    Grammar,

    #[error("invalid timestamp '{0}'")]
    Timestamp(String),

    #[error("invalid {field} '{value}'")]
    Number { field: &'static str, value: String },
}

pub struct Classifier {
    filter: PageViewFilter,
    ua_engine: Option<UaEngine>,
}

impl Classifier {
    pub fn new(filter: PageViewFilter, ua_engine: Option<UaEngine>) -> Self {
        Self { filter, ua_engine }
    }

    /// Location is left as [`Location::unknown`]; geo enrichment happens afterwards.
    pub fn classify(&self, line: &str) -> Result<AccessEvent, MalformedLine> {
        let raw = split_line(line).ok_or(MalformedLine::Grammar)?;

        let timestamp = DateTime::parse_from_str(raw.timestamp, TIMESTAMP_FORMAT)
            .map_err(|_| MalformedLine::Timestamp(raw.timestamp.to_string()))?
            .with_timezone(&Utc);

        let status = raw.status.parse::<u16>().map_err(|_| MalformedLine::Number {
            field: "status",
            value: raw.status.to_string(),
        })?;

        let bytes_sent = raw
            .bytes
            .parse::<u64>()
            .ok()
            .filter(|b| i64::try_from(*b).is_ok())
            .ok_or_else(|| MalformedLine::Number {
                field: "bytes",
                value: raw.bytes.to_string(),
            })?;

        let path = decode_or_raw(raw.target);
        let referer = decode_or_raw(raw.referer);
        let page_view = self.filter.is_page_view(status, &path);

        let client = self
            .ua_engine
            .as_ref()
            .map(|engine| engine.parse(raw.user_agent))
            .unwrap_or_else(UserAgentInfo::unknown);

        let (browser, os, device) = if client.is_bot {
            (BOT.to_string(), BOT.to_string(), BOT.to_string())
        } else {
            (
                client.browser.unwrap_or_else(|| OTHER.to_string()),
                client.os.unwrap_or_else(|| OTHER.to_string()),
                client.device_type.as_str().to_string(),
            )
        };

        Ok(AccessEvent {
            ip: raw.ip.to_string(),
            page_view,
            timestamp,
            method: raw.method.to_string(),
            path,
            status,
            bytes_sent,
            referer,
            browser,
            os,
            device,
            location: Location::unknown(),
        })
    }
}
