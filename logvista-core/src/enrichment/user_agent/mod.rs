mod uaparser_engine;
mod woothee_engine;


use crate::conf::types::UaEngineKind;
use crate::enrichment::user_agent::uaparser_engine::UaParserEngine;
use crate::enrichment::user_agent::woothee_engine::WootheeEngine;
use std::path::Path;

/// User-agents longer than this are not parsed.
pub const MAX_USER_AGENT_LENGTH: usize = 2048;

pub fn build_ua_engine(kind: UaEngineKind, regexes: Option<&Path>) -> anyhow::Result<UaEngine> {
    match kind {
        UaEngineKind::UaParser => {
            let path = regexes
                .ok_or_else(|| anyhow::anyhow!("the uaparser engine requires `ua_regexes`"))?;
            let yaml = std::fs::read(path)?;
            Ok(UaEngine::UaParser(UaParserEngine::new(&yaml)?))
        }
        UaEngineKind::Woothee => Ok(UaEngine::Woothee(WootheeEngine::new())),
    }
}

pub enum UaEngine {
    UaParser(UaParserEngine),
    Woothee(WootheeEngine),
}

impl UaEngine {
    pub fn parse(&self, ua: &str) -> UserAgentInfo {
        if ua.is_empty() || ua == "-" || ua.len() > MAX_USER_AGENT_LENGTH {
            return UserAgentInfo::unknown();
        }
        match self {
            UaEngine::UaParser(p) => p.parse(ua),
            UaEngine::Woothee(p) => p.parse(ua),
        }
    }
}

/// Decomposed client software. `None` families resolve to the "other" bucket downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAgentInfo {
    pub browser: Option<String>,
    pub os: Option<String>,
    pub device_type: DeviceType,
    pub is_bot: bool,
}

impl UserAgentInfo {
    pub fn unknown() -> Self {
        Self {
            browser: None,
            os: None,
            device_type: DeviceType::Other,
            is_bot: false,
        }
    }

    pub fn bot() -> Self {
        Self {
            browser: None,
            os: None,
            device_type: DeviceType::Bot,
            is_bot: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceType {
    Desktop,
    Mobile,
    Tablet,
    Bot,
    Other,
}

impl DeviceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Desktop => "desktop",
            DeviceType::Mobile => "mobile",
            DeviceType::Tablet => "tablet",
            DeviceType::Bot => "bot",
            DeviceType::Other => "other",
        }
    }
}

/// Tablets advertise themselves inconsistently; both engines share this check.
pub(crate) fn looks_like_tablet(ua: &str) -> bool {
    ua.contains("iPad")
        || ua.contains("Tablet")
        || (ua.contains("Android") && !ua.contains("Mobile"))
}
