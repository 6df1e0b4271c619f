use crate::enrichment::user_agent::{DeviceType, UserAgentInfo, looks_like_tablet};
use woothee::parser::Parser;

const UNKNOWN: &str = "UNKNOWN";

pub struct WootheeEngine {
    parser: Parser,
}

impl WootheeEngine {
    pub fn new() -> Self {
        Self {
            parser: Parser::new(),
        }
    }

    pub fn parse(&self, ua: &str) -> UserAgentInfo {
        let Some(result) = self.parser.parse(ua) else {
            return UserAgentInfo::unknown();
        };

        if result.category == "crawler" {
            return UserAgentInfo::bot();
        }

        let device_type = match result.category {
            "pc" => DeviceType::Desktop,
            "smartphone" | "mobilephone" if looks_like_tablet(ua) => DeviceType::Tablet,
            "smartphone" | "mobilephone" => DeviceType::Mobile,
            _ => DeviceType::Other,
        };

        UserAgentInfo {
            browser: known(result.name),
            os: known(result.os),
            device_type,
            is_bot: false,
        }
    }
}

fn known(value: &str) -> Option<String> {
    (!value.is_empty() && value != UNKNOWN).then(|| value.to_string())
}
