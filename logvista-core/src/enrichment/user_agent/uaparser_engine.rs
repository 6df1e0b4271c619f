use crate::enrichment::user_agent::{DeviceType, UserAgentInfo, looks_like_tablet};
use uaparser::{Parser, UserAgentParser};

const OTHER: &str = "Other";

pub struct UaParserEngine {
    parser: UserAgentParser,
}

impl UaParserEngine {
    pub fn new(regexes_yaml: &[u8]) -> anyhow::Result<Self> {
        let parser = UserAgentParser::from_bytes(regexes_yaml)?;
        Ok(Self { parser })
    }

    pub fn parse(&self, ua: &str) -> UserAgentInfo {
        let client = self.parser.parse(ua);

        let ua_family = client.user_agent.family.to_lowercase();
        let device_family = client.device.family.to_lowercase();

        let is_bot = device_family == "spider"
            || ua_family.contains("bot")
            || ua_family.contains("crawler")
            || ua_family.contains("spider");

        if is_bot {
            return UserAgentInfo::bot();
        }

        let device_type = if device_family.contains("tablet") || looks_like_tablet(ua) {
            DeviceType::Tablet
        } else if device_family.contains("mobile") || ua.contains("Mobile") {
            DeviceType::Mobile
        } else if client.os.family != OTHER {
            DeviceType::Desktop
        } else {
            DeviceType::Other
        };

        UserAgentInfo {
            browser: known(&client.user_agent.family),
            os: known(&client.os.family),
            device_type,
            is_bot: false,
        }
    }
}

fn known(family: &str) -> Option<String> {
    (!family.is_empty() && family != OTHER).then(|| family.to_string())
}
