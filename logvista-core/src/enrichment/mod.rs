pub mod geoip;
pub mod user_agent;
