mod identity;
mod pv_filter;
mod runtime;
pub(crate) mod server;
mod site;

pub use identity::{IdentityConfig, UaEngineKind};
pub use pv_filter::PvFilterConfig;
pub use runtime::RuntimeConfig;
pub use server::{LogDestination, ServerConfig};
pub use site::SiteConfig;
