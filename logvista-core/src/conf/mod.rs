mod error;
mod loader;
pub mod types;
pub(crate) mod validation;


pub use error::ConfigError;
pub use loader::{DEFAULT_CONFIG_FILE, load_config, parse_config};
pub use types::RuntimeConfig;
pub use validation::{ValidatedConfig, ValidationReport};
