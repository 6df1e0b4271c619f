use crate::conf::error::ConfigError;
use crate::conf::types::RuntimeConfig;
use crate::conf::validation::{ValidatedConfig, validate_runtime_config};
use std::fs;
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = "logvista.hcl";

pub fn load_config(path: &Path) -> Result<ValidatedConfig, ConfigError> {
    //--------------------------------------------------------------------------
    // Hard fail: IO
    //--------------------------------------------------------------------------
    let source = fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;

    parse_config(&source, path)
}

/// `origin` is only used for error messages.
pub fn parse_config(source: &str, origin: &Path) -> Result<ValidatedConfig, ConfigError> {
    //--------------------------------------------------------------------------
    // Hard fail: parsing
    //--------------------------------------------------------------------------
    let config: RuntimeConfig =
        hcl::from_str(source).map_err(|e| ConfigError::parse(origin, e))?;

    //--------------------------------------------------------------------------
    // Semantic validation (aggregate all issues)
    //--------------------------------------------------------------------------
    let report = validate_runtime_config(&config);
    if !report.errors.is_empty() {
        return Err(ConfigError::Validation { report });
    }

    Ok(ValidatedConfig { config, report })
}
