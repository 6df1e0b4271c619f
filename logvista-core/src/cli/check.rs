use crate::conf::{ConfigError, load_config};
use std::path::Path;

pub fn check(path: &Path, plain: bool) -> anyhow::Result<()> {
    match load_config(path) {
        Ok(validated) => {
            let cfg = &validated.config;
            println!("✔ Config loaded successfully");
            println!("✔ {} sites", cfg.sites.len());
            println!(
                "✔ user-agent parsing {}",
                if cfg.identity.enable_user_agent { "enabled" } else { "disabled" }
            );
            println!(
                "✔ geoip {}",
                if cfg.identity.enable_geoip { "enabled" } else { "disabled" }
            );
            if validated.report.has_violations() {
                render(&validated.report, plain);
            }
            Ok(())
        }
        Err(err) => {
            print_config_error(err, plain);
            std::process::exit(1);
        }
    }
}

fn render(report: &crate::conf::ValidationReport, plain: bool) {
    if plain {
        report.render_plain();
    } else {
        report.render_pretty();
    }
}

fn print_config_error(err: ConfigError, plain: bool) {
    let hint = config_error_hint(&err);
    match &err {
        ConfigError::Validation { report } => render(report, plain),
        other => eprintln!("{other}"),
    }
    if let Some(hint) = hint {
        eprintln!();
        eprintln!("{}", hint);
    }
}

pub fn config_error_hint(err: &ConfigError) -> Option<&'static str> {
    match err {
        ConfigError::ReadFile { .. } => Some(
            "Pass the config file explicitly with --config, or run\n\
             `logvista config init` to write a starter logvista.hcl.",
        ),
        ConfigError::Parse { .. } => Some(
            "The file must be HCL. A minimal configuration:\n\
             \n\
             sites = [\n\
             \x20 { id = \"blog\", log_path = \"/var/log/nginx/access.log\" },\n\
             ]",
        ),
        ConfigError::Validation { .. } => None,
    }
}
