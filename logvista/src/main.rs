use clap::{Parser, Subcommand};
use logvista_core::cli::{self, QueryArgs};
use logvista_core::conf::{ConfigError, DEFAULT_CONFIG_FILE, RuntimeConfig, load_config};
use logvista_core::logging::{init_cli_logging, init_logging};
use logvista_core::server;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "logvista",
    version,
    about = "logvista: incremental access-log analytics"
)]
struct Cli {
    /// Path to the logvista config file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan logs on a schedule until interrupted (default)
    Run,

    /// Scan every site once and print what was ingested
    Scan,

    /// Run one stats query and print the JSON result
    Query {
        /// overall, timeseries, url, referer, browser, os, device or location
        kind: String,

        #[arg(long)]
        site: String,

        /// today, week, last7days, month, last30days or START/END (RFC 3339)
        #[arg(long, default_value = "today")]
        range: String,

        /// hourly or daily (timeseries only)
        #[arg(long)]
        view: Option<String>,

        #[arg(long)]
        limit: Option<i64>,

        /// domestic or global (location only)
        #[arg(long)]
        location: Option<String>,
    },

    /// List configured sites as JSON
    Sites,

    /// Configuration tooling
    Config {
        #[command(subcommand)]
        cmd: ConfigCmd,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCmd {
    /// Validate configuration and exit
    Check {
        /// Print issues without colors
        #[arg(short, long, default_value = "false")]
        plain: bool,
    },

    /// Write a starter config file
    Init {
        /// Where to write it; defaults to --config
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    match args.command.unwrap_or(Command::Run) {
        Command::Run => {
            let config = load(&args.config)?;
            let _guard = init_logging(
                config.server.log_destination,
                &config.server.data_dir,
                config.server.log_file_name(),
            )?;
            tracing::info!(config = %args.config.display(), "starting logvista");
            server::run(config)
        }

        Command::Scan => {
            init_cli_logging();
            cli::scan(load(&args.config)?)
        }

        Command::Query {
            kind,
            site,
            range,
            view,
            limit,
            location,
        } => {
            init_cli_logging();
            let query = QueryArgs {
                kind,
                site,
                range,
                view,
                limit,
                location,
            };
            cli::query(load(&args.config)?, query)
        }

        Command::Sites => cli::sites(&load(&args.config)?),

        Command::Config {
            cmd: ConfigCmd::Check { plain },
        } => cli::check(&args.config, plain),

        Command::Config {
            cmd: ConfigCmd::Init { path },
        } => cli::init(path.as_deref().unwrap_or(&args.config)),
    }
}

fn load(path: &Path) -> anyhow::Result<RuntimeConfig> {
    match load_config(path) {
        Ok(validated) => Ok(validated.config),
        Err(err) => {
            if let ConfigError::Validation { report } = &err {
                report.render_pretty();
            } else if let Some(hint) = cli::config_error_hint(&err) {
                eprintln!("{hint}\n");
            }
            Err(err.into())
        }
    }
}
