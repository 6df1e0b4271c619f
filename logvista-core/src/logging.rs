use crate::conf::types::LogDestination;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt};

fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Initialize service logging: JSON events filtered by `RUST_LOG` (default "info").
///
/// With `TOKIO_CONSOLE` set, the tokio-console subscriber is installed instead.
/// The returned guard must be held for the lifetime of the process when logging to a file.
pub fn init_logging(
    destination: LogDestination,
    log_dir: &Path,
    file_name: &str,
) -> anyhow::Result<Option<WorkerGuard>> {
    if std::env::var("TOKIO_CONSOLE").is_ok() {
        console_subscriber::init();
        return Ok(None);
    }

    match destination {
        LogDestination::Stdout => {
            fmt()
                .with_env_filter(env_filter("info"))
                .json()
                .flatten_event(true)
                .try_init()
                .map_err(|e| anyhow::anyhow!(e))?;
            Ok(None)
        }
        LogDestination::File => {
            std::fs::create_dir_all(log_dir)?;
            let appender = tracing_appender::rolling::never(log_dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            fmt()
                .with_env_filter(env_filter("info"))
                .json()
                .flatten_event(true)
                .with_writer(writer)
                .try_init()
                .map_err(|e| anyhow::anyhow!(e))?;
            Ok(Some(guard))
        }
    }
}

/// One-shot commands print results on stdout, so their logs go to stderr (default "warn").
pub fn init_cli_logging() {
    let _ = fmt()
        .with_env_filter(env_filter("warn"))
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}
