//! Handlers behind the `logvista` subcommands.

mod check;
mod init;
mod query;
mod scan;
mod sites;

pub use check::{check, config_error_hint};
pub use init::init;
pub use query::{QueryArgs, query};
pub use scan::scan;
pub use sites::sites;

#[cfg(test)]
mod tests;

use anyhow::Context;
use tokio::runtime::Runtime;

/// One-shot commands run on a small dedicated runtime.
fn one_shot_runtime() -> anyhow::Result<Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("failed to build Tokio runtime")
}
