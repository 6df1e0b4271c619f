use crate::clock::SystemClock;
use crate::conf::RuntimeConfig;
use crate::server::{build_app_with, open_store, run_scan_pass};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Runs a single pass over every site and prints one line per site.
pub fn scan(config: RuntimeConfig) -> anyhow::Result<()> {
    let runtime = super::one_shot_runtime()?;

    let results = runtime.block_on(async {
        let store = open_store(&config).await?;
        let app = build_app_with(&config, store.clone(), Arc::new(SystemClock)).await?;
        let results = run_scan_pass(&app, &CancellationToken::new()).await;
        store.close().await;
        anyhow::Ok(results)
    })?;

    for result in &results {
        match &result.error {
            None => println!(
                "{:<16} {:>8} entries {:>6} dropped {:>8.2?}{}",
                result.site,
                result.entries_read,
                result.entries_dropped,
                result.duration,
                if result.rotated { "  (rotated)" } else { "" }
            ),
            Some(err) => println!("{:<16} error: {err}", result.site),
        }
    }

    Ok(())
}
