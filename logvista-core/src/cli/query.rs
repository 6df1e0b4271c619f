use crate::clock::SystemClock;
use crate::conf::RuntimeConfig;
use crate::server::{build_app_with, open_store};
use crate::stats::StatsRequest;
use std::sync::Arc;

/// Arguments of `logvista query`.
#[derive(Debug, Clone)]
pub struct QueryArgs {
    pub kind: String,
    pub site: String,
    pub range: String,
    pub view: Option<String>,
    pub limit: Option<i64>,
    pub location: Option<String>,
}

impl From<QueryArgs> for StatsRequest {
    fn from(args: QueryArgs) -> Self {
        StatsRequest {
            kind: args.kind,
            site: args.site,
            time_range: args.range,
            view_type: args.view,
            limit: args.limit,
            location_type: args.location,
        }
    }
}

/// Prints the result as pretty JSON. Does not scan first.
pub fn query(config: RuntimeConfig, args: QueryArgs) -> anyhow::Result<()> {
    let runtime = super::one_shot_runtime()?;
    let request = StatsRequest::from(args);

    let json = runtime.block_on(async {
        let store = open_store(&config).await?;
        let app = build_app_with(&config, store.clone(), Arc::new(SystemClock)).await?;
        let result = app.stats.handle(&request).await;
        store.close().await;
        anyhow::Ok(serde_json::to_string_pretty(&*result?)?)
    })?;

    println!("{json}");
    Ok(())
}
