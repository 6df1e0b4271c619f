use crate::conf::RuntimeConfig;
use crate::site::SiteRegistry;

pub fn sites(config: &RuntimeConfig) -> anyhow::Result<()> {
    let registry = SiteRegistry::from_config(&config.sites);
    println!("{}", serde_json::to_string_pretty(&registry.summaries())?);
    Ok(())
}
