use anyhow::{Context, Result, bail};
use rust_embed::RustEmbed;
use std::fs;
use std::path::Path;

#[derive(RustEmbed)]
#[folder = "config-templates/"]
struct ConfigTemplates;

const TEMPLATE: &str = "logvista.hcl";

/// Writes the starter config to `path`. Never overwrites an existing file.
pub fn init(path: &Path) -> Result<()> {
    write_template(path)?;

    println!("✔ Wrote starter config to {}", path.display());
    println!();
    println!("Next steps:");
    println!("  edit the site block to point at your access log");
    println!("  logvista --config {} config check", path.display());
    println!("  logvista --config {} run", path.display());

    Ok(())
}

pub(crate) fn write_template(path: &Path) -> Result<()> {
    if path.exists() {
        bail!("{} already exists; refusing to overwrite it", path.display());
    }

    if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }

    fs::write(path, template()?.trim_start())
        .with_context(|| format!("failed to write {}", path.display()))
}

/// The embedded config template as UTF-8 text
fn template() -> Result<String> {
    let file = ConfigTemplates::get(TEMPLATE)
        .with_context(|| format!("missing embedded config template: {TEMPLATE}"))?;

    let s =
        std::str::from_utf8(file.data.as_ref()).context("config template is not valid UTF-8")?;

    Ok(s.to_owned())
}
