//! Print the effective configuration.

use std::path::PathBuf;

use reelcut_common::config::{config_file_path, AppConfig};

pub fn run(config: &AppConfig, explicit_path: Option<PathBuf>) -> anyhow::Result<()> {
    let path = explicit_path.unwrap_or_else(config_file_path);
    let source = if path.exists() { "file" } else { "defaults" };
    println!("# {} ({source}, after environment overrides)", path.display());
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}
