//! Subcommand implementations.

pub mod batch;
pub mod config;
pub mod ledger;
pub mod process;

use std::path::{Path, PathBuf};

use tracing::debug;

use shiprec_core::ShiprecConfig;

/// Default location of the configuration file.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("shiprec")
        .join("config.json")
}

/// Load configuration from `--config`, else the default file, else defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<ShiprecConfig> {
    let config = match config_path {
        Some(path) => ShiprecConfig::from_file(Path::new(path))?,
        None => {
            let path = default_config_path();
            if path.exists() {
                debug!("Loading config from {}", path.display());
                ShiprecConfig::from_file(&path)?
            } else {
                ShiprecConfig::default()
            }
        }
    };

    let issues = config.validate();
    if !issues.is_empty() {
        anyhow::bail!("Invalid configuration: {}", issues.join("; "));
    }
    Ok(config)
}
