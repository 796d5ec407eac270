//! CLI subcommands.

pub mod batch;
pub mod config;
pub mod process;

use std::path::{Path, PathBuf};

use tally_core::TallyConfig;

/// Default configuration file location.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tally")
        .join("config.json")
}

/// Load the config from `--config`, the default location, or defaults.
///
/// The summarizer API key falls back to the environment.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<TallyConfig> {
    let mut config = match config_path {
        Some(path) => TallyConfig::from_file(Path::new(path))?,
        None => {
            let path = default_config_path();
            if path.exists() {
                TallyConfig::from_file(&path)?
            } else {
                TallyConfig::default()
            }
        }
    };

    config.validate()?;
    config.summary = config.summary.with_env_api_key();
    Ok(config)
}
