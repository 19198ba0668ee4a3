pub mod config;
pub mod hours;
pub mod init;
pub mod serve;
pub mod stalls;
pub mod subscribers;

use anyhow::Context;
use gerai_core::config::Config;
use std::path::Path;

/// Load the config file and merge environment overrides.
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let mut config = Config::load(path)
        .with_context(|| format!("failed to load config from {}", path.display()))?;
    config.apply_env();
    Ok(config)
}
