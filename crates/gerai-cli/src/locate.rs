use gerai_core::config::DEFAULT_CONFIG_FILE;
use std::path::{Path, PathBuf};

/// Resolve the config file path.
///
/// Priority:
/// 1. `--config` flag / `GERAI_CONFIG` env var (passed in as `explicit`)
/// 2. Walk upward from `cwd` looking for `gerai.yaml`
/// 3. Fall back to `cwd/gerai.yaml`
pub fn resolve_config(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    let mut dir = cwd.clone();
    loop {
        let candidate = dir.join(DEFAULT_CONFIG_FILE);
        if candidate.is_file() {
            return candidate;
        }
        match dir.parent() {
            Some(p) => dir = p.to_path_buf(),
            None => break,
        }
    }

    cwd.join(DEFAULT_CONFIG_FILE)
}
