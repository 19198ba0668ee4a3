use super::load_config;
use crate::output::{print_json, print_table};
use std::path::Path;

pub fn run(config_path: &Path, json: bool) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let registry = config.registry()?;

    if json {
        return print_json(&registry.stalls());
    }

    let rows = registry
        .stalls()
        .iter()
        .map(|s| {
            vec![
                s.id.clone(),
                s.display_name.clone(),
                s.location.clone().unwrap_or_else(|| "-".into()),
            ]
        })
        .collect();
    print_table(&["ID", "NAME", "LOCATION"], rows);
    Ok(())
}
