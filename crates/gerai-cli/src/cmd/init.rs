use gerai_core::config::Config;
use gerai_core::io::write_if_missing;
use std::path::Path;

pub fn run(config_path: &Path) -> anyhow::Result<()> {
    let yaml = serde_yaml::to_string(&Config::starter())?;
    if write_if_missing(config_path, yaml.as_bytes())? {
        println!("Created {}", config_path.display());
        println!("Add admin user ids under `admins:` and set GERAI_BOT_TOKEN before `gerai serve`.");
    } else {
        println!("{} already exists; left untouched.", config_path.display());
    }
    Ok(())
}
