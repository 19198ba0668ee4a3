use crate::admin::AdminList;
use crate::error::{GeraiError, Result};
use crate::hours::{Gate, OperatingHours};
use crate::registry::{default_stalls, validate_stall_id, Registry, Stall};
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "gerai.yaml";

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

impl ConfigWarning {
    fn warning(message: impl Into<String>) -> Self {
        Self {
            level: WarnLevel::Warning,
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            level: WarnLevel::Error,
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default = "default_name")]
    pub name: String,
    /// Offset of the deployment's wall clock from UTC. Malaysia is +8h.
    #[serde(default = "default_utc_offset")]
    pub utc_offset_minutes: i32,
    #[serde(default)]
    pub operating_hours: OperatingHours,
    /// Treat every moment as inside operating hours. For testing only.
    #[serde(default)]
    pub force_open: bool,
    #[serde(default)]
    pub admins: Vec<String>,
    #[serde(default)]
    pub notify_on_auto_close: bool,
    /// JSON file holding subscriber ids. In-memory when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscribers_path: Option<PathBuf>,
    #[serde(default = "default_stalls")]
    pub stalls: Vec<Stall>,
}

fn default_version() -> u32 {
    1
}

fn default_name() -> String {
    "UiTM Jasin Gerai Checker".to_string()
}

fn default_utc_offset() -> i32 {
    8 * 60
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            name: default_name(),
            utc_offset_minutes: default_utc_offset(),
            operating_hours: OperatingHours::default(),
            force_open: false,
            admins: Vec::new(),
            notify_on_auto_close: false,
            subscribers_path: None,
            stalls: default_stalls(),
        }
    }
}

impl Config {
    /// The file `gerai init` writes: defaults plus a subscriber file next to
    /// the config, so subscriptions survive restarts.
    pub fn starter() -> Self {
        Self {
            subscribers_path: Some(PathBuf::from("subscribers.json")),
            ..Self::default()
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(GeraiError::ConfigNotFound(path.display().to_string()));
        }
        let data = std::fs::read_to_string(path)?;
        let mut cfg: Config = serde_yaml::from_str(&data)?;
        // Relative subscriber paths are anchored next to the config file.
        if let (Some(sub), Some(dir)) = (&cfg.subscribers_path, path.parent()) {
            if sub.is_relative() && !dir.as_os_str().is_empty() {
                cfg.subscribers_path = Some(dir.join(sub));
            }
        }
        Ok(cfg)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(path, data.as_bytes())
    }

    /// Merge `GERAI_ADMINS` and `GERAI_FORCE_OPEN` from the process
    /// environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(csv) = lookup("GERAI_ADMINS") {
            for id in csv.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                if !self.admins.iter().any(|a| a == id) {
                    self.admins.push(id.to_string());
                }
            }
        }
        if let Some(flag) = lookup("GERAI_FORCE_OPEN") {
            self.force_open = matches!(flag.trim(), "1" | "true" | "yes");
        }
    }

    pub fn utc_offset(&self) -> Result<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).ok_or_else(|| {
            GeraiError::InvalidConfig(format!(
                "utc_offset_minutes out of range: {}",
                self.utc_offset_minutes
            ))
        })
    }

    pub fn gate(&self) -> Gate {
        Gate::new(self.operating_hours, self.force_open)
    }

    pub fn registry(&self) -> Result<Registry> {
        Registry::new(self.stalls.clone())
    }

    pub fn admin_list(&self) -> AdminList {
        AdminList::new(&self.admins)
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.stalls.is_empty() {
            warnings.push(ConfigWarning::error("no stalls configured"));
        }

        let mut seen = HashSet::new();
        for stall in &self.stalls {
            if validate_stall_id(&stall.id).is_err() {
                warnings.push(ConfigWarning::error(format!(
                    "stall id '{}' is invalid (lowercase alphanumeric, '-' or '_')",
                    stall.id
                )));
            }
            if !seen.insert(stall.id.as_str()) {
                warnings.push(ConfigWarning::error(format!(
                    "stall id '{}' appears more than once",
                    stall.id
                )));
            }
            if stall.display_name.trim().is_empty() {
                warnings.push(ConfigWarning::warning(format!(
                    "stall '{}' has an empty name",
                    stall.id
                )));
            }
        }

        let h = self.operating_hours;
        if h.start_hour > 23 || h.end_hour > 24 {
            warnings.push(ConfigWarning::error(format!(
                "operating_hours out of range: start_hour={} end_hour={} (0-23 / 0-24)",
                h.start_hour, h.end_hour
            )));
        } else if h.is_empty() {
            warnings.push(ConfigWarning::warning(
                "operating_hours window is empty; citizen updates are always rejected",
            ));
        }

        if self.utc_offset().is_err() {
            warnings.push(ConfigWarning::error(format!(
                "utc_offset_minutes out of range: {}",
                self.utc_offset_minutes
            )));
        }

        if self.admins.is_empty() {
            warnings.push(ConfigWarning::warning(
                "no admins configured; the override path is unusable",
            ));
        }

        if self.force_open {
            warnings.push(ConfigWarning::warning(
                "force_open is set; operating hours are ignored",
            ));
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
