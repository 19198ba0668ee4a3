use crate::error::{GeraiError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Stall
// ---------------------------------------------------------------------------

/// A single vendor unit whose open/closed status is tracked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stall {
    pub id: String,
    #[serde(rename = "name")]
    pub display_name: String,
    /// Optional grouping tag (e.g. "medan", "kolej").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl Stall {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            location: None,
        }
    }

    pub fn at(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

/// The stalls the bot shipped with.
pub fn default_stalls() -> Vec<Stall> {
    vec![
        Stall::new("gerai11", "Gerai 11 - Kedai Air Belah Kanan"),
        Stall::new("gerai17", "Gerai 17 - Kedai Nasi Campur"),
        Stall::new("gerai19", "Gerai 19 - Kedai Ayam Penyet"),
        Stall::new("gerai20", "Gerai 20 - Kedai Air Belah Kiri"),
        Stall::new("gerai23", "Gerai 23 - Kedai Runcit Medan"),
    ]
}

// ---------------------------------------------------------------------------
// Id validation
// ---------------------------------------------------------------------------

static STALL_ID_RE: OnceLock<Regex> = OnceLock::new();

fn stall_id_re() -> &'static Regex {
    STALL_ID_RE.get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9_\-]*$").unwrap())
}

/// Stall ids travel inside chat callback data (`update_<id>`, 64 bytes max),
/// so they are kept short and free of separators the transports care about.
pub fn validate_stall_id(id: &str) -> Result<()> {
    if id.is_empty() || id.len() > 48 || !stall_id_re().is_match(id) {
        return Err(GeraiError::InvalidStallId(id.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Static catalog of stalls, fixed for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct Registry {
    stalls: Vec<Stall>,
}

impl Registry {
    pub fn new(stalls: Vec<Stall>) -> Result<Self> {
        let mut seen = HashSet::new();
        for stall in &stalls {
            validate_stall_id(&stall.id)?;
            if !seen.insert(stall.id.as_str()) {
                return Err(GeraiError::DuplicateStall(stall.id.clone()));
            }
        }
        Ok(Self { stalls })
    }

    pub fn get(&self, id: &str) -> Option<&Stall> {
        self.stalls.iter().find(|s| s.id == id)
    }

    /// Look up a stall, failing with `UnknownStall` for unregistered ids.
    pub fn require(&self, id: &str) -> Result<&Stall> {
        self.get(id)
            .ok_or_else(|| GeraiError::UnknownStall(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn stalls(&self) -> &[Stall] {
        &self.stalls
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.stalls.iter().map(|s| s.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.stalls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stalls.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
