use crate::clock::Timestamp;
use crate::error::{GeraiError, Result};
use crate::hours::OperatingHours;
use crate::registry::Registry;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// StallStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StallStatus {
    pub is_open: bool,
    pub last_updated_at: Option<Timestamp>,
    pub last_updated_by: Option<String>,
}

// ---------------------------------------------------------------------------
// StatusStore
// ---------------------------------------------------------------------------

/// Per-stall open/closed state, one entry per registry stall.
#[derive(Debug, Clone)]
pub struct StatusStore {
    order: Vec<String>,
    entries: HashMap<String, StallStatus>,
}

impl StatusStore {
    /// Every stall starts closed with no attribution.
    pub fn new(registry: &Registry) -> Self {
        let order: Vec<String> = registry.ids().map(str::to_string).collect();
        let entries = order
            .iter()
            .map(|id| (id.clone(), StallStatus::default()))
            .collect();
        Self { order, entries }
    }

    pub fn get(&self, id: &str) -> Result<&StallStatus> {
        self.entries
            .get(id)
            .ok_or_else(|| GeraiError::UnknownStall(id.to_string()))
    }

    /// Snapshot of every stall in registry order.
    pub fn get_all(&self) -> Vec<(String, StallStatus)> {
        self.order
            .iter()
            .filter_map(|id| self.entries.get(id).map(|s| (id.clone(), s.clone())))
            .collect()
    }

    /// Overwrite a stall's status and attribution, returning the previous
    /// `is_open`. Callers short-circuit no-op transitions themselves.
    pub fn set_status(
        &mut self,
        id: &str,
        is_open: bool,
        actor: &str,
        now: Timestamp,
    ) -> Result<bool> {
        let entry = self
            .entries
            .get_mut(id)
            .ok_or_else(|| GeraiError::UnknownStall(id.to_string()))?;
        let previous = entry.is_open;
        entry.is_open = is_open;
        entry.last_updated_at = Some(now);
        entry.last_updated_by = Some(actor.to_string());
        Ok(previous)
    }

    pub fn open_ids(&self) -> Vec<String> {
        self.order
            .iter()
            .filter(|id| self.entries.get(*id).is_some_and(|s| s.is_open))
            .cloned()
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Snapshot views
// ---------------------------------------------------------------------------

/// One stall as presented to status-inquiry surfaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StallView {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub is_open: bool,
    pub last_updated_at: Option<Timestamp>,
    pub last_updated_by: Option<String>,
    /// Voters recorded toward the next flip (0 when idle).
    pub pending_votes: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub generated_at: Timestamp,
    pub within_hours: bool,
    pub hours: OperatingHours,
    pub stalls: Vec<StallView>,
}

impl StatusSnapshot {
    pub fn stall(&self, id: &str) -> Option<&StallView> {
        self.stalls.iter().find(|s| s.id == id)
    }

    pub fn open_count(&self) -> usize {
        self.stalls.iter().filter(|s| s.is_open).count()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
