//! Two-vote consensus for citizen status reports.
//!
//! A stall flips only after [`VOTES_REQUIRED`] distinct actors ask for the
//! same flip within [`VOTE_STALENESS_MINUTES`]. A vote always proposes the
//! negation of the stall's current state; forcing a specific value is the
//! admin path's job.
//!
//! ```text
//!   Idle ──vote(A)──▶ OneVote{target, [A]} ──vote(B≠A)──▶ commit ─▶ Idle
//!                        │   │
//!                        │   └─ vote(A) → AlreadyVoted (no change)
//!                        └─ stale / target changed → fresh round
//! ```

use crate::clock::Timestamp;
use crate::error::{GeraiError, Result};
use crate::hours::Gate;
use crate::registry::Registry;
use crate::status::StatusStore;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Distinct voters needed before a flip commits.
pub const VOTES_REQUIRED: usize = 2;

/// A pending vote older than this is discarded.
pub const VOTE_STALENESS_MINUTES: i64 = 5;

pub fn vote_staleness() -> Duration {
    Duration::minutes(VOTE_STALENESS_MINUTES)
}

// ---------------------------------------------------------------------------
// PendingVote
// ---------------------------------------------------------------------------

/// An uncommitted proposal to flip one stall.
///
/// `target_status` is `None` exactly when `voters` is empty; the fields are
/// private so that only `start`, `push` and `reset` can change them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingVote {
    target_status: Option<bool>,
    voters: Vec<String>,
    started_at: Option<Timestamp>,
}

impl PendingVote {
    pub fn target_status(&self) -> Option<bool> {
        self.target_status
    }

    pub fn voters(&self) -> &[String] {
        &self.voters
    }

    pub fn started_at(&self) -> Option<Timestamp> {
        self.started_at
    }

    pub fn is_empty(&self) -> bool {
        self.voters.is_empty()
    }

    pub fn len(&self) -> usize {
        self.voters.len()
    }

    pub fn contains(&self, actor: &str) -> bool {
        self.voters.iter().any(|v| v == actor)
    }

    pub fn is_stale(&self, now: Timestamp) -> bool {
        self.started_at
            .is_some_and(|started| now.signed_duration_since(started) > vote_staleness())
    }

    fn start(&mut self, target: bool, actor: &str, now: Timestamp) {
        self.target_status = Some(target);
        self.voters = vec![actor.to_string()];
        self.started_at = Some(now);
    }

    fn push(&mut self, actor: &str) {
        if !self.contains(actor) {
            self.voters.push(actor.to_string());
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// ---------------------------------------------------------------------------
// VoteOutcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum VoteOutcome {
    /// The gate is closed; nothing was recorded.
    OutsideOperatingHours,
    /// The actor is already among this round's voters.
    AlreadyVoted {
        target: bool,
        votes: usize,
        needed: usize,
    },
    /// A new round started with this actor as the sole voter.
    FirstVote {
        target: bool,
        votes: usize,
        needed: usize,
    },
    /// Vote added to an open round that still needs more voters.
    VoteRecorded {
        target: bool,
        votes: usize,
        needed: usize,
    },
    /// The threshold was reached and the flip was applied.
    Committed { target: bool, voters: Vec<String> },
}

impl VoteOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, VoteOutcome::Committed { .. })
    }

    pub fn target(&self) -> Option<bool> {
        match self {
            VoteOutcome::OutsideOperatingHours => None,
            VoteOutcome::AlreadyVoted { target, .. }
            | VoteOutcome::FirstVote { target, .. }
            | VoteOutcome::VoteRecorded { target, .. }
            | VoteOutcome::Committed { target, .. } => Some(*target),
        }
    }
}

// ---------------------------------------------------------------------------
// VoteBook
// ---------------------------------------------------------------------------

/// Pending votes, one slot per registry stall.
#[derive(Debug, Clone)]
pub struct VoteBook {
    entries: HashMap<String, PendingVote>,
}

impl VoteBook {
    pub fn new(registry: &Registry) -> Self {
        Self {
            entries: registry
                .ids()
                .map(|id| (id.to_string(), PendingVote::default()))
                .collect(),
        }
    }

    pub fn get(&self, id: &str) -> Result<&PendingVote> {
        self.entries
            .get(id)
            .ok_or_else(|| GeraiError::UnknownStall(id.to_string()))
    }

    pub fn reset(&mut self, id: &str) -> Result<()> {
        self.entries
            .get_mut(id)
            .ok_or_else(|| GeraiError::UnknownStall(id.to_string()))?
            .reset();
        Ok(())
    }

    pub fn reset_all(&mut self) {
        self.entries.values_mut().for_each(PendingVote::reset);
    }

    /// Record `actor`'s request to flip `stall_id`, committing the flip into
    /// `statuses` once enough distinct actors agree.
    ///
    /// The caller must hold whatever lock serializes `statuses` and `self`
    /// so that one round can never produce two commits.
    pub fn propose_or_vote(
        &mut self,
        statuses: &mut StatusStore,
        gate: &Gate,
        stall_id: &str,
        actor: &str,
        now: Timestamp,
    ) -> Result<VoteOutcome> {
        let current = statuses.get(stall_id)?.is_open;
        if !gate.is_open(now) {
            return Ok(VoteOutcome::OutsideOperatingHours);
        }

        let target = !current;
        let pending = self
            .entries
            .get_mut(stall_id)
            .ok_or_else(|| GeraiError::UnknownStall(stall_id.to_string()))?;

        // A voter already on record is turned away even when their round has
        // lapsed; only a different actor can replace it.
        if pending.contains(actor) {
            return Ok(VoteOutcome::AlreadyVoted {
                target,
                votes: pending.len(),
                needed: VOTES_REQUIRED,
            });
        }

        if pending.is_stale(now) || pending.target_status().is_some_and(|t| t != target) {
            tracing::debug!(stall = stall_id, "discarding outdated pending vote");
            pending.reset();
        }

        if pending.is_empty() {
            pending.start(target, actor, now);
            tracing::debug!(stall = stall_id, actor, open = target, "vote round started");
            return Ok(VoteOutcome::FirstVote {
                target,
                votes: 1,
                needed: VOTES_REQUIRED,
            });
        }

        pending.push(actor);
        if pending.len() < VOTES_REQUIRED {
            return Ok(VoteOutcome::VoteRecorded {
                target,
                votes: pending.len(),
                needed: VOTES_REQUIRED,
            });
        }

        let voters = pending.voters().to_vec();
        statuses.set_status(stall_id, target, &voters.join(" & "), now)?;
        pending.reset();
        tracing::info!(stall = stall_id, open = target, voters = ?voters, "vote committed");
        Ok(VoteOutcome::Committed { target, voters })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
