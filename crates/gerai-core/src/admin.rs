use crate::clock::Timestamp;
use crate::error::Result;
use crate::status::StatusStore;
use crate::voting::VoteBook;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const ADMIN_ACTOR_PREFIX: &str = "admin/";

/// Attribution written to `last_updated_by` for an admin write.
pub fn admin_actor(identity: &str) -> String {
    format!("{ADMIN_ACTOR_PREFIX}{identity}")
}

// ---------------------------------------------------------------------------
// AdminOutcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AdminOutcome {
    Changed { previous: bool, current: bool },
    /// The stall already had the requested value; nothing was written.
    NoChange { current: bool },
}

impl AdminOutcome {
    pub fn is_changed(&self) -> bool {
        matches!(self, AdminOutcome::Changed { .. })
    }
}

/// Force `stall_id` to `is_open`, bypassing the gate and the vote.
///
/// A real change also clears the stall's pending vote, whose target would
/// otherwise no longer be the negation of the current state. Authorization
/// is the caller's job.
pub fn admin_set_status(
    statuses: &mut StatusStore,
    votes: &mut VoteBook,
    stall_id: &str,
    is_open: bool,
    admin: &str,
    now: Timestamp,
) -> Result<AdminOutcome> {
    let current = statuses.get(stall_id)?.is_open;
    if current == is_open {
        return Ok(AdminOutcome::NoChange { current });
    }
    let previous = statuses.set_status(stall_id, is_open, &admin_actor(admin), now)?;
    votes.reset(stall_id)?;
    Ok(AdminOutcome::Changed {
        previous,
        current: is_open,
    })
}

// ---------------------------------------------------------------------------
// AdminList
// ---------------------------------------------------------------------------

/// Static allow-list of admin identities (numeric chat user ids or
/// usernames). A leading `@` is ignored on both sides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminList {
    ids: HashSet<String>,
}

fn canonical(identity: &str) -> &str {
    identity.trim().trim_start_matches('@')
}

impl AdminList {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            ids: ids
                .into_iter()
                .map(|s| canonical(s.as_ref()).to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    /// Parse a comma separated list, e.g. `GERAI_ADMINS=12345,@warden`.
    pub fn parse(csv: &str) -> Self {
        Self::new(csv.split(','))
    }

    pub fn contains(&self, identity: &str) -> bool {
        let id = canonical(identity);
        !id.is_empty() && self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
