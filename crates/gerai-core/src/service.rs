use crate::admin::{admin_set_status, AdminList, AdminOutcome};
use crate::clock::{Clock, SystemClock, Timestamp};
use crate::config::Config;
use crate::error::{GeraiError, Result};
use crate::hours::{next_window_end, Gate};
use crate::notify::{notify_all, ChangeCause, DispatchReport, Notification, Notifier, NotifyOption};
use crate::registry::Registry;
use crate::status::{StallView, StatusSnapshot, StatusStore};
use crate::subscribers::{
    FileSubscribers, MemorySubscribers, SubscribeOutcome, SubscriberStore, UnsubscribeOutcome,
};
use crate::sweep::sweep;
use crate::voting::{VoteBook, VoteOutcome};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Callback action that asks a transport to show the full status board.
pub const CHECK_STATUS_ACTION: &str = "gerai_status";
pub const CHECK_STATUS_LABEL: &str = "📊 Check All Gerai Status";

/// Status and pending votes share one lock so a commit and its reset are
/// never observed separately.
#[derive(Debug)]
struct Board {
    statuses: StatusStore,
    votes: VoteBook,
}

/// The gerai status service. Constructed once per process and shared behind
/// an `Arc` by every transport.
pub struct GeraiService {
    config: Config,
    registry: Registry,
    gate: Gate,
    admins: AdminList,
    clock: Arc<dyn Clock>,
    board: Mutex<Board>,
    subscribers: Arc<dyn SubscriberStore>,
    notifier: Arc<dyn Notifier>,
}

impl GeraiService {
    pub fn new(
        config: Config,
        clock: Arc<dyn Clock>,
        subscribers: Arc<dyn SubscriberStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        let registry = config.registry()?;
        if registry.is_empty() {
            return Err(GeraiError::InvalidConfig("no stalls configured".into()));
        }
        let board = Board {
            statuses: StatusStore::new(&registry),
            votes: VoteBook::new(&registry),
        };
        Ok(Self {
            gate: config.gate(),
            admins: config.admin_list(),
            registry,
            clock,
            board: Mutex::new(board),
            subscribers,
            notifier,
            config,
        })
    }

    /// Real clock in the configured offset; subscribers from
    /// `subscribers_path` when set, in memory otherwise.
    pub fn from_config(config: Config, notifier: Arc<dyn Notifier>) -> Result<Self> {
        let clock = Arc::new(SystemClock::new(config.utc_offset()?));
        let subscribers: Arc<dyn SubscriberStore> = match &config.subscribers_path {
            Some(path) => Arc::new(FileSubscribers::open(path)?),
            None => Arc::new(MemorySubscribers::new()),
        };
        Self::new(config, clock, subscribers, notifier)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn gate(&self) -> Gate {
        self.gate
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    pub fn is_admin(&self, identity: &str) -> bool {
        self.admins.contains(identity)
    }

    fn board(&self) -> MutexGuard<'_, Board> {
        self.board.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // -----------------------------------------------------------------------
    // Status inquiry
    // -----------------------------------------------------------------------

    /// Every stall in registry order. Outside operating hours every stall is
    /// reported closed regardless of what the store says.
    pub fn status_snapshot(&self) -> StatusSnapshot {
        let now = self.now();
        let within_hours = self.gate.is_open(now);
        let board = self.board();
        let stalls = self
            .registry
            .stalls()
            .iter()
            .map(|stall| {
                let status = board.statuses.get(&stall.id).cloned().unwrap_or_default();
                let pending = board.votes.get(&stall.id).map(|p| p.len()).unwrap_or(0);
                StallView {
                    id: stall.id.clone(),
                    name: stall.display_name.clone(),
                    location: stall.location.clone(),
                    is_open: within_hours && status.is_open,
                    last_updated_at: status.last_updated_at,
                    last_updated_by: status.last_updated_by,
                    pending_votes: if within_hours { pending } else { 0 },
                }
            })
            .collect();
        StatusSnapshot {
            generated_at: now,
            within_hours,
            hours: self.gate.window,
            stalls,
        }
    }

    // -----------------------------------------------------------------------
    // State changes
    // -----------------------------------------------------------------------

    /// A citizen asks for `stall_id` to flip. Subscribers hear about it only
    /// when the request completes a round.
    pub fn request_status_change(&self, stall_id: &str, actor: &str) -> Result<VoteOutcome> {
        let now = self.now();
        let outcome = {
            let mut board = self.board();
            let Board { statuses, votes } = &mut *board;
            votes.propose_or_vote(statuses, &self.gate, stall_id, actor, now)?
        };

        if let VoteOutcome::Committed { target, voters } = &outcome {
            self.announce(
                stall_id,
                *target,
                ChangeCause::Vote {
                    voters: voters.clone(),
                },
                now,
            );
        }
        Ok(outcome)
    }

    /// Admin override. Works at any hour; the identity must be on the
    /// allow-list.
    pub fn request_admin_status_change(
        &self,
        stall_id: &str,
        is_open: bool,
        admin: &str,
    ) -> Result<AdminOutcome> {
        if !self.is_admin(admin) {
            return Err(GeraiError::NotAuthorized(admin.to_string()));
        }
        self.registry.require(stall_id)?;
        let now = self.now();
        let outcome = {
            let mut board = self.board();
            let Board { statuses, votes } = &mut *board;
            admin_set_status(statuses, votes, stall_id, is_open, admin, now)?
        };

        if outcome.is_changed() {
            tracing::info!(stall = stall_id, open = is_open, admin, "admin override");
            self.announce(
                stall_id,
                is_open,
                ChangeCause::Admin {
                    admin: admin.to_string(),
                },
                now,
            );
        }
        Ok(outcome)
    }

    // -----------------------------------------------------------------------
    // Auto-close
    // -----------------------------------------------------------------------

    pub fn run_auto_close_sweep(&self) -> Vec<String> {
        self.sweep_at(self.now())
    }

    pub fn sweep_at(&self, now: Timestamp) -> Vec<String> {
        let closed = {
            let mut board = self.board();
            let Board { statuses, votes } = &mut *board;
            sweep(statuses, votes, now)
        };
        tracing::info!(closed = closed.len(), "auto-close sweep");

        if self.config.notify_on_auto_close {
            for id in &closed {
                self.announce(id, false, ChangeCause::AutoClose, now);
            }
        }
        closed
    }

    /// When the scheduler should next call [`run_auto_close_sweep`].
    ///
    /// [`run_auto_close_sweep`]: GeraiService::run_auto_close_sweep
    pub fn next_auto_close(&self) -> Timestamp {
        next_window_end(self.now(), &self.gate.window)
    }

    // -----------------------------------------------------------------------
    // Subscribers
    // -----------------------------------------------------------------------

    pub fn subscribe(&self, recipient: &str) -> Result<SubscribeOutcome> {
        self.subscribers.add(recipient)
    }

    pub fn unsubscribe(&self, recipient: &str) -> Result<UnsubscribeOutcome> {
        self.subscribers.remove(recipient)
    }

    pub fn subscribers(&self) -> Result<Vec<String>> {
        self.subscribers.list()
    }

    // Called with the board lock released.
    fn announce(
        &self,
        stall_id: &str,
        is_open: bool,
        cause: ChangeCause,
        at: Timestamp,
    ) -> DispatchReport {
        let stall_name = self
            .registry
            .get(stall_id)
            .map(|s| s.display_name.clone())
            .unwrap_or_else(|| stall_id.to_string());
        let notification = Notification {
            stall_id: stall_id.to_string(),
            stall_name,
            is_open,
            cause,
            at,
            options: vec![NotifyOption::new(CHECK_STATUS_LABEL, CHECK_STATUS_ACTION)],
        };
        let recipients = match self.subscribers.list() {
            Ok(list) => list,
            Err(e) => {
                tracing::warn!(stall = stall_id, "cannot list subscribers: {e}");
                return DispatchReport::default();
            }
        };
        let report = notify_all(self.notifier.as_ref(), &recipients, &notification);
        tracing::debug!(
            stall = stall_id,
            delivered = report.delivered,
            failed = report.failed,
            "notifications dispatched"
        );
        report
    }
}

impl std::fmt::Debug for GeraiService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeraiService")
            .field("name", &self.config.name)
            .field("stalls", &self.registry.len())
            .field("gate", &self.gate)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
