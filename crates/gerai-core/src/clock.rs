use chrono::{DateTime, Duration, FixedOffset, Utc};
use std::sync::{Mutex, PoisonError};

/// Local wall-clock time as seen by the service.
pub type Timestamp = DateTime<FixedOffset>;

/// Time source injected into the service so operating hours and vote
/// staleness are deterministic under test.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Real time, shifted into the deployment's fixed UTC offset.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: FixedOffset,
}

impl SystemClock {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now().with_timezone(&self.offset)
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Timestamp>,
}

impl ManualClock {
    pub fn new(now: Timestamp) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: Timestamp) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut guard = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *guard += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
