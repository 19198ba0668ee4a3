use crate::error::{GeraiError, Result};
use crate::io::atomic_write;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscribeOutcome {
    Subscribed,
    AlreadySubscribed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnsubscribeOutcome {
    Unsubscribed,
    NotSubscribed,
}

/// Unique set of notification recipients.
pub trait SubscriberStore: Send + Sync {
    fn add(&self, recipient: &str) -> Result<SubscribeOutcome>;
    fn remove(&self, recipient: &str) -> Result<UnsubscribeOutcome>;
    fn list(&self) -> Result<Vec<String>>;
}

fn normalize(recipient: &str) -> Result<&str> {
    let r = recipient.trim();
    if r.is_empty() || r.chars().any(char::is_control) {
        return Err(GeraiError::InvalidRecipient(recipient.to_string()));
    }
    Ok(r)
}

fn insert(list: &mut Vec<String>, recipient: &str) -> SubscribeOutcome {
    if list.iter().any(|r| r == recipient) {
        SubscribeOutcome::AlreadySubscribed
    } else {
        list.push(recipient.to_string());
        SubscribeOutcome::Subscribed
    }
}

fn delete(list: &mut Vec<String>, recipient: &str) -> UnsubscribeOutcome {
    let before = list.len();
    list.retain(|r| r != recipient);
    if list.len() == before {
        UnsubscribeOutcome::NotSubscribed
    } else {
        UnsubscribeOutcome::Unsubscribed
    }
}

// ---------------------------------------------------------------------------
// MemorySubscribers
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct MemorySubscribers {
    inner: Mutex<Vec<String>>,
}

impl MemorySubscribers {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SubscriberStore for MemorySubscribers {
    fn add(&self, recipient: &str) -> Result<SubscribeOutcome> {
        let recipient = normalize(recipient)?;
        let mut list = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(insert(&mut list, recipient))
    }

    fn remove(&self, recipient: &str) -> Result<UnsubscribeOutcome> {
        let recipient = normalize(recipient)?;
        let mut list = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(delete(&mut list, recipient))
    }

    fn list(&self) -> Result<Vec<String>> {
        Ok(self
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }
}

// ---------------------------------------------------------------------------
// FileSubscribers
// ---------------------------------------------------------------------------

/// Subscribers persisted as a flat JSON array of ids.
///
/// The file is the only copy: every call re-reads it, and changes are
/// written back before the lock is released, so edits made by another
/// process (`gerai subscribers add` next to a running `serve`) are merged
/// rather than overwritten. A missing file is an empty set.
#[derive(Debug)]
pub struct FileSubscribers {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileSubscribers {
    /// Open the store, failing early if an existing file is unreadable.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        load_list(&path)?;
        Ok(Self {
            path,
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, list: &[String]) -> Result<()> {
        let data = serde_json::to_vec_pretty(list)?;
        atomic_write(&self.path, &data)
    }
}

fn load_list(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let data = std::fs::read_to_string(path)?;
    if data.trim().is_empty() {
        return Ok(Vec::new());
    }
    let raw: Vec<String> = serde_json::from_str(&data)?;
    let mut list = Vec::with_capacity(raw.len());
    for r in raw.iter().map(|r| r.trim()).filter(|r| !r.is_empty()) {
        insert(&mut list, r);
    }
    Ok(list)
}

impl SubscriberStore for FileSubscribers {
    fn add(&self, recipient: &str) -> Result<SubscribeOutcome> {
        let recipient = normalize(recipient)?;
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut list = load_list(&self.path)?;
        let outcome = insert(&mut list, recipient);
        if outcome == SubscribeOutcome::Subscribed {
            self.persist(&list)?;
        }
        Ok(outcome)
    }

    fn remove(&self, recipient: &str) -> Result<UnsubscribeOutcome> {
        let recipient = normalize(recipient)?;
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut list = load_list(&self.path)?;
        let outcome = delete(&mut list, recipient);
        if outcome == UnsubscribeOutcome::Unsubscribed {
            self.persist(&list)?;
        }
        Ok(outcome)
    }

    fn list(&self) -> Result<Vec<String>> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        load_list(&self.path)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
