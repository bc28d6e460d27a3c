//! Sled-backed shared key-value store with change subscriptions.

use crate::error::{sled_io, StorageError};
use sled::{Db, Event, Tree};
use std::path::Path;

const TREE_SHARED_STATE: &str = "shared_state";

/// A write observed by a subscription; `value == None` means removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateChange {
    pub key: String,
    pub value: Option<String>,
}

/// Stream of changes under a key prefix.
pub struct StateSubscription {
    inner: sled::Subscriber,
}

impl StateSubscription {
    /// Next change, or `None` once the store is gone.
    pub async fn next(&mut self) -> Option<StateChange> {
        loop {
            let event = (&mut self.inner).await?;
            if let Some(change) = to_change(event) {
                return Some(change);
            }
        }
    }
}

/// Last-write-wins store shared by every window in the process.
#[derive(Clone)]
pub struct SledStateStore {
    db: Db,
    tree: Tree,
}

impl SledStateStore {
    pub fn new(db: Db) -> Result<Self, StorageError> {
        let tree = db.open_tree(TREE_SHARED_STATE).map_err(sled_io)?;
        Ok(Self { db, tree })
    }

    /// Open (or create) a store at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let db = sled::open(path).map_err(|e| {
            StorageError::IoError(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("Failed to open sled database: {}", e),
            ))
        })?;
        Self::new(db)
    }

    /// A store that is deleted when dropped.
    pub fn temporary() -> Result<Self, StorageError> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(sled_io)?;
        Self::new(db)
    }

    pub fn db(&self) -> &Db {
        &self.db
    }

    pub fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let Some(raw) = self.tree.get(key.as_bytes()).map_err(sled_io)? else {
            return Ok(None);
        };
        decode(&raw).map(Some)
    }

    pub fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if key.is_empty() {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        self.tree
            .insert(key.as_bytes(), value.as_bytes())
            .map_err(sled_io)?;
        Ok(())
    }

    /// Remove `key`; returns whether it existed.
    pub fn remove(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.tree.remove(key.as_bytes()).map_err(sled_io)?.is_some())
    }

    pub fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, String)>, StorageError> {
        let mut out = Vec::new();
        for result in self.tree.scan_prefix(prefix.as_bytes()) {
            let (key, value) = result.map_err(sled_io)?;
            out.push((decode(&key)?, decode(&value)?));
        }
        Ok(out)
    }

    /// Subscribe to every later write under `prefix`.
    pub fn subscribe(&self, prefix: &str) -> StateSubscription {
        StateSubscription {
            inner: self.tree.watch_prefix(prefix.as_bytes()),
        }
    }

    pub fn flush(&self) -> Result<(), StorageError> {
        self.db.flush().map_err(sled_io)?;
        Ok(())
    }
}

fn decode(raw: &[u8]) -> Result<String, StorageError> {
    String::from_utf8(raw.to_vec()).map_err(|e| {
        StorageError::IoError(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            e.to_string(),
        ))
    })
}

fn to_change(event: Event) -> Option<StateChange> {
    match event {
        Event::Insert { key, value } => Some(StateChange {
            key: decode(&key).ok()?,
            value: Some(decode(&value).ok()?),
        }),
        Event::Remove { key } => Some(StateChange {
            key: decode(&key).ok()?,
            value: None,
        }),
    }
}
