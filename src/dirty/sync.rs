//! Dirty state synchronizer: one persisted flag per container instance.

use crate::correlator::Correlator;
use crate::dirty::store::{SledStateStore, StateChange};
use crate::dirty::DirtyState;
use crate::error::{EmbedError, StorageError};
use crate::frame::FrameCell;
use crate::protocol::{services, Envelope};
use crate::types::ContainerId;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Dirty state configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirtyStateConfig {
    /// Prefix of every dirty-state key (`<prefix>.<container token>`)
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// How long `query` waits for the application before answering MAYBE
    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,
}

fn default_key_prefix() -> String {
    "appframe.dirtyState".to_string()
}

fn default_query_timeout_ms() -> u64 {
    1500
}

impl Default for DirtyStateConfig {
    fn default() -> Self {
        Self {
            key_prefix: default_key_prefix(),
            query_timeout_ms: default_query_timeout_ms(),
        }
    }
}

/// What the synchronizer needs from the container owning a key.
#[derive(Clone)]
pub struct DirtyStateOwner {
    pub container: ContainerId,
    pub frame: Arc<FrameCell>,
    pub correlator: Arc<Correlator>,
}

pub struct DirtyStateSynchronizer {
    store: SledStateStore,
    config: DirtyStateConfig,
    owners: RwLock<HashMap<String, DirtyStateOwner>>,
}

impl DirtyStateSynchronizer {
    pub fn new(store: SledStateStore, config: DirtyStateConfig) -> Self {
        Self {
            store,
            config,
            owners: RwLock::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &SledStateStore {
        &self.store
    }

    pub fn config(&self) -> &DirtyStateConfig {
        &self.config
    }

    /// Key for a container's unique token.
    pub fn key_for(&self, token: &str) -> String {
        format!("{}.{}", self.config.key_prefix, token)
    }

    /// Start (or restart) tracking: the entry is reset to INITIAL.
    pub fn track(&self, key: &str, owner: DirtyStateOwner) -> Result<(), StorageError> {
        self.store.set(key, DirtyState::Initial.as_token())?;
        debug!(container = %owner.container, key = %key, "Dirty state tracking started");
        self.owners.write().insert(key.to_string(), owner);
        Ok(())
    }

    /// Stop tracking and delete the entry.
    pub fn untrack(&self, key: &str) -> Result<(), StorageError> {
        self.owners.write().remove(key);
        if self.store.remove(key)? {
            debug!(key = %key, "Dirty state entry removed");
        }
        Ok(())
    }

    pub fn is_tracked(&self, key: &str) -> bool {
        self.owners.read().contains_key(key)
    }

    pub fn state(&self, key: &str) -> Result<Option<DirtyState>, StorageError> {
        self.store
            .get(key)?
            .map(|token| token.parse())
            .transpose()
    }

    /// Write a token; any window may do this.
    pub fn set_state(&self, key: &str, state: DirtyState) -> Result<(), StorageError> {
        self.store.set(key, state.as_token())
    }

    /// Ask the owner of `key` to interrogate its application.
    pub fn request_check(&self, key: &str) -> Result<(), StorageError> {
        self.set_state(key, DirtyState::Pending)
    }

    /// Flip `key` to PENDING and wait for the owner's application to answer.
    ///
    /// Returns `None` when no entry exists, MAYBE when nothing but PENDING was
    /// written before the configured timeout.
    pub async fn query(&self, key: &str) -> Result<Option<DirtyState>, StorageError> {
        if self.store.get(key)?.is_none() {
            return Ok(None);
        }
        let mut subscription = self.store.subscribe(key);
        self.request_check(key)?;

        let limit = Duration::from_millis(self.config.query_timeout_ms);
        let answer = tokio::time::timeout(limit, async {
            while let Some(change) = subscription.next().await {
                if change.key != key {
                    continue;
                }
                let Some(token) = change.value else {
                    return None;
                };
                match token.parse::<DirtyState>() {
                    Ok(DirtyState::Pending) => continue,
                    Ok(state) => return Some(state),
                    Err(e) => warn!(key = %key, error = %e, "Ignoring unknown dirty state token"),
                }
            }
            None
        })
        .await;

        match answer {
            Ok(state) => Ok(state),
            Err(_) => {
                warn!(key = %key, timeout_ms = self.config.query_timeout_ms, "No dirty state answer; assuming MAYBE");
                Ok(Some(DirtyState::Maybe))
            }
        }
    }

    /// React to a store change. Returns whether a request was posted.
    pub fn handle_change(&self, change: &StateChange) -> bool {
        let Some(token) = change.value.as_deref() else {
            return false;
        };
        if token.parse::<DirtyState>().ok() != Some(DirtyState::Pending) {
            return false;
        }
        let Some(owner) = self.owners.read().get(&change.key).cloned() else {
            return false;
        };
        let Some(frame) = owner.frame.resolve() else {
            debug!(container = %owner.container, "Dirty state requested but no frame is live");
            return false;
        };

        let request = Envelope::request(services::GET_DIRTY_STATE, json!({ "key": change.key }));
        match owner.correlator.notify(&request, frame.as_ref()) {
            Ok(()) => true,
            Err(e) => {
                warn!(container = %owner.container, error = %e, "Failed to ask application for dirty state");
                false
            }
        }
    }

    /// Listen process-wide for changes under the configured prefix.
    pub fn spawn_listener(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let sync = Arc::clone(self);
        let mut subscription = self.store.subscribe(&self.config.key_prefix);
        info!(prefix = %self.config.key_prefix, "Dirty state listener started");
        tokio::spawn(async move {
            while let Some(change) = subscription.next().await {
                sync.handle_change(&change);
            }
            debug!("Dirty state subscription closed");
        })
    }

    /// Record a token the application reported for its own container.
    pub fn report(&self, key: &str, state: DirtyState) -> Result<(), EmbedError> {
        if !self.is_tracked(key) {
            return Err(EmbedError::StorageError(StorageError::InvalidKey(key.to_string())));
        }
        self.set_state(key, state)?;
        Ok(())
    }
}
