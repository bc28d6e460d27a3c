//! State-persistence collaborator: resolves state keys to stored payloads.

use crate::error::EmbedError;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

#[async_trait]
pub trait StatePersistence: Send + Sync {
    /// Payload stored under `key`, if any.
    async fn resolve(&self, key: &str) -> Result<Option<String>, EmbedError>;
}

/// Resolves nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoStatePersistence;

#[async_trait]
impl StatePersistence for NoStatePersistence {
    async fn resolve(&self, _key: &str) -> Result<Option<String>, EmbedError> {
        Ok(None)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryStatePersistence {
    entries: RwLock<HashMap<String, String>>,
}

impl InMemoryStatePersistence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: impl Into<String>, payload: impl Into<String>) {
        self.entries.write().insert(key.into(), payload.into());
    }
}

#[async_trait]
impl StatePersistence for InMemoryStatePersistence {
    async fn resolve(&self, key: &str) -> Result<Option<String>, EmbedError> {
        Ok(self.entries.read().get(key).cloned())
    }
}
