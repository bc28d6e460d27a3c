//! Services the host answers for embedded applications.

use crate::container::ApplicationContainer;
use crate::dirty::DirtyState;
use crate::error::{EmbedError, StorageError};
use crate::protocol::{services, Envelope};
use parking_lot::RwLock;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Handles one inbound request; the returned value is the response body.
pub trait ServiceHandler: Send + Sync {
    fn handle(&self, container: &ApplicationContainer, request: &Envelope) -> Result<Value, EmbedError>;
}

impl<F> ServiceHandler for F
where
    F: Fn(&ApplicationContainer, &Envelope) -> Result<Value, EmbedError> + Send + Sync,
{
    fn handle(&self, container: &ApplicationContainer, request: &Envelope) -> Result<Value, EmbedError> {
        self(container, request)
    }
}

/// `sap.its.setDirtyState`: body `{"state": "DIRTY"}` or a bare token string.
#[derive(Debug, Default, Clone, Copy)]
pub struct SetDirtyStateService;

impl ServiceHandler for SetDirtyStateService {
    fn handle(&self, container: &ApplicationContainer, request: &Envelope) -> Result<Value, EmbedError> {
        let token = request
            .body
            .get("state")
            .and_then(Value::as_str)
            .or_else(|| request.body.as_str())
            .ok_or_else(|| StorageError::InvalidToken(request.body.to_string()))?;
        let state: DirtyState = token.parse()?;
        container.report_dirty_state(state)?;
        Ok(json!({ "state": state.as_token() }))
    }
}

/// Service name to handler; handlers may be added while messages flow.
#[derive(Default)]
pub struct ServiceRegistry {
    handlers: RwLock<HashMap<String, Arc<dyn ServiceHandler>>>,
}

impl ServiceRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_builtins() -> Self {
        let registry = Self::empty();
        registry.register(services::SET_DIRTY_STATE, Arc::new(SetDirtyStateService));
        registry
    }

    pub fn register(&self, service: impl Into<String>, handler: Arc<dyn ServiceHandler>) {
        self.handlers.write().insert(service.into(), handler);
    }

    pub fn unregister(&self, service: &str) -> bool {
        self.handlers.write().remove(service).is_some()
    }

    pub fn get(&self, service: &str) -> Option<Arc<dyn ServiceHandler>> {
        self.handlers.read().get(service).cloned()
    }

    pub fn contains(&self, service: &str) -> bool {
        self.handlers.read().contains_key(service)
    }
}
