//! Context switch handlers keyed by application type.

use crate::container::ApplicationContainer;
use crate::correlator::Settlement;
use crate::frame::Frame;
use crate::types::ApplicationType;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// Moves a live frame to a new target without recreating it.
#[async_trait]
pub trait ContextSwitchHandler: Send + Sync {
    async fn switch(
        &self,
        container: &ApplicationContainer,
        frame: Arc<dyn Frame>,
        target: &Url,
    ) -> Settlement;
}

/// Plain navigation of the existing frame.
#[derive(Debug, Default, Clone, Copy)]
pub struct NavigateSwitch;

#[async_trait]
impl ContextSwitchHandler for NavigateSwitch {
    async fn switch(
        &self,
        container: &ApplicationContainer,
        frame: Arc<dyn Frame>,
        target: &Url,
    ) -> Settlement {
        debug!(container = %container.id(), target = %target, "Navigating frame in place");
        frame.navigate(target)?;
        Ok(None)
    }
}

/// Close the remote session first, then start the new target.
#[derive(Debug, Default, Clone, Copy)]
pub struct StatefulSwitch;

#[async_trait]
impl ContextSwitchHandler for StatefulSwitch {
    async fn switch(
        &self,
        container: &ApplicationContainer,
        frame: Arc<dyn Frame>,
        target: &Url,
    ) -> Settlement {
        container.sequencer().transition(frame.as_ref(), target).await
    }
}

#[derive(Clone, Default)]
pub struct ContextSwitchRegistry {
    handlers: HashMap<ApplicationType, Arc<dyn ContextSwitchHandler>>,
}

impl ContextSwitchRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// URL navigates in place; the stateful types go through the sequencer.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(ApplicationType::Url, Arc::new(NavigateSwitch));
        for app_type in ApplicationType::ALL.into_iter().filter(|t| t.is_stateful()) {
            registry.register(app_type, Arc::new(StatefulSwitch));
        }
        registry
    }

    pub fn register(&mut self, app_type: ApplicationType, handler: Arc<dyn ContextSwitchHandler>) {
        self.handlers.insert(app_type, handler);
    }

    pub fn get(&self, app_type: ApplicationType) -> Option<Arc<dyn ContextSwitchHandler>> {
        self.handlers.get(&app_type).cloned()
    }

    pub fn supports(&self, app_type: ApplicationType) -> bool {
        self.handlers.contains_key(&app_type)
    }
}
