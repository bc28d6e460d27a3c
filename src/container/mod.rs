//! Application Container
//!
//! The logical owner of at most one embedded-application frame. A container
//! ties together the frame cell, its correlator, the session sequencer for
//! stateful types and the dirty-state entry that exists while it hosts a
//! legacy application.

pub mod switch;

use crate::config::AppFrameConfig;
use crate::correlator::{Correlator, CorrelatorConfig, ResponseFuture, Settlement};
use crate::dirty::{DirtyState, DirtyStateOwner, DirtyStateSynchronizer, SledStateStore};
use crate::embedding::params::resolve_navigation_url;
use crate::embedding::{EmbedRequest, EmbeddingStrategy, HostContext, StatePersistence};
use crate::error::EmbedError;
use crate::frame::{Frame, FrameCell, FrameSurface};
use crate::protocol::{services, Envelope, InboundMessage};
use crate::session::SessionSequencer;
use crate::trust::TrustValidator;
use crate::types::{ApplicationType, ContainerId};
use futures::future::{self, FutureExt};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

pub use switch::{ContextSwitchHandler, ContextSwitchRegistry, NavigateSwitch, StatefulSwitch};

/// Collaborators shared by every container of a host.
pub struct ContainerServices {
    pub surface: Arc<dyn FrameSurface>,
    pub strategy: Arc<EmbeddingStrategy>,
    pub dirty: Arc<DirtyStateSynchronizer>,
    pub correlator: CorrelatorConfig,
    pub trust: TrustValidator,
}

impl ContainerServices {
    pub fn new(
        surface: Arc<dyn FrameSurface>,
        strategy: Arc<EmbeddingStrategy>,
        dirty: Arc<DirtyStateSynchronizer>,
        correlator: CorrelatorConfig,
    ) -> Self {
        Self {
            surface,
            strategy,
            dirty,
            correlator,
            trust: TrustValidator::default(),
        }
    }

    /// Wire everything from configuration around an already opened store.
    pub fn from_config(
        config: &AppFrameConfig,
        surface: Arc<dyn FrameSurface>,
        state: Arc<dyn StatePersistence>,
        store: SledStateStore,
    ) -> Self {
        let strategy = EmbeddingStrategy::new(config.embedding.clone(), state);
        let dirty = DirtyStateSynchronizer::new(store, config.dirty_state.clone());
        Self::new(
            surface,
            Arc::new(strategy),
            Arc::new(dirty),
            config.correlator.clone(),
        )
    }
}

#[derive(Debug, Default)]
struct ContainerState {
    app_type: Option<ApplicationType>,
    host: HostContext,
    dirty_key: Option<String>,
}

pub struct ApplicationContainer {
    id: ContainerId,
    /// Unique per instance; names the dirty-state entry
    token: String,
    frame: Arc<FrameCell>,
    correlator: Arc<Correlator>,
    sequencer: SessionSequencer,
    services: Arc<ContainerServices>,
    switches: ContextSwitchRegistry,
    state: Mutex<ContainerState>,
    embedding: tokio::sync::Mutex<()>,
}

impl ApplicationContainer {
    pub fn new(id: ContainerId, services: Arc<ContainerServices>) -> Self {
        Self::with_switches(id, services, ContextSwitchRegistry::with_defaults())
    }

    pub fn with_switches(
        id: ContainerId,
        services: Arc<ContainerServices>,
        switches: ContextSwitchRegistry,
    ) -> Self {
        let correlator = Arc::new(Correlator::new(id.clone(), &services.correlator));
        Self {
            token: uuid::Uuid::new_v4().to_string(),
            frame: Arc::new(FrameCell::new()),
            sequencer: SessionSequencer::new(correlator.clone()),
            correlator,
            services,
            switches,
            state: Mutex::new(ContainerState::default()),
            embedding: tokio::sync::Mutex::new(()),
            id,
        }
    }

    pub fn id(&self) -> &ContainerId {
        &self.id
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn frame_cell(&self) -> &Arc<FrameCell> {
        &self.frame
    }

    pub fn current_frame(&self) -> Option<Arc<dyn Frame>> {
        self.frame.resolve()
    }

    pub fn correlator(&self) -> &Arc<Correlator> {
        &self.correlator
    }

    pub fn sequencer(&self) -> &SessionSequencer {
        &self.sequencer
    }

    pub fn services(&self) -> &Arc<ContainerServices> {
        &self.services
    }

    pub fn app_type(&self) -> Option<ApplicationType> {
        self.state.lock().app_type
    }

    /// Key of the dirty-state entry, present while a legacy application is hosted.
    pub fn dirty_key(&self) -> Option<String> {
        self.state.lock().dirty_key.clone()
    }

    /// Embed a new application, replacing whatever the container hosted.
    pub async fn embed(&self, request: EmbedRequest) -> Result<Arc<dyn Frame>, EmbedError> {
        let _guard = self.embedding.lock().await;

        let previous = self.state.lock().app_type;
        if previous.is_some_and(|p| p.is_stateful()) {
            self.send_close_notice();
        }

        let plan = self.services.strategy.plan(&self.id, &request).await?;
        let realized = self
            .services
            .strategy
            .realize(self.services.surface.as_ref(), &self.id, &self.frame, &plan)
            .await;
        let frame = match realized {
            Ok(frame) => frame,
            Err(e) => {
                warn!(container = %self.id, error = %e, "Embedding failed");
                self.state.lock().app_type = None;
                self.release_dirty_state()?;
                return Err(e);
            }
        };

        self.state.lock().host = request.host.clone();
        self.on_application_opened(request.app_type)?;
        info!(
            container = %self.id,
            app_type = %request.app_type,
            target = %plan.target(),
            "Application embedded"
        );
        Ok(frame)
    }

    /// Record the hosted type; legacy types get a fresh INITIAL dirty entry,
    /// other types drop any entry left behind.
    pub fn on_application_opened(&self, app_type: ApplicationType) -> Result<(), EmbedError> {
        if app_type.is_legacy() {
            let key = self.services.dirty.key_for(&self.token);
            self.services.dirty.track(
                &key,
                DirtyStateOwner {
                    container: self.id.clone(),
                    frame: self.frame.clone(),
                    correlator: self.correlator.clone(),
                },
            )?;
            self.state.lock().dirty_key = Some(key);
        } else {
            self.release_dirty_state()?;
        }
        self.state.lock().app_type = Some(app_type);
        Ok(())
    }

    pub fn post_message_to_iframe(
        &self,
        message: &Envelope,
        frame: &dyn Frame,
        wait_for_response: bool,
    ) -> ResponseFuture {
        self.correlator.post_message(message, frame, wait_for_response)
    }

    pub fn post_message_to_current_iframe(
        &self,
        message: &Envelope,
        wait_for_response: bool,
    ) -> ResponseFuture {
        match self.frame.resolve() {
            Some(frame) => self.post_message_to_iframe(message, frame.as_ref(), wait_for_response),
            None => future::ready(Err(EmbedError::MissingFrame(self.id.clone()))).boxed(),
        }
    }

    /// Move the live frame to a new target of `app_type`.
    pub async fn set_new_application_context(
        &self,
        app_type: ApplicationType,
        url: &Url,
    ) -> Settlement {
        let handler = self
            .switches
            .get(app_type)
            .ok_or(EmbedError::UnsupportedApplicationType(app_type))?;
        let frame = self
            .frame
            .resolve()
            .ok_or_else(|| EmbedError::MissingFrame(self.id.clone()))?;

        let _guard = self.embedding.lock().await;
        let (previous, host) = {
            let state = self.state.lock();
            (state.app_type, state.host.clone())
        };
        // StatefulSwitch closes the session itself.
        if previous.is_some_and(|p| p.is_stateful()) && !app_type.is_stateful() {
            self.send_close_notice();
        }
        let target = resolve_navigation_url(url, self.services.strategy.config(), &host);
        let settled = handler.switch(self, frame, &target).await?;
        self.on_application_opened(app_type)?;
        Ok(settled)
    }

    pub fn send_before_app_close_event(&self) -> ResponseFuture {
        let notice = Envelope::request(services::BEFORE_APP_CLOSE, json!({}));
        self.post_message_to_current_iframe(&notice, true)
    }

    /// Destroy the frame and drop the dirty-state entry.
    pub async fn teardown(&self) -> Result<(), EmbedError> {
        let _guard = self.embedding.lock().await;
        let app_type = self.state.lock().app_type.take();
        if app_type.is_some_and(|t| t.is_stateful()) {
            self.send_close_notice();
        }
        self.release_dirty_state()?;
        if let Some(frame) = self.frame.take().resolve() {
            self.services.surface.destroy_frame(&self.id, frame.as_ref());
        }
        info!(container = %self.id, "Container torn down");
        Ok(())
    }

    pub fn is_trusted(&self, message: &InboundMessage) -> bool {
        let trusted = self.services.trust.is_trusted(&self.frame.slot(), message);
        if !trusted {
            debug!(container = %self.id, origin = %message.origin, "Dropping untrusted message");
        }
        trusted
    }

    /// Answer an inbound request from the embedded application.
    pub fn reply(&self, request: &Envelope, status: &str, body: Value) -> Result<(), EmbedError> {
        let frame = self
            .frame
            .resolve()
            .ok_or_else(|| EmbedError::MissingFrame(self.id.clone()))?;
        let response = Envelope::response_to(request, status, body);
        self.correlator.notify(&response, frame.as_ref())
    }

    /// Write the token the embedded application reported for itself.
    pub fn report_dirty_state(&self, state: DirtyState) -> Result<(), EmbedError> {
        let key = self.services.dirty.key_for(&self.token);
        self.services.dirty.report(&key, state)
    }

    fn release_dirty_state(&self) -> Result<(), EmbedError> {
        let key = self.state.lock().dirty_key.take();
        if let Some(key) = key {
            self.services.dirty.untrack(&key)?;
        }
        Ok(())
    }

    fn send_close_notice(&self) {
        let Some(frame) = self.frame.resolve() else {
            return;
        };
        if let Err(e) = self.sequencer.close_session_notice(frame.as_ref()) {
            warn!(container = %self.id, error = %e, "Close-session notice failed");
        }
    }
}
