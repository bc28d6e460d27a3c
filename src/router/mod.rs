//! Inbound Message Router
//!
//! The live dispatch path for message events delivered to the host window.
//! Every registered container sees each event; untrusted events are dropped,
//! trusted ones feed the container's correlator and requests from the embedded
//! application go to the service registry. Requests for services nobody
//! handles yet are offered to the message buffer.

pub mod services;

use crate::buffer::{BufferedMessage, MessageBuffer, OfferOutcome, ReplayTarget};
use crate::container::ApplicationContainer;
use crate::correlator::CorrelationOutcome;
use crate::error::EmbedError;
use crate::protocol::{parse_message_data, Envelope, InboundMessage, ParsedMessage, STATUS_ERROR, STATUS_SUCCESS};
use crate::types::ContainerId;
use parking_lot::RwLock;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

pub use services::{ServiceHandler, ServiceRegistry, SetDirtyStateService};

/// What happened to an event for one container.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    Untrusted,
    Correlated(CorrelationOutcome),
    Served { service: String },
    Buffered { service: String, sequence_index: u64 },
    Refused { service: String },
}

pub struct MessageRouter {
    containers: RwLock<HashMap<ContainerId, Arc<ApplicationContainer>>>,
    services: ServiceRegistry,
    buffer: Arc<MessageBuffer>,
}

impl MessageRouter {
    pub fn new(services: ServiceRegistry, buffer: Arc<MessageBuffer>) -> Self {
        Self {
            containers: RwLock::new(HashMap::new()),
            services,
            buffer,
        }
    }

    pub fn services(&self) -> &ServiceRegistry {
        &self.services
    }

    pub fn buffer(&self) -> &Arc<MessageBuffer> {
        &self.buffer
    }

    pub fn register(&self, container: Arc<ApplicationContainer>) {
        debug!(container = %container.id(), "Container registered for inbound messages");
        self.containers
            .write()
            .insert(container.id().clone(), container);
    }

    pub fn unregister(&self, id: &ContainerId) -> Option<Arc<ApplicationContainer>> {
        self.containers.write().remove(id)
    }

    pub fn container(&self, id: &ContainerId) -> Option<Arc<ApplicationContainer>> {
        self.containers.read().get(id).cloned()
    }

    /// Dispatch a host message event to every registered container.
    pub fn handle_event(self: &Arc<Self>, event: &InboundMessage) -> Vec<(ContainerId, Dispatch)> {
        let containers: Vec<_> = self.containers.read().values().cloned().collect();
        containers
            .into_iter()
            .map(|container| {
                let target: Arc<dyn ReplayTarget> = self.clone();
                let outcome = self.dispatch(&container, event, Some(target));
                (container.id().clone(), outcome)
            })
            .collect()
    }

    /// `replay_target` is `None` while replaying, so nothing is buffered twice.
    fn dispatch(
        &self,
        container: &ApplicationContainer,
        event: &InboundMessage,
        replay_target: Option<Arc<dyn ReplayTarget>>,
    ) -> Dispatch {
        if !container.is_trusted(event) {
            return Dispatch::Untrusted;
        }

        let outcome = container.correlator().on_message(event);
        if outcome != CorrelationOutcome::Unmatched {
            return Dispatch::Correlated(outcome);
        }

        let ParsedMessage::Object(value) = parse_message_data(&event.data) else {
            return Dispatch::Correlated(outcome);
        };
        match Envelope::from_value(&value) {
            Some(request) if request.is_request() => {
                self.serve(container, event, &request, replay_target)
            }
            _ => Dispatch::Correlated(outcome),
        }
    }

    fn serve(
        &self,
        container: &ApplicationContainer,
        event: &InboundMessage,
        request: &Envelope,
        replay_target: Option<Arc<dyn ReplayTarget>>,
    ) -> Dispatch {
        let service = request.service.clone();
        if let Some(handler) = self.services.get(&service) {
            let (status, body) = match handler.handle(container, request) {
                Ok(body) => (STATUS_SUCCESS, body),
                Err(e) => {
                    warn!(container = %container.id(), service = %service, error = %e, "Service failed");
                    (STATUS_ERROR, json!({ "message": e.to_string() }))
                }
            };
            self.send_reply(container, request, status, body);
            return Dispatch::Served { service };
        }

        if let Some(target) = replay_target {
            if let OfferOutcome::Buffered(sequence_index) = self.buffer.offer(container.id(), event, target) {
                debug!(container = %container.id(), service = %service, sequence_index, "Request buffered");
                return Dispatch::Buffered {
                    service,
                    sequence_index,
                };
            }
        }

        debug!(container = %container.id(), service = %service, "No handler for service");
        self.send_reply(
            container,
            request,
            STATUS_ERROR,
            json!({ "message": format!("unknown service {}", service) }),
        );
        Dispatch::Refused { service }
    }

    fn send_reply(
        &self,
        container: &ApplicationContainer,
        request: &Envelope,
        status: &str,
        body: serde_json::Value,
    ) {
        if let Err(e) = container.reply(request, status, body) {
            warn!(container = %container.id(), request_id = %request.request_id, error = %e, "Reply not delivered");
        }
    }
}

impl ReplayTarget for MessageRouter {
    fn replay(&self, message: &BufferedMessage) -> Result<(), EmbedError> {
        let container = self
            .container(&message.container)
            .ok_or_else(|| EmbedError::MissingFrame(message.container.clone()))?;
        debug!(
            container = %message.container,
            sequence_index = message.sequence_index,
            "Replaying buffered message"
        );
        self.dispatch(&container, &message.event, None);
        Ok(())
    }
}
