//! Message Correlator
//!
//! Request/response channel into one container's frame. Requests that expect an
//! answer register a pending entry keyed by `request_id`; inbound messages
//! settle the entry whose id they carry. There is no cancellation, and unless
//! `response_timeout_ms` is configured a request that is never answered stays
//! pending for the life of the process.

use crate::error::EmbedError;
use crate::frame::Frame;
use crate::protocol::{parse_message_data, Envelope, InboundMessage, ParsedMessage, STATUS_SUCCESS};
use crate::trust::OriginResolver;
use crate::types::ContainerId;
use futures::future::{self, BoxFuture, FutureExt};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// What a settled request resolves to: the parsed response, or nothing when
/// the call was fire-and-forget or the answer could not be read.
pub type Settlement = Result<Option<Value>, EmbedError>;

/// Future returned by [`Correlator::post_message`].
pub type ResponseFuture = BoxFuture<'static, Settlement>;

type PendingMap = Arc<Mutex<HashMap<String, oneshot::Sender<Settlement>>>>;

/// Correlator configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrelatorConfig {
    /// Give up on an unanswered request after this many milliseconds.
    /// Unset means wait forever.
    #[serde(default)]
    pub response_timeout_ms: Option<u64>,
}

/// How an inbound message related to the pending requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrelationOutcome {
    /// Settled the pending request it answered
    Settled,
    /// Unreadable JSON; every pending request resolved without a value
    Malformed,
    /// A readable object that answers nothing pending
    Unmatched,
    /// Not protocol traffic
    Ignored,
}

pub struct Correlator {
    container: ContainerId,
    pending: PendingMap,
    timeout: Option<Duration>,
    origins: OriginResolver,
}

impl Correlator {
    pub fn new(container: ContainerId, config: &CorrelatorConfig) -> Self {
        Self {
            container,
            pending: Arc::new(Mutex::new(HashMap::new())),
            timeout: config.response_timeout_ms.map(Duration::from_millis),
            origins: OriginResolver,
        }
    }

    pub fn container(&self) -> &ContainerId {
        &self.container
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_pending(&self, request_id: &str) -> bool {
        self.pending.lock().contains_key(request_id)
    }

    /// Post `message` into `frame`.
    ///
    /// Posting happens before this returns. With `wait_for_response == false`
    /// the returned future is already resolved and no pending entry exists.
    /// Otherwise it resolves with the response when its `status` is
    /// `"success"` and fails with [`EmbedError::RequestRejected`] for any other
    /// status.
    pub fn post_message(
        &self,
        message: &Envelope,
        frame: &dyn Frame,
        wait_for_response: bool,
    ) -> ResponseFuture {
        if !wait_for_response {
            return future::ready(self.notify(message, frame).map(|_| None)).boxed();
        }

        let wire = match message.to_wire() {
            Ok(wire) => wire,
            Err(e) => return future::ready(Err(e.into())).boxed(),
        };
        let request_id = message.request_id.clone();
        let receiver = match self.register(&request_id) {
            Ok(receiver) => receiver,
            Err(e) => return future::ready(Err(e)).boxed(),
        };

        if let Err(e) = frame.post_message(&wire, &self.target_origin(frame)) {
            self.pending.lock().remove(&request_id);
            return future::ready(Err(e)).boxed();
        }
        debug!(
            container = %self.container,
            request_id = %request_id,
            service = %message.service,
            "Request posted, awaiting response"
        );

        let pending = Arc::clone(&self.pending);
        let timeout = self.timeout;
        async move {
            let received = match timeout {
                None => receiver.await,
                Some(limit) => match tokio::time::timeout(limit, receiver).await {
                    Ok(received) => received,
                    Err(_) => {
                        pending.lock().remove(&request_id);
                        return Err(EmbedError::ResponseTimeout {
                            request_id,
                            timeout_ms: limit.as_millis() as u64,
                        });
                    }
                },
            };
            received.unwrap_or_else(|_| Err(EmbedError::ChannelClosed(request_id)))
        }
        .boxed()
    }

    /// Fire-and-forget post; registers nothing.
    pub fn notify(&self, message: &Envelope, frame: &dyn Frame) -> Result<(), EmbedError> {
        let wire = message.to_wire()?;
        frame.post_message(&wire, &self.target_origin(frame))?;
        debug!(
            container = %self.container,
            request_id = %message.request_id,
            service = %message.service,
            "Message posted"
        );
        Ok(())
    }

    /// Feed an inbound message that already passed the trust check.
    pub fn on_message(&self, message: &InboundMessage) -> CorrelationOutcome {
        match parse_message_data(&message.data) {
            ParsedMessage::Ignored => CorrelationOutcome::Ignored,
            ParsedMessage::Malformed(reason) => {
                let waiters: Vec<_> = self.pending.lock().drain().collect();
                if waiters.is_empty() {
                    return CorrelationOutcome::Ignored;
                }
                warn!(
                    container = %self.container,
                    origin = %message.origin,
                    error = %reason,
                    pending = waiters.len(),
                    "Unparsable message from embedded application; resolving pending requests"
                );
                for (_, waiter) in waiters {
                    let _ = waiter.send(Ok(None));
                }
                CorrelationOutcome::Malformed
            }
            ParsedMessage::Object(value) => self.settle(value),
        }
    }

    fn settle(&self, value: Value) -> CorrelationOutcome {
        if value.get("type").and_then(Value::as_str) == Some("request") {
            return CorrelationOutcome::Unmatched;
        }
        let Some(request_id) = request_id_of(&value) else {
            return CorrelationOutcome::Unmatched;
        };
        let Some(waiter) = self.pending.lock().remove(&request_id) else {
            return CorrelationOutcome::Unmatched;
        };

        let settlement = match value.get("status").and_then(Value::as_str) {
            Some(STATUS_SUCCESS) => Ok(Some(value)),
            Some(status) => {
                debug!(
                    container = %self.container,
                    request_id = %request_id,
                    status = %status,
                    "Request rejected by embedded application"
                );
                Err(EmbedError::RequestRejected {
                    request_id: request_id.clone(),
                    payload: value,
                })
            }
            None => {
                warn!(
                    container = %self.container,
                    request_id = %request_id,
                    "Response carries no status; treating as success"
                );
                Ok(Some(value))
            }
        };

        if waiter.send(settlement).is_err() {
            debug!(request_id = %request_id, "Response arrived after caller went away");
        }
        CorrelationOutcome::Settled
    }

    fn register(&self, request_id: &str) -> Result<oneshot::Receiver<Settlement>, EmbedError> {
        let mut pending = self.pending.lock();
        if pending.contains_key(request_id) {
            return Err(EmbedError::DuplicateRequestId(request_id.to_string()));
        }
        let (sender, receiver) = oneshot::channel();
        pending.insert(request_id.to_string(), sender);
        Ok(receiver)
    }

    fn target_origin(&self, frame: &dyn Frame) -> String {
        frame
            .current_url()
            .and_then(|url| self.origins.origin_of(&url))
            .unwrap_or_else(|| "*".to_string())
    }
}

fn request_id_of(value: &Value) -> Option<String> {
    match value.get("request_id")? {
        Value::String(id) => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}
