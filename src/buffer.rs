//! Message Buffer
//!
//! Handling of some legacy-application messages depends on optional host
//! extensions that load asynchronously. Inbound traffic the live handler could
//! not process while those extensions are still loading is queued here and
//! replayed once, in arrival order, after loading settles. After that single
//! drain the buffer is disabled for the rest of the process.

use crate::error::EmbedError;
use crate::protocol::InboundMessage;
use crate::types::ContainerId;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Whether the optional extension subsystem is still loading.
#[async_trait]
pub trait ExtensionReadiness: Send + Sync {
    fn is_loading(&self) -> bool;

    /// Resolves when loading finishes, successfully or not.
    async fn settled(&self) -> Result<(), String>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum GateState {
    Loading,
    Loaded,
    Failed(String),
}

/// Watch-channel backed [`ExtensionReadiness`].
#[derive(Debug, Clone)]
pub struct ExtensionGate {
    state: watch::Receiver<GateState>,
}

/// Completes an [`ExtensionGate`].
#[derive(Debug)]
pub struct ExtensionGateHandle {
    state: watch::Sender<GateState>,
}

impl ExtensionGate {
    /// A gate that is still loading, plus the handle that settles it.
    pub fn loading() -> (Self, ExtensionGateHandle) {
        let (tx, rx) = watch::channel(GateState::Loading);
        (Self { state: rx }, ExtensionGateHandle { state: tx })
    }

    /// A gate with nothing left to load.
    pub fn ready() -> Self {
        let (_tx, rx) = watch::channel(GateState::Loaded);
        Self { state: rx }
    }
}

impl ExtensionGateHandle {
    pub fn finish(&self, result: Result<(), String>) {
        let next = match result {
            Ok(()) => GateState::Loaded,
            Err(e) => GateState::Failed(e),
        };
        self.state.send_replace(next);
    }
}

#[async_trait]
impl ExtensionReadiness for ExtensionGate {
    fn is_loading(&self) -> bool {
        *self.state.borrow() == GateState::Loading
    }

    async fn settled(&self) -> Result<(), String> {
        let mut state = self.state.clone();
        loop {
            let current = state.borrow_and_update().clone();
            match current {
                GateState::Loaded => return Ok(()),
                GateState::Failed(e) => return Err(e),
                GateState::Loading => {}
            }
            if state.changed().await.is_err() {
                return Err("extension loader went away before settling".to_string());
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferState {
    NotChecked,
    CheckingPending,
    Draining,
    Disabled,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BufferedMessage {
    pub sequence_index: u64,
    pub container: ContainerId,
    pub event: InboundMessage,
}

/// Receives buffered messages on replay; the live dispatch path.
pub trait ReplayTarget: Send + Sync {
    fn replay(&self, message: &BufferedMessage) -> Result<(), EmbedError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfferOutcome {
    Buffered(u64),
    /// The buffer is not (or no longer) accepting; handle the message live
    Declined,
}

struct BufferInner {
    state: BufferState,
    queue: VecDeque<BufferedMessage>,
    next_index: u64,
}

pub struct MessageBuffer {
    readiness: Arc<dyn ExtensionReadiness>,
    inner: Mutex<BufferInner>,
    state_tx: watch::Sender<BufferState>,
}

impl MessageBuffer {
    pub fn new(readiness: Arc<dyn ExtensionReadiness>) -> Self {
        let (state_tx, _) = watch::channel(BufferState::NotChecked);
        Self {
            readiness,
            inner: Mutex::new(BufferInner {
                state: BufferState::NotChecked,
                queue: VecDeque::new(),
                next_index: 0,
            }),
            state_tx,
        }
    }

    pub fn state(&self) -> BufferState {
        self.inner.lock().state
    }

    pub fn len(&self) -> usize {
        self.inner.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Offer a message the live handler could not process.
    ///
    /// The first offer decides whether buffering happens at all; the drain is
    /// spawned on the current tokio runtime and replays through `target`.
    pub fn offer(
        self: &Arc<Self>,
        container: &ContainerId,
        event: &InboundMessage,
        target: Arc<dyn ReplayTarget>,
    ) -> OfferOutcome {
        let mut inner = self.inner.lock();
        match inner.state {
            BufferState::Disabled => OfferOutcome::Declined,
            BufferState::NotChecked => {
                if !self.readiness.is_loading() {
                    debug!("Extensions already settled; message buffering disabled");
                    self.transition(&mut inner, BufferState::Disabled);
                    return OfferOutcome::Declined;
                }
                let Ok(runtime) = tokio::runtime::Handle::try_current() else {
                    warn!("No async runtime to await extension loading; message buffering disabled");
                    self.transition(&mut inner, BufferState::Disabled);
                    return OfferOutcome::Declined;
                };
                self.transition(&mut inner, BufferState::CheckingPending);
                let index = Self::push(&mut inner, container, event);
                info!("Extensions still loading; buffering inbound messages");

                let buffer = Arc::clone(self);
                runtime.spawn(async move { buffer.wait_and_drain(target).await });
                OfferOutcome::Buffered(index)
            }
            BufferState::CheckingPending | BufferState::Draining => {
                OfferOutcome::Buffered(Self::push(&mut inner, container, event))
            }
        }
    }

    /// Resolves once the buffer has been disabled.
    pub async fn wait_disabled(&self) {
        let mut state = self.state_tx.subscribe();
        loop {
            if *state.borrow_and_update() == BufferState::Disabled {
                return;
            }
            if state.changed().await.is_err() {
                return;
            }
        }
    }

    async fn wait_and_drain(&self, target: Arc<dyn ReplayTarget>) {
        match self.readiness.settled().await {
            Ok(()) => debug!("Extensions loaded; replaying buffered messages"),
            Err(e) => warn!(error = %e, "Extension loading failed; replaying buffered messages anyway"),
        }
        self.drain(target.as_ref());
    }

    fn drain(&self, target: &dyn ReplayTarget) {
        {
            let mut inner = self.inner.lock();
            self.transition(&mut inner, BufferState::Draining);
        }
        let mut replayed = 0usize;
        loop {
            let next = {
                let mut inner = self.inner.lock();
                match inner.queue.pop_front() {
                    Some(message) => message,
                    None => {
                        self.transition(&mut inner, BufferState::Disabled);
                        break;
                    }
                }
            };
            if let Err(e) = target.replay(&next) {
                warn!(
                    container = %next.container,
                    sequence_index = next.sequence_index,
                    error = %e,
                    "Replaying buffered message failed"
                );
            }
            replayed += 1;
        }
        info!(replayed, "Message buffer drained and disabled");
    }

    fn push(inner: &mut BufferInner, container: &ContainerId, event: &InboundMessage) -> u64 {
        let index = inner.next_index;
        inner.next_index += 1;
        inner.queue.push_back(BufferedMessage {
            sequence_index: index,
            container: container.clone(),
            event: event.clone(),
        });
        index
    }

    fn transition(&self, inner: &mut BufferInner, next: BufferState) {
        debug!(from = ?inner.state, to = ?next, "Message buffer state change");
        inner.state = next;
        self.state_tx.send_replace(next);
    }
}
