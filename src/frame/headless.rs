//! Headless Surface
//!
//! A surface with no rendering behind it. Frames record what is posted to them
//! and every markup operation is kept in order, which is what the CLI prints
//! for `appframe plan` and what tests assert against.

use crate::error::EmbedError;
use crate::frame::{Frame, FrameSpec, FrameSurface, HiddenForm};
use crate::protocol::Envelope;
use crate::types::{ContainerId, WindowId};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use url::Url;

/// A message delivered to a headless frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostedMessage {
    pub data: String,
    pub target_origin: String,
}

impl PostedMessage {
    pub fn envelope(&self) -> Option<Envelope> {
        serde_json::from_str(&self.data).ok()
    }
}

#[derive(Debug)]
pub struct HeadlessFrame {
    id: Mutex<String>,
    name: String,
    window: WindowId,
    url: Mutex<Option<Url>>,
    navigations: Mutex<Vec<Url>>,
    posts: Mutex<Vec<PostedMessage>>,
    posted: Notify,
    closed: AtomicBool,
}

impl HeadlessFrame {
    pub fn new(id: impl Into<String>, name: impl Into<String>, src: Option<Url>) -> Self {
        Self {
            id: Mutex::new(id.into()),
            name: name.into(),
            window: WindowId::next(),
            navigations: Mutex::new(src.iter().cloned().collect()),
            url: Mutex::new(src),
            posts: Mutex::new(Vec::new()),
            posted: Notify::new(),
            closed: AtomicBool::new(false),
        }
    }

    pub fn window(&self) -> WindowId {
        self.window
    }

    pub fn posts(&self) -> Vec<PostedMessage> {
        self.posts.lock().clone()
    }

    pub fn navigations(&self) -> Vec<Url> {
        self.navigations.lock().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Wait until at least `count` messages have been posted.
    pub async fn wait_for_posts(&self, count: usize) -> Vec<PostedMessage> {
        loop {
            let notified = self.posted.notified();
            {
                let posts = self.posts.lock();
                if posts.len() >= count {
                    return posts.clone();
                }
            }
            notified.await;
        }
    }

    fn set_id(&self, id: &str) {
        *self.id.lock() = id.to_string();
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

impl Frame for HeadlessFrame {
    fn id(&self) -> String {
        self.id.lock().clone()
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn content_window(&self) -> Option<WindowId> {
        if self.is_closed() {
            None
        } else {
            Some(self.window)
        }
    }

    fn current_url(&self) -> Option<Url> {
        self.url.lock().clone()
    }

    fn navigate(&self, url: &Url) -> Result<(), EmbedError> {
        if self.is_closed() {
            return Err(EmbedError::Surface(format!("frame {} is destroyed", self.id())));
        }
        *self.url.lock() = Some(url.clone());
        self.navigations.lock().push(url.clone());
        Ok(())
    }

    fn post_message(&self, data: &str, target_origin: &str) -> Result<(), EmbedError> {
        if self.is_closed() {
            return Err(EmbedError::PostFailed(format!(
                "frame {} has no content window",
                self.id()
            )));
        }
        self.posts.lock().push(PostedMessage {
            data: data.to_string(),
            target_origin: target_origin.to_string(),
        });
        self.posted.notify_waiters();
        Ok(())
    }
}

/// Markup operations in the order the surface saw them.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceOp {
    CreateFrame {
        container: ContainerId,
        id: String,
        name: String,
        src: Option<Url>,
    },
    DestroyFrame {
        container: ContainerId,
        id: String,
    },
    RenameFrame {
        from: String,
        to: String,
    },
    Attached {
        container: ContainerId,
    },
    SubmitForm {
        container: ContainerId,
        form: HiddenForm,
    },
}

#[derive(Debug, Default)]
pub struct HeadlessSurface {
    ops: Mutex<Vec<SurfaceOp>>,
    frames: Mutex<HashMap<ContainerId, Arc<HeadlessFrame>>>,
    deferred_attachment: bool,
    attachment_released: AtomicBool,
    attachment: Notify,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// A surface whose markup only attaches once `release_attachment` is called.
    pub fn with_deferred_attachment() -> Self {
        Self {
            deferred_attachment: true,
            ..Self::default()
        }
    }

    pub fn release_attachment(&self) {
        self.attachment_released.store(true, Ordering::SeqCst);
        self.attachment.notify_waiters();
    }

    pub fn ops(&self) -> Vec<SurfaceOp> {
        self.ops.lock().clone()
    }

    /// Live frame of a container, if any.
    pub fn frame_for(&self, container: &ContainerId) -> Option<Arc<HeadlessFrame>> {
        self.frames.lock().get(container).cloned()
    }

    fn record(&self, op: SurfaceOp) {
        self.ops.lock().push(op);
    }
}

#[async_trait]
impl FrameSurface for HeadlessSurface {
    fn create_frame(
        &self,
        container: &ContainerId,
        spec: &FrameSpec,
    ) -> Result<Arc<dyn Frame>, EmbedError> {
        let mut frames = self.frames.lock();
        if frames.get(container).is_some_and(|live| !live.is_closed()) {
            return Err(EmbedError::Surface(format!(
                "container {} already holds a live frame",
                container
            )));
        }
        let frame = Arc::new(HeadlessFrame::new(
            spec.id.clone(),
            spec.name.clone(),
            spec.src.clone(),
        ));
        frames.insert(container.clone(), frame.clone());
        drop(frames);
        self.record(SurfaceOp::CreateFrame {
            container: container.clone(),
            id: spec.id.clone(),
            name: spec.name.clone(),
            src: spec.src.clone(),
        });
        Ok(frame)
    }

    fn destroy_frame(&self, container: &ContainerId, frame: &dyn Frame) {
        let mut frames = self.frames.lock();
        if let Some(live) = frames.get(container) {
            if live.id() == frame.id() {
                live.close();
                frames.remove(container);
            }
        }
        drop(frames);
        self.record(SurfaceOp::DestroyFrame {
            container: container.clone(),
            id: frame.id(),
        });
    }

    fn set_frame_id(&self, frame: &dyn Frame, id: &str) -> Result<(), EmbedError> {
        let from = frame.id();
        let target = self
            .frames
            .lock()
            .values()
            .find(|f| f.id() == from)
            .cloned()
            .ok_or_else(|| EmbedError::Surface(format!("no frame with id {}", from)))?;
        target.set_id(id);
        self.record(SurfaceOp::RenameFrame {
            from,
            to: id.to_string(),
        });
        Ok(())
    }

    async fn attached(&self, container: &ContainerId) -> Result<(), EmbedError> {
        if self.deferred_attachment {
            loop {
                let notified = self.attachment.notified();
                if self.attachment_released.load(Ordering::SeqCst) {
                    break;
                }
                notified.await;
            }
        }
        self.record(SurfaceOp::Attached {
            container: container.clone(),
        });
        Ok(())
    }

    fn submit_form(&self, container: &ContainerId, form: &HiddenForm) -> Result<(), EmbedError> {
        let frame = self
            .frames
            .lock()
            .get(container)
            .filter(|f| f.name() == form.target)
            .cloned()
            .ok_or_else(|| {
                EmbedError::Surface(format!("no frame named {} to post into", form.target))
            })?;
        self.record(SurfaceOp::SubmitForm {
            container: container.clone(),
            form: form.clone(),
        });
        frame.navigate(&form.action)
    }
}
