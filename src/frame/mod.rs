//! Frames
//!
//! The host-side view of an embedded browsing context: the `Frame` a container
//! owns, the slot that resolves a wrapper node to its generated child frame, the
//! hidden form used by the form-submission path and the surface that creates
//! all of these.

pub mod form;
pub mod headless;
pub mod surface;

use crate::error::EmbedError;
use crate::types::WindowId;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use url::Url;

pub use form::{FormField, HiddenForm};
pub use headless::{HeadlessFrame, HeadlessSurface, PostedMessage, SurfaceOp};
pub use surface::{FrameSpec, FrameSurface};

/// A live frame element hosting an embedded document.
pub trait Frame: Send + Sync + fmt::Debug {
    /// DOM id of the frame element
    fn id(&self) -> String;

    /// Browsing context name, the target of forms posting into this frame
    fn name(&self) -> String;

    /// Content window of the frame, if the frame has one yet
    fn content_window(&self) -> Option<WindowId>;

    /// Address the frame last navigated to
    fn current_url(&self) -> Option<Url>;

    /// Point the frame at a new address
    fn navigate(&self, url: &Url) -> Result<(), EmbedError>;

    /// Deliver serialized data to the frame's content window
    fn post_message(&self, data: &str, target_origin: &str) -> Result<(), EmbedError>;
}

/// What a container's visible node currently holds.
#[derive(Debug, Clone, Default)]
pub enum FrameSlot {
    #[default]
    Empty,
    /// The visible node is the frame itself
    Direct(Arc<dyn Frame>),
    /// The visible node wraps a generated child frame
    Wrapper {
        wrapper_id: String,
        child: Option<Arc<dyn Frame>>,
    },
}

impl FrameSlot {
    /// Follow the wrapper indirection to the real frame.
    pub fn resolve(&self) -> Option<Arc<dyn Frame>> {
        match self {
            FrameSlot::Empty => None,
            FrameSlot::Direct(frame) => Some(frame.clone()),
            FrameSlot::Wrapper { child, .. } => child.clone(),
        }
    }
}

/// Shared, exclusively-owned holder of a container's frame slot.
#[derive(Debug, Default)]
pub struct FrameCell {
    slot: RwLock<FrameSlot>,
}

impl FrameCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(&self) -> Option<Arc<dyn Frame>> {
        self.slot.read().resolve()
    }

    /// Copy of the current slot.
    pub fn slot(&self) -> FrameSlot {
        self.slot.read().clone()
    }

    /// Install a new slot, returning whatever was there before.
    pub fn replace(&self, slot: FrameSlot) -> FrameSlot {
        std::mem::replace(&mut *self.slot.write(), slot)
    }

    pub fn take(&self) -> FrameSlot {
        self.replace(FrameSlot::Empty)
    }

    pub fn is_empty(&self) -> bool {
        self.resolve().is_none()
    }
}
