//! Surface abstraction: where frames and forms get created.

use crate::error::EmbedError;
use crate::frame::{Frame, HiddenForm};
use crate::types::ContainerId;
use async_trait::async_trait;
use std::sync::Arc;
use url::Url;

/// Parameters for a new frame element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSpec {
    pub id: String,
    pub name: String,
    /// `None` creates an empty frame awaiting a form submission
    pub src: Option<Url>,
}

/// Host rendering surface owning the markup of every container.
#[async_trait]
pub trait FrameSurface: Send + Sync {
    /// Create a frame as the generated child of the container's wrapper.
    fn create_frame(
        &self,
        container: &ContainerId,
        spec: &FrameSpec,
    ) -> Result<Arc<dyn Frame>, EmbedError>;

    /// Remove a frame and its content window.
    fn destroy_frame(&self, container: &ContainerId, frame: &dyn Frame);

    /// Change the DOM id of a frame element.
    fn set_frame_id(&self, frame: &dyn Frame, id: &str) -> Result<(), EmbedError>;

    /// Resolves once the container's markup is attached to the document.
    async fn attached(&self, container: &ContainerId) -> Result<(), EmbedError>;

    /// Attach and submit a hidden form.
    fn submit_form(&self, container: &ContainerId, form: &HiddenForm) -> Result<(), EmbedError>;
}
