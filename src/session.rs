//! Session Transition Sequencer
//!
//! Stateful application types keep one frame for their whole life. Pointing
//! that frame at a new target first closes the remote session and waits for the
//! application to confirm; the navigation request is posted only afterwards.

use crate::correlator::{Correlator, Settlement};
use crate::error::EmbedError;
use crate::frame::Frame;
use crate::protocol::{services, Envelope};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

pub struct SessionSequencer {
    correlator: Arc<Correlator>,
}

impl SessionSequencer {
    pub fn new(correlator: Arc<Correlator>) -> Self {
        Self { correlator }
    }

    /// Close the current session, then ask the application to start `target`.
    ///
    /// A rejected close fails with [`EmbedError::SessionCloseFailure`] and
    /// nothing further is posted.
    pub async fn transition(&self, frame: &dyn Frame, target: &Url) -> Settlement {
        let close = Envelope::request(services::CLOSE_SESSION_IMMEDIATELY, json!({}));
        debug!(container = %self.correlator.container(), "Closing remote session before switch");
        if let Err(e) = self.correlator.post_message(&close, frame, true).await {
            warn!(
                container = %self.correlator.container(),
                error = %e,
                "Remote session did not close; keeping current application"
            );
            return Err(EmbedError::SessionCloseFailure(Box::new(e)));
        }

        let start = Envelope::request(services::START_SERVICE, json!({ "url": target.as_str() }));
        let settled = self.correlator.post_message(&start, frame, true).await?;
        info!(container = %self.correlator.container(), target = %target, "Session switched");
        Ok(settled)
    }

    /// Fire-and-forget notice that the session should end.
    pub fn close_session_notice(&self, frame: &dyn Frame) -> Result<(), EmbedError> {
        let notice = Envelope::request(services::CLOSE_SESSION, json!({}));
        self.correlator.notify(&notice, frame)
    }
}
