//! Trust Boundary
//!
//! Decides whether an inbound message really comes from the frame a container
//! owns. Rejection is silent: callers drop the message and move on.

use crate::frame::FrameSlot;
use crate::protocol::InboundMessage;
use url::{Origin, Url};

/// Derives serialized origins from addresses.
///
/// Used by the trust validator and by any other surface that needs to compare
/// an address against a message origin.
#[derive(Debug, Clone, Copy, Default)]
pub struct OriginResolver;

impl OriginResolver {
    /// Serialized origin of `url`; `None` for opaque origins (about:, data:,
    /// file: and friends), which never compare equal to anything.
    pub fn origin_of(&self, url: &Url) -> Option<String> {
        match url.origin() {
            origin @ Origin::Tuple(..) => Some(origin.ascii_serialization()),
            Origin::Opaque(_) => None,
        }
    }

    /// Parse-and-resolve convenience for string addresses.
    pub fn origin_of_str(&self, address: &str) -> Option<String> {
        Url::parse(address).ok().and_then(|url| self.origin_of(&url))
    }
}

#[derive(Debug, Clone, Default)]
pub struct TrustValidator {
    origins: OriginResolver,
}

impl TrustValidator {
    pub fn new(origins: OriginResolver) -> Self {
        Self { origins }
    }

    /// Trusted iff the message source is the frame's content window or the
    /// message origin equals the origin of the frame's last address.
    pub fn is_trusted(&self, slot: &FrameSlot, message: &InboundMessage) -> bool {
        let Some(frame) = slot.resolve() else {
            return false;
        };

        if let (Some(source), Some(window)) = (message.source, frame.content_window()) {
            if source == window {
                return true;
            }
        }

        frame
            .current_url()
            .and_then(|url| self.origins.origin_of(&url))
            .is_some_and(|expected| expected == message.origin)
    }
}
