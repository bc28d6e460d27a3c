//! Wire Protocol
//!
//! Envelope shapes exchanged with embedded applications, inbound event
//! representation and the service names the host speaks.

pub mod envelope;
pub mod services;

pub use envelope::{
    parse_message_data, Envelope, EnvelopeKind, InboundMessage, MessageData, ParsedMessage,
    STATUS_ERROR, STATUS_SUCCESS,
};
