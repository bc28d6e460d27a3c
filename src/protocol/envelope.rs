//! Message envelopes and inbound event parsing.

use crate::types::WindowId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const STATUS_SUCCESS: &str = "success";
pub const STATUS_ERROR: &str = "error";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeKind {
    Request,
    Response,
}

/// `{type, request_id, service, body}` plus `status` on responses.
///
/// Envelopes are immutable once posted; `request_id` must stay unique while a
/// response to it is awaited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: EnvelopeKind,
    pub request_id: String,
    pub service: String,
    #[serde(default)]
    pub body: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl Envelope {
    /// Build a request with a freshly generated correlation id.
    pub fn request(service: impl Into<String>, body: Value) -> Self {
        Self::request_with_id(uuid::Uuid::new_v4().simple().to_string(), service, body)
    }

    pub fn request_with_id(
        request_id: impl Into<String>,
        service: impl Into<String>,
        body: Value,
    ) -> Self {
        Self {
            kind: EnvelopeKind::Request,
            request_id: request_id.into(),
            service: service.into(),
            body,
            status: None,
        }
    }

    /// Build the host's answer to an inbound request.
    pub fn response_to(request: &Envelope, status: &str, body: Value) -> Self {
        Self {
            kind: EnvelopeKind::Response,
            request_id: request.request_id.clone(),
            service: request.service.clone(),
            body,
            status: Some(status.to_string()),
        }
    }

    /// Interpret a parsed object as an envelope, if it has the shape of one.
    pub fn from_value(value: &Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }

    pub fn is_request(&self) -> bool {
        self.kind == EnvelopeKind::Request
    }

    pub fn to_wire(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Payload of an inbound event as delivered by the host.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageData {
    Text(String),
    Structured(Value),
}

/// An inbound message event.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    /// Browsing context that posted the message, when known
    pub source: Option<WindowId>,
    /// Serialized origin of the sender (e.g. `https://host:443`)
    pub origin: String,
    pub data: MessageData,
}

impl InboundMessage {
    pub fn text(source: Option<WindowId>, origin: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source,
            origin: origin.into(),
            data: MessageData::Text(text.into()),
        }
    }

    pub fn structured(source: Option<WindowId>, origin: impl Into<String>, value: Value) -> Self {
        Self {
            source,
            origin: origin.into(),
            data: MessageData::Structured(value),
        }
    }
}

/// Outcome of trying to read an inbound payload as a JSON object.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedMessage {
    /// Not something this protocol speaks
    Ignored,
    /// Looked like a JSON object but could not be parsed
    Malformed(String),
    Object(Value),
}

/// Text payloads only count when they start with `{`; structured payloads
/// count when they are objects.
///
/// A trusted frame also carries traffic that is not part of this protocol
/// (plain strings from the application's own scripts). Only text that claims
/// to be a JSON object and fails to parse is `Malformed` and settles pending
/// calls; anything else is `Ignored` and leaves them waiting.
pub fn parse_message_data(data: &MessageData) -> ParsedMessage {
    match data {
        MessageData::Text(text) => {
            if !text.trim_start().starts_with('{') {
                return ParsedMessage::Ignored;
            }
            match serde_json::from_str::<Value>(text) {
                Ok(value) if value.is_object() => ParsedMessage::Object(value),
                Ok(_) => ParsedMessage::Ignored,
                Err(e) => ParsedMessage::Malformed(e.to_string()),
            }
        }
        MessageData::Structured(value) if value.is_object() => ParsedMessage::Object(value.clone()),
        MessageData::Structured(_) => ParsedMessage::Ignored,
    }
}
