//! Error types for the appframe embedding and messaging core.

use crate::types::{ApplicationType, ContainerId};
use serde_json::Value;
use thiserror::Error;

/// Storage-related errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Unknown dirty state token: {0}")]
    InvalidToken(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
}

/// Errors surfaced by containers, the correlator and the embedding strategy.
///
/// Trust violations are deliberately absent: untrusted messages are dropped,
/// never reported.
#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("No context switch handler registered for application type {0}")]
    UnsupportedApplicationType(ApplicationType),

    #[error("Container {0} has no live frame")]
    MissingFrame(ContainerId),

    #[error("Request {request_id} was rejected by the embedded application")]
    RequestRejected { request_id: String, payload: Value },

    #[error("Closing the remote session failed: {0}")]
    SessionCloseFailure(#[source] Box<EmbedError>),

    #[error("Request id {0} already has a pending response")]
    DuplicateRequestId(String),

    #[error("No response to request {request_id} within {timeout_ms} ms")]
    ResponseTimeout { request_id: String, timeout_ms: u64 },

    #[error("Correlator dropped before request {0} settled")]
    ChannelClosed(String),

    #[error("Posting to frame failed: {0}")]
    PostFailed(String),

    #[error("Frame surface error: {0}")]
    Surface(String),

    #[error("Invalid address: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl EmbedError {
    /// Payload carried by a rejected request, if this is one.
    pub fn rejection_payload(&self) -> Option<&Value> {
        match self {
            EmbedError::RequestRejected { payload, .. } => Some(payload),
            _ => None,
        }
    }
}

impl From<config::ConfigError> for EmbedError {
    fn from(err: config::ConfigError) -> Self {
        EmbedError::ConfigError(err.to_string())
    }
}

pub(crate) fn sled_io(err: sled::Error) -> StorageError {
    StorageError::IoError(std::io::Error::new(
        std::io::ErrorKind::Other,
        err.to_string(),
    ))
}
