//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::EmbedError;

/// Map domain/service errors to a string for CLI output.
pub fn map_error(e: &EmbedError) -> String {
    match e {
        EmbedError::StorageError(inner) => format!("storage: {}", inner),
        EmbedError::ConfigError(msg) => format!("config: {}", msg),
        other => other.to_string(),
    }
}
