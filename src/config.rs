//! Configuration System
//!
//! Layered configuration: built-in defaults, the user's global file, the
//! workspace files and finally `APPFRAME__*` environment variables.

use crate::correlator::CorrelatorConfig;
use crate::dirty::DirtyStateConfig;
use crate::embedding::EmbeddingConfig;
use crate::error::EmbedError;
use crate::logging::LoggingConfig;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppFrameConfig {
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub correlator: CorrelatorConfig,

    #[serde(default)]
    pub dirty_state: DirtyStateConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where the shared dirty-state store lives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Unset means the platform data directory
    #[serde(default)]
    pub store_path: Option<PathBuf>,
}

impl StorageConfig {
    pub fn resolved_store_path(&self) -> Result<PathBuf, EmbedError> {
        if let Some(path) = &self.store_path {
            return Ok(path.clone());
        }
        ProjectDirs::from("", "", "appframe")
            .map(|dirs| dirs.data_dir().join("store"))
            .ok_or_else(|| {
                EmbedError::ConfigError("Could not determine a data directory for the store".to_string())
            })
    }

    pub fn validate(&self) -> Result<(), String> {
        match &self.store_path {
            Some(path) if path.as_os_str().is_empty() => {
                Err("Store path cannot be empty".to_string())
            }
            _ => Ok(()),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Embedding(String),
    DirtyState(String),
    Storage(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Embedding(msg) => write!(f, "Embedding: {}", msg),
            ValidationError::DirtyState(msg) => write!(f, "Dirty state: {}", msg),
            ValidationError::Storage(msg) => write!(f, "Storage: {}", msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl AppFrameConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.embedding.validate() {
            errors.push(ValidationError::Embedding(e));
        }
        if self.dirty_state.key_prefix.trim().is_empty() {
            errors.push(ValidationError::DirtyState(
                "key_prefix cannot be empty".to_string(),
            ));
        }
        if self.dirty_state.query_timeout_ms == 0 {
            errors.push(ValidationError::DirtyState(
                "query_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if let Err(e) = self.storage.validate() {
            errors.push(ValidationError::Storage(e));
        }
        if let Err(e) = self.logging.validate() {
            errors.push(ValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate, folding every problem into one error.
    pub fn ensure_valid(&self) -> Result<(), EmbedError> {
        self.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            EmbedError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })
    }

    pub fn to_toml(&self) -> Result<String, EmbedError> {
        toml::to_string_pretty(self)
            .map_err(|e| EmbedError::ConfigError(format!("Failed to render config: {}", e)))
    }
}
