//! Frame Embedding Strategy
//!
//! Decides how a target reaches a container's frame: plain navigation to a
//! rewritten address, or an empty frame that a hidden form posts into once the
//! markup is attached.

pub mod params;
pub mod state;
pub mod strategy;

use serde::{Deserialize, Serialize};

pub use state::{InMemoryStatePersistence, NoStatePersistence, StatePersistence};
pub use strategy::{EmbedRequest, EmbeddingPlan, EmbeddingStrategy};

/// Embedding configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Parameters never forwarded to the embedded application
    #[serde(default = "default_denylist")]
    pub denylist: Vec<String>,

    /// Parameters holding state keys that are resolved and sent as body fields
    #[serde(default = "default_state_params")]
    pub state_params: Vec<String>,

    /// Addresses longer than this switch capable types to form submission
    #[serde(default = "default_max_url_length")]
    pub max_url_length: usize,

    /// Name of the form field carrying the host context as JSON
    #[serde(default = "default_context_field")]
    pub context_field: String,
}

fn default_denylist() -> Vec<String> {
    vec![
        "sap-ushell-defaultedParameterNames".to_string(),
        "sap-ui-app-id-hint".to_string(),
        "sap-remote-system".to_string(),
    ]
}

fn default_state_params() -> Vec<String> {
    vec![
        "sap-intent-param".to_string(),
        "sap-xapp-state".to_string(),
        "sap-iapp-state".to_string(),
    ]
}

fn default_max_url_length() -> usize {
    2048
}

fn default_context_field() -> String {
    "sap-flp-params".to_string()
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            denylist: default_denylist(),
            state_params: default_state_params(),
            max_url_length: default_max_url_length(),
            context_field: default_context_field(),
        }
    }
}

impl EmbeddingConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_url_length == 0 {
            return Err("max_url_length must be greater than zero".to_string());
        }
        if self.context_field.trim().is_empty() {
            return Err("context_field cannot be empty".to_string());
        }
        Ok(())
    }
}

/// Layout density requested by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Density {
    Cozy,
    Compact,
}

/// Host settings that become derived parameters or form context.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostContext {
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub accessibility: bool,
    #[serde(default)]
    pub statistics: bool,
    #[serde(default)]
    pub session_timeout_minutes: Option<u32>,
    #[serde(default)]
    pub iapp_state_key: Option<String>,
    #[serde(default)]
    pub density: Option<Density>,
    /// Address of the host page, forwarded in the form context
    #[serde(default)]
    pub host_url: Option<String>,
    #[serde(default)]
    pub system_alias: Option<String>,
}
