//! Core identifiers and application type classification.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a container, the logical owner of at most one frame.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContainerId(String);

impl ContainerId {
    pub fn new(id: impl Into<String>) -> Self {
        ContainerId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContainerId {
    fn from(value: &str) -> Self {
        ContainerId::new(value)
    }
}

/// Handle of a browsing context (a window or a frame's content window).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowId(pub u64);

impl WindowId {
    /// Allocate a process-unique window id.
    pub fn next() -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        WindowId(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// How an application type decides between navigation and form submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormPostPolicy {
    Never,
    WhenBodyParams,
    Always,
}

/// Kinds of application a container can host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ApplicationType {
    /// Plain address embedded by navigation
    Url,
    /// Web GUI transaction
    #[serde(rename = "TR")]
    Transaction,
    /// Web Dynpro application
    #[serde(rename = "WDA")]
    WebDynpro,
    /// Business client content
    Nwbc,
    /// Web client framework UI
    Wcf,
}

impl ApplicationType {
    pub const ALL: [ApplicationType; 5] = [
        ApplicationType::Url,
        ApplicationType::Transaction,
        ApplicationType::WebDynpro,
        ApplicationType::Nwbc,
        ApplicationType::Wcf,
    ];

    /// Legacy applications speak the dirty-state protocol.
    pub fn is_legacy(self) -> bool {
        !matches!(self, ApplicationType::Url)
    }

    /// Stateful applications hold a remote session that must be closed
    /// before their frame is reused.
    pub fn is_stateful(self) -> bool {
        matches!(self, ApplicationType::Transaction | ApplicationType::WebDynpro)
    }

    pub fn form_post_policy(self) -> FormPostPolicy {
        match self {
            ApplicationType::Transaction => FormPostPolicy::Always,
            ApplicationType::WebDynpro | ApplicationType::Wcf => FormPostPolicy::WhenBodyParams,
            ApplicationType::Url | ApplicationType::Nwbc => FormPostPolicy::Never,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ApplicationType::Url => "URL",
            ApplicationType::Transaction => "TR",
            ApplicationType::WebDynpro => "WDA",
            ApplicationType::Nwbc => "NWBC",
            ApplicationType::Wcf => "WCF",
        }
    }
}

impl fmt::Display for ApplicationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ApplicationType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown application type: {}", s))
    }
}
