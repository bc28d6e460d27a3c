//! Dirty State
//!
//! A persisted "unsaved changes" flag per container, shared by every window of
//! the host through a last-write-wins key-value store with change
//! notifications.

pub mod store;
pub mod sync;

use crate::error::StorageError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use store::{SledStateStore, StateChange, StateSubscription};
pub use sync::{DirtyStateConfig, DirtyStateOwner, DirtyStateSynchronizer};

/// Tokens stored under a container's dirty-state key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DirtyState {
    /// Freshly embedded, nothing known yet
    Initial,
    /// Some window asked the owner to interrogate its application
    Pending,
    Clean,
    Dirty,
    /// The application did not answer in time
    Maybe,
}

impl DirtyState {
    pub fn as_token(self) -> &'static str {
        match self {
            DirtyState::Initial => "INITIAL",
            DirtyState::Pending => "PENDING",
            DirtyState::Clean => "CLEAN",
            DirtyState::Dirty => "DIRTY",
            DirtyState::Maybe => "MAYBE",
        }
    }
}

impl fmt::Display for DirtyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}

impl FromStr for DirtyState {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INITIAL" => Ok(DirtyState::Initial),
            "PENDING" => Ok(DirtyState::Pending),
            "CLEAN" => Ok(DirtyState::Clean),
            "DIRTY" => Ok(DirtyState::Dirty),
            "MAYBE" => Ok(DirtyState::Maybe),
            _ => Err(StorageError::InvalidToken(s.to_string())),
        }
    }
}
