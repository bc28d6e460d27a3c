//! Appframe: cross-context embedding and messaging
//!
//! Hosts foreign-origin applications in frames and talks to them reliably: a
//! correlated request/response channel, an origin and source trust boundary, a
//! buffer for traffic that arrives before the host can dispatch it, a dirty
//! flag shared across windows through persistent storage, and a sequencer that
//! closes an old remote session before a frame is reused.

pub mod buffer;
pub mod cli;
pub mod config;
pub mod container;
pub mod correlator;
pub mod dirty;
pub mod embedding;
pub mod error;
pub mod frame;
pub mod logging;
pub mod protocol;
pub mod router;
pub mod session;
pub mod trust;
pub mod types;
