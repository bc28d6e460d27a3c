//! Integration tests for the appframe embedding and messaging core

mod container_lifecycle;
mod correlator_protocol;
mod dirty_state;
mod message_buffer;
mod session_transition;
mod test_utils;
mod trust_boundary;
