//! Service names used on the wire.

/// Ask a stateful application to close its remote session; the host waits
/// for the answer before reusing the frame.
pub const CLOSE_SESSION_IMMEDIATELY: &str = "sap.gui.triggerCloseSessionImmediately";

/// Fire-and-forget close-session notice sent on teardown.
pub const CLOSE_SESSION: &str = "sap.gui.triggerCloseSession";

/// Navigate an existing stateful frame to a new target.
pub const START_SERVICE: &str = "sap.its.startService";

/// Notify the embedded application that it is about to be closed.
pub const BEFORE_APP_CLOSE: &str = "sap.ushell.appLifeCycle.beforeAppClose";

/// Ask the embedded application to publish its dirty state.
pub const GET_DIRTY_STATE: &str = "sap.its.getGlobalDirty";

/// Inbound: the embedded application reports its own dirty state.
pub const SET_DIRTY_STATE: &str = "sap.its.setDirtyState";
