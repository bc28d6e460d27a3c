//! Shared test utilities for integration tests
//!
//! A headless host (surface, services, router) plus environment isolation for
//! the configuration tests.

#![allow(dead_code)]

use appframe::buffer::{ExtensionGate, ExtensionGateHandle, ExtensionReadiness, MessageBuffer};
use appframe::container::{ApplicationContainer, ContainerServices};
use appframe::correlator::CorrelatorConfig;
use appframe::dirty::{DirtyStateConfig, DirtyStateSynchronizer, SledStateStore};
use appframe::embedding::{EmbeddingConfig, EmbeddingStrategy, InMemoryStatePersistence};
use appframe::frame::{HeadlessFrame, HeadlessSurface};
use appframe::protocol::{Envelope, InboundMessage};
use appframe::router::{MessageRouter, ServiceRegistry};
use appframe::types::ContainerId;
use serde_json::json;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use url::Url;

pub const LEGACY_ORIGIN: &str = "https://legacy.example";

/// A host with a headless surface and every collaborator wired up.
pub struct Host {
    pub surface: Arc<HeadlessSurface>,
    pub services: Arc<ContainerServices>,
    pub state: Arc<InMemoryStatePersistence>,
    pub router: Arc<MessageRouter>,
    _store_dir: TempDir,
}

pub struct HostOptions {
    pub surface: HeadlessSurface,
    pub correlator: CorrelatorConfig,
    pub dirty_state: DirtyStateConfig,
    pub readiness: Arc<dyn ExtensionReadiness>,
}

impl Default for HostOptions {
    fn default() -> Self {
        Self {
            surface: HeadlessSurface::new(),
            correlator: CorrelatorConfig::default(),
            dirty_state: DirtyStateConfig::default(),
            readiness: Arc::new(ExtensionGate::ready()),
        }
    }
}

impl Host {
    pub fn new() -> Self {
        Self::with_options(HostOptions::default())
    }

    pub fn with_options(options: HostOptions) -> Self {
        let store_dir = TempDir::new().unwrap();
        let store = SledStateStore::open(store_dir.path()).unwrap();
        let surface = Arc::new(options.surface);
        let state = Arc::new(InMemoryStatePersistence::new());
        let services = Arc::new(ContainerServices::new(
            surface.clone(),
            Arc::new(EmbeddingStrategy::new(EmbeddingConfig::default(), state.clone())),
            Arc::new(DirtyStateSynchronizer::new(store, options.dirty_state)),
            options.correlator,
        ));
        let router = Arc::new(MessageRouter::new(
            ServiceRegistry::with_builtins(),
            Arc::new(MessageBuffer::new(options.readiness)),
        ));
        Self {
            surface,
            services,
            state,
            router,
            _store_dir: store_dir,
        }
    }

    /// A container registered with the router.
    pub fn container(&self, id: &str) -> Arc<ApplicationContainer> {
        let container = Arc::new(ApplicationContainer::new(
            ContainerId::new(id),
            self.services.clone(),
        ));
        self.router.register(container.clone());
        container
    }

    pub fn frame(&self, id: &str) -> Arc<HeadlessFrame> {
        self.surface.frame_for(&ContainerId::new(id)).unwrap()
    }

    /// Deliver a JSON value as text from `frame`'s content window.
    pub fn send_from(&self, frame: &HeadlessFrame, value: serde_json::Value) {
        let event = InboundMessage::text(Some(frame.window()), LEGACY_ORIGIN, value.to_string());
        self.router.handle_event(&event);
    }

    /// Answer a request the host posted into `frame`.
    pub fn answer(&self, frame: &HeadlessFrame, request: &Envelope, status: &str) {
        self.send_from(
            frame,
            json!({ "request_id": request.request_id, "status": status, "body": {} }),
        );
    }
}

pub fn loading_gate() -> (Arc<ExtensionGate>, ExtensionGateHandle) {
    let (gate, handle) = ExtensionGate::loading();
    (Arc::new(gate), handle)
}

pub fn url(s: &str) -> Url {
    Url::parse(s).unwrap()
}

/// Global mutex to serialize environment variable access across all tests
static ENV_MUTEX: Mutex<()> = Mutex::new(());

const ISOLATED_VARS: [&str; 5] = [
    "HOME",
    "XDG_CONFIG_HOME",
    "XDG_DATA_HOME",
    "APPFRAME_ENV",
    "APPFRAME__CORRELATOR__RESPONSE_TIMEOUT_MS",
];

/// Environment variable state to restore after test
struct EnvState {
    saved: Vec<(&'static str, Option<String>)>,
}

impl EnvState {
    fn capture() -> Self {
        Self {
            saved: ISOLATED_VARS
                .iter()
                .map(|name| (*name, std::env::var(name).ok()))
                .collect(),
        }
    }

    fn restore(self) {
        for (name, value) in self.saved {
            match value {
                Some(orig) => std::env::set_var(name, orig),
                None => std::env::remove_var(name),
            }
        }
    }
}

/// Run `f` with HOME and the XDG directories pointing into `test_dir`.
///
/// The global config file then lives at `<test_dir>/appframe/config.toml`.
pub fn with_xdg_env<F, R>(test_dir: &TempDir, f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let env_state = EnvState::capture();

    let test_config_home = test_dir.path().to_path_buf();
    let test_data_home = test_dir.path().join("data");
    let test_home = test_dir.path().join("home");

    std::fs::create_dir_all(&test_data_home).unwrap();
    std::fs::create_dir_all(&test_home).unwrap();

    std::env::set_var("HOME", test_home.to_str().unwrap());
    std::env::set_var("XDG_CONFIG_HOME", test_config_home.to_str().unwrap());
    std::env::set_var("XDG_DATA_HOME", test_data_home.to_str().unwrap());
    std::env::remove_var("APPFRAME_ENV");
    std::env::remove_var("APPFRAME__CORRELATOR__RESPONSE_TIMEOUT_MS");

    let result = f();

    env_state.restore();

    result
}
