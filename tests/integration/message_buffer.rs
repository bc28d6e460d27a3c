//! Requests that arrive while extensions load are replayed in arrival order.

use crate::integration::test_utils::{loading_gate, url, Host, HostOptions, LEGACY_ORIGIN};
use appframe::buffer::BufferState;
use appframe::container::ApplicationContainer;
use appframe::embedding::EmbedRequest;
use appframe::error::EmbedError;
use appframe::protocol::{Envelope, InboundMessage, STATUS_ERROR, STATUS_SUCCESS};
use appframe::router::{Dispatch, ServiceHandler};
use appframe::types::ApplicationType;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::Arc;

const CUSTOM_SERVICE: &str = "ext.custom.lookup";

fn recording_handler(seen: Arc<Mutex<Vec<String>>>) -> Arc<dyn ServiceHandler> {
    Arc::new(
        move |_container: &ApplicationContainer, request: &Envelope| -> Result<Value, EmbedError> {
            seen.lock().push(request.request_id.clone());
            Ok(json!({ "ok": true }))
        },
    )
}

#[tokio::test]
async fn test_buffered_requests_replay_in_order_after_loading() {
    let (gate, handle) = loading_gate();
    let host = Host::with_options(HostOptions {
        readiness: gate,
        ..HostOptions::default()
    });
    let container = host.container("c1");
    container
        .embed(EmbedRequest::new(ApplicationType::Nwbc, url("https://legacy.example/nwbc")))
        .await
        .unwrap();
    let frame = host.frame("c1");

    for id in ["1", "2"] {
        let request = Envelope::request_with_id(id, CUSTOM_SERVICE, json!({}));
        let event = InboundMessage::text(
            Some(frame.window()),
            LEGACY_ORIGIN,
            request.to_wire().unwrap(),
        );
        let outcomes = host.router.handle_event(&event);
        assert!(matches!(outcomes[0].1, Dispatch::Buffered { .. }));
    }
    assert_eq!(host.router.buffer().len(), 2);
    assert_eq!(host.router.buffer().state(), BufferState::CheckingPending);
    assert!(frame.posts().is_empty());

    let seen = Arc::new(Mutex::new(Vec::new()));
    host.router.services().register(CUSTOM_SERVICE, recording_handler(seen.clone()));
    handle.finish(Ok(()));
    host.router.buffer().wait_disabled().await;

    assert_eq!(*seen.lock(), vec!["1".to_string(), "2".to_string()]);
    let replies: Vec<_> = frame.posts().iter().filter_map(|p| p.envelope()).collect();
    assert_eq!(replies.len(), 2);
    assert!(replies.iter().all(|r| r.status.as_deref() == Some(STATUS_SUCCESS)));
}

#[tokio::test]
async fn test_failed_loading_still_drains_then_stops_buffering() {
    let (gate, handle) = loading_gate();
    let host = Host::with_options(HostOptions {
        readiness: gate,
        ..HostOptions::default()
    });
    let container = host.container("c1");
    container
        .embed(EmbedRequest::new(ApplicationType::Nwbc, url("https://legacy.example/nwbc")))
        .await
        .unwrap();
    let frame = host.frame("c1");

    host.send_from(
        &frame,
        serde_json::to_value(Envelope::request_with_id("a", CUSTOM_SERVICE, json!({}))).unwrap(),
    );
    handle.finish(Err("plugin failed to load".to_string()));
    host.router.buffer().wait_disabled().await;

    // Nobody registered the service, so the replay answers with an error.
    let first = frame.posts()[0].envelope().unwrap();
    assert_eq!(first.request_id, "a");
    assert_eq!(first.status.as_deref(), Some(STATUS_ERROR));

    let request = Envelope::request_with_id("b", CUSTOM_SERVICE, json!({}));
    let event = InboundMessage::structured(
        Some(frame.window()),
        LEGACY_ORIGIN,
        serde_json::to_value(&request).unwrap(),
    );
    let outcomes = host.router.handle_event(&event);
    assert!(matches!(outcomes[0].1, Dispatch::Refused { .. }));
    assert!(host.router.buffer().is_empty());
}
