//! Request/response correlation through a container and the router.

use crate::integration::test_utils::{url, Host, HostOptions, LEGACY_ORIGIN};
use appframe::correlator::CorrelatorConfig;
use appframe::embedding::EmbedRequest;
use appframe::error::EmbedError;
use appframe::frame::Frame;
use appframe::protocol::{Envelope, InboundMessage};
use appframe::types::ApplicationType;
use serde_json::json;

async fn embedded(host: &Host, id: &str) -> std::sync::Arc<appframe::container::ApplicationContainer> {
    let container = host.container(id);
    container
        .embed(EmbedRequest::new(ApplicationType::Nwbc, url("https://legacy.example/nwbc")))
        .await
        .unwrap();
    container
}

#[tokio::test]
async fn test_success_resolves_with_response() {
    let host = Host::new();
    let container = embedded(&host, "c1").await;
    let frame = host.frame("c1");

    let request = Envelope::request_with_id("42", "app.echo", json!({ "x": 1 }));
    let pending = container.post_message_to_current_iframe(&request, true);
    assert!(container.correlator().is_pending("42"));

    host.send_from(&frame, json!({ "request_id": "42", "status": "success", "body": { "y": 2 } }));
    let response = pending.await.unwrap().unwrap();
    assert_eq!(response["body"]["y"], 2);
    assert_eq!(container.correlator().pending_count(), 0);
}

#[tokio::test]
async fn test_other_status_rejects_with_response() {
    let host = Host::new();
    let container = embedded(&host, "c1").await;
    let frame = host.frame("c1");

    let request = Envelope::request_with_id("7", "app.save", json!({}));
    let pending = container.post_message_to_current_iframe(&request, true);
    host.send_from(&frame, json!({ "request_id": "7", "status": "error", "reason": "locked" }));

    let err = pending.await.unwrap_err();
    assert_eq!(err.rejection_payload().unwrap()["reason"], "locked");
}

#[tokio::test]
async fn test_fire_and_forget_registers_nothing() {
    let host = Host::new();
    let container = embedded(&host, "c1").await;
    let frame = host.frame("c1");

    let request = Envelope::request_with_id("1", "app.notice", json!({}));
    let settled = container
        .post_message_to_iframe(&request, frame.as_ref(), false)
        .await
        .unwrap();
    assert!(settled.is_none());
    assert_eq!(container.correlator().pending_count(), 0);
    assert_eq!(frame.posts().len(), 1);
}

#[tokio::test]
async fn test_malformed_text_resolves_every_waiter_empty() {
    let host = Host::new();
    let container = embedded(&host, "c1").await;
    let frame = host.frame("c1");

    let first = container.post_message_to_current_iframe(&Envelope::request("a.b", json!({})), true);
    let second = container.post_message_to_current_iframe(&Envelope::request("a.c", json!({})), true);
    assert_eq!(container.correlator().pending_count(), 2);

    host.router.handle_event(&InboundMessage::text(
        Some(frame.window()),
        LEGACY_ORIGIN,
        "{not json",
    ));
    assert_eq!(first.await.unwrap(), None);
    assert_eq!(second.await.unwrap(), None);
}

#[tokio::test]
async fn test_non_json_text_is_ignored() {
    let host = Host::new();
    let container = embedded(&host, "c1").await;
    let frame = host.frame("c1");

    let _pending = container.post_message_to_current_iframe(&Envelope::request_with_id("9", "a.b", json!({})), true);
    host.router.handle_event(&InboundMessage::text(Some(frame.window()), LEGACY_ORIGIN, "ping"));
    assert!(container.correlator().is_pending("9"));
}

#[tokio::test]
async fn test_duplicate_request_id_refused() {
    let host = Host::new();
    let container = embedded(&host, "c1").await;

    let request = Envelope::request_with_id("dup", "a.b", json!({}));
    let _first = container.post_message_to_current_iframe(&request, true);
    let second = container.post_message_to_current_iframe(&request, true).await;
    assert!(matches!(second, Err(EmbedError::DuplicateRequestId(_))));
    assert_eq!(container.correlator().pending_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_configured_timeout_removes_pending_entry() {
    let host = Host::with_options(HostOptions {
        correlator: CorrelatorConfig {
            response_timeout_ms: Some(250),
        },
        ..HostOptions::default()
    });
    let container = embedded(&host, "c1").await;

    let request = Envelope::request_with_id("slow", "a.b", json!({}));
    let result = container.post_message_to_current_iframe(&request, true).await;
    assert!(matches!(
        result,
        Err(EmbedError::ResponseTimeout { timeout_ms: 250, .. })
    ));
    assert!(!container.correlator().is_pending("slow"));
}

#[tokio::test]
async fn test_target_origin_is_frame_origin() {
    let host = Host::new();
    let container = embedded(&host, "c1").await;
    let frame = host.frame("c1");
    container
        .post_message_to_current_iframe(&Envelope::request("a.b", json!({})), false)
        .await
        .unwrap();
    assert_eq!(frame.posts()[0].target_origin, LEGACY_ORIGIN);
    assert!(frame.current_url().is_some());
}
