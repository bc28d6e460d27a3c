//! Messages from anything but the embedded application never reach a handler.

use crate::integration::test_utils::{url, Host, LEGACY_ORIGIN};
use appframe::dirty::DirtyState;
use appframe::embedding::EmbedRequest;
use appframe::frame::{FrameSlot, HeadlessFrame};
use appframe::protocol::{services, Envelope, InboundMessage};
use appframe::router::Dispatch;
use appframe::types::{ApplicationType, WindowId};
use proptest::prelude::*;
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn test_foreign_window_cannot_set_dirty_state() {
    let host = Host::new();
    let container = host.container("c1");
    container
        .embed(EmbedRequest::new(ApplicationType::Nwbc, url("https://legacy.example/nwbc")))
        .await
        .unwrap();
    let frame = host.frame("c1");

    let request = Envelope::request(services::SET_DIRTY_STATE, json!({ "state": "DIRTY" }));
    let event = InboundMessage::text(
        Some(WindowId::next()),
        "https://attacker.example",
        request.to_wire().unwrap(),
    );
    let outcomes = host.router.handle_event(&event);

    assert_eq!(outcomes[0].1, Dispatch::Untrusted);
    let key = container.dirty_key().unwrap();
    assert_eq!(host.services.dirty.state(&key).unwrap(), Some(DirtyState::Initial));
    assert!(frame.posts().is_empty());
}

#[tokio::test]
async fn test_same_origin_without_source_is_trusted() {
    let host = Host::new();
    let container = host.container("c1");
    container
        .embed(EmbedRequest::new(ApplicationType::Nwbc, url("https://legacy.example/nwbc")))
        .await
        .unwrap();

    let request = Envelope::request(services::SET_DIRTY_STATE, json!({ "state": "CLEAN" }));
    let event = InboundMessage::text(None, LEGACY_ORIGIN, request.to_wire().unwrap());
    let outcomes = host.router.handle_event(&event);

    assert!(matches!(outcomes[0].1, Dispatch::Served { .. }));
    let key = container.dirty_key().unwrap();
    assert_eq!(host.services.dirty.state(&key).unwrap(), Some(DirtyState::Clean));
}

#[test]
fn test_container_without_frame_trusts_nothing() {
    let host = Host::new();
    let container = host.container("empty");
    let event = InboundMessage::text(None, LEGACY_ORIGIN, "{}");
    assert!(!container.is_trusted(&event));
}

fn foreign_origin() -> impl Strategy<Value = String> {
    ("[a-z]{1,12}", prop_oneof![Just("http"), Just("https")], proptest::option::of(1u16..9999))
        .prop_map(|(host, scheme, port)| match port {
            Some(port) => format!("{}://{}.test:{}", scheme, host, port),
            None => format!("{}://{}.test", scheme, host),
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_untrusted_origin_never_dispatched(origin in foreign_origin(), body in "[ -~]{0,40}") {
        let host = Host::new();
        let container = host.container("c1");
        let frame = Arc::new(HeadlessFrame::new("c1", "c1", Some(url("https://legacy.example/app"))));
        container.frame_cell().replace(FrameSlot::Direct(frame.clone()));

        let request = Envelope::request(services::SET_DIRTY_STATE, json!({ "state": body }));
        let event = InboundMessage::text(None, origin, request.to_wire().unwrap());
        let outcomes = host.router.handle_event(&event);

        prop_assert_eq!(outcomes.len(), 1);
        prop_assert_eq!(&outcomes[0].1, &Dispatch::Untrusted);
        prop_assert!(frame.posts().is_empty());
    }
}
