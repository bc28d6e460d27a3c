//! Container embed, close and teardown behavior.

use crate::integration::test_utils::{url, Host};
use appframe::embedding::EmbedRequest;
use appframe::error::EmbedError;
use appframe::protocol::{services, Envelope, STATUS_SUCCESS};
use appframe::types::ApplicationType;
use serde_json::json;

#[tokio::test]
async fn test_teardown_of_stateful_application_closes_session() {
    let host = Host::new();
    let container = host.container("c1");
    container
        .embed(EmbedRequest::new(
            ApplicationType::WebDynpro,
            url("https://legacy.example/sap/bc/webdynpro/app"),
        ))
        .await
        .unwrap();
    let frame = host.frame("c1");

    container.teardown().await.unwrap();

    let notice = frame.posts()[0].envelope().unwrap();
    assert_eq!(notice.service, services::CLOSE_SESSION);
    assert!(frame.is_closed());
    assert!(container.current_frame().is_none());
    assert!(container.app_type().is_none());
    assert_eq!(container.correlator().pending_count(), 0);
}

#[tokio::test]
async fn test_teardown_of_url_application_posts_nothing() {
    let host = Host::new();
    let container = host.container("c1");
    container
        .embed(EmbedRequest::new(ApplicationType::Url, url("https://portal.example/home")))
        .await
        .unwrap();
    let frame = host.frame("c1");

    container.teardown().await.unwrap();
    assert!(frame.posts().is_empty());
    assert!(frame.is_closed());
}

#[tokio::test]
async fn test_before_app_close_round_trip() {
    let host = Host::new();
    let container = host.container("c1");
    container
        .embed(EmbedRequest::new(ApplicationType::Nwbc, url("https://legacy.example/nwbc")))
        .await
        .unwrap();
    let frame = host.frame("c1");

    let pending = container.send_before_app_close_event();
    let notice = frame.posts()[0].envelope().unwrap();
    assert_eq!(notice.service, services::BEFORE_APP_CLOSE);
    assert!(notice.is_request());

    host.send_from(
        &frame,
        json!({ "request_id": notice.request_id, "status": STATUS_SUCCESS, "body": { "veto": false } }),
    );
    let response = pending.await.unwrap().unwrap();
    assert_eq!(response["body"]["veto"], false);
}

#[tokio::test]
async fn test_posting_without_frame_fails_with_missing_frame() {
    let host = Host::new();
    let container = host.container("c1");

    let result = container
        .post_message_to_current_iframe(&Envelope::request("a.b", json!({})), true)
        .await;
    assert!(matches!(result, Err(EmbedError::MissingFrame(id)) if id.as_str() == "c1"));

    let switched = container
        .set_new_application_context(ApplicationType::Url, &url("https://portal.example/x"))
        .await;
    assert!(matches!(switched, Err(EmbedError::MissingFrame(_))));
}

#[tokio::test]
async fn test_switching_type_closes_previous_stateful_session() {
    let host = Host::new();
    let container = host.container("c1");
    container
        .embed(EmbedRequest::new(
            ApplicationType::Transaction,
            url("https://legacy.example/sap/bc/gui/its/webgui?~transaction=SU01"),
        ))
        .await
        .unwrap();
    let old_frame = host.frame("c1");

    container
        .embed(EmbedRequest::new(ApplicationType::Url, url("https://portal.example/home")))
        .await
        .unwrap();

    let notice = old_frame.posts()[0].envelope().unwrap();
    assert_eq!(notice.service, services::CLOSE_SESSION);
    assert!(old_frame.is_closed());
    assert_eq!(container.app_type(), Some(ApplicationType::Url));
    assert!(container.dirty_key().is_none());
}
