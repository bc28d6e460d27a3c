//! Dirty-state entries, the store listener and the query round trip.

use crate::integration::test_utils::{url, Host, HostOptions};
use appframe::dirty::{DirtyState, DirtyStateConfig};
use appframe::embedding::EmbedRequest;
use appframe::protocol::{services, Envelope};
use appframe::types::ApplicationType;
use serde_json::json;

#[tokio::test]
async fn test_entry_exists_only_while_legacy_application_hosted() {
    let host = Host::new();
    let container = host.container("c1");
    let key = host.services.dirty.key_for(container.token());

    container
        .embed(EmbedRequest::new(ApplicationType::Url, url("https://portal.example/home")))
        .await
        .unwrap();
    assert_eq!(host.services.dirty.state(&key).unwrap(), None);

    container
        .embed(EmbedRequest::new(ApplicationType::Nwbc, url("https://legacy.example/nwbc")))
        .await
        .unwrap();
    assert_eq!(host.services.dirty.state(&key).unwrap(), Some(DirtyState::Initial));
    assert!(key.starts_with("appframe.dirtyState."));

    container.teardown().await.unwrap();
    assert_eq!(host.services.dirty.state(&key).unwrap(), None);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_query_round_trip_through_embedded_application() {
    let host = Host::new();
    let container = host.container("c1");
    container
        .embed(EmbedRequest::new(ApplicationType::Wcf, url("https://legacy.example/wcf")))
        .await
        .unwrap();
    let frame = host.frame("c1");
    let key = container.dirty_key().unwrap();
    let listener = host.services.dirty.spawn_listener();

    let dirty = host.services.dirty.clone();
    let query_key = key.clone();
    let query = tokio::spawn(async move { dirty.query(&query_key).await });

    let posts = frame.wait_for_posts(1).await;
    let ask = posts[0].envelope().unwrap();
    assert_eq!(ask.service, services::GET_DIRTY_STATE);
    assert_eq!(ask.body["key"], key.as_str());

    let report = Envelope::request(services::SET_DIRTY_STATE, json!({ "state": "DIRTY" }));
    host.send_from(&frame, serde_json::to_value(&report).unwrap());

    assert_eq!(query.await.unwrap().unwrap(), Some(DirtyState::Dirty));
    assert_eq!(host.services.dirty.state(&key).unwrap(), Some(DirtyState::Dirty));
    listener.abort();
}

#[tokio::test]
async fn test_silent_application_yields_maybe() {
    let host = Host::with_options(HostOptions {
        dirty_state: DirtyStateConfig {
            query_timeout_ms: 50,
            ..DirtyStateConfig::default()
        },
        ..HostOptions::default()
    });
    let container = host.container("c1");
    container
        .embed(EmbedRequest::new(ApplicationType::Nwbc, url("https://legacy.example/nwbc")))
        .await
        .unwrap();
    let key = container.dirty_key().unwrap();

    let answer = host.services.dirty.query(&key).await.unwrap();
    assert_eq!(answer, Some(DirtyState::Maybe));
    assert_eq!(host.services.dirty.state(&key).unwrap(), Some(DirtyState::Pending));
}

#[tokio::test]
async fn test_query_for_unknown_key_is_none() {
    let host = Host::new();
    let key = host.services.dirty.key_for("nobody");
    assert_eq!(host.services.dirty.query(&key).await.unwrap(), None);
}

#[tokio::test]
async fn test_report_without_legacy_application_is_refused() {
    let host = Host::new();
    let container = host.container("c1");
    container
        .embed(EmbedRequest::new(ApplicationType::Url, url("https://portal.example/home")))
        .await
        .unwrap();
    assert!(container.report_dirty_state(DirtyState::Dirty).is_err());
}
