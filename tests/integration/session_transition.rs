//! Stateful context switches close the remote session before navigating.

use crate::integration::test_utils::{url, Host};
use appframe::container::ApplicationContainer;
use appframe::embedding::EmbedRequest;
use appframe::error::EmbedError;
use appframe::protocol::{services, STATUS_ERROR, STATUS_SUCCESS};
use appframe::types::ApplicationType;
use std::sync::Arc;

async fn transaction(host: &Host) -> Arc<ApplicationContainer> {
    let container = host.container("tr");
    container
        .embed(EmbedRequest::new(
            ApplicationType::Transaction,
            url("https://legacy.example/sap/bc/gui/its/webgui?~transaction=SU01"),
        ))
        .await
        .unwrap();
    container
}

#[tokio::test]
async fn test_start_service_posted_only_after_close_confirmed() {
    let host = Host::new();
    let container = transaction(&host).await;
    let frame = host.frame("tr");
    let target = url("https://legacy.example/sap/bc/gui/its/webgui?~transaction=SM30");

    let application = async {
        let posts = frame.wait_for_posts(1).await;
        assert_eq!(posts.len(), 1);
        let close = posts[0].envelope().unwrap();
        assert_eq!(close.service, services::CLOSE_SESSION_IMMEDIATELY);
        host.answer(&frame, &close, STATUS_SUCCESS);

        let posts = frame.wait_for_posts(2).await;
        let start = posts[1].envelope().unwrap();
        assert_eq!(start.service, services::START_SERVICE);
        assert_eq!(start.body["url"], target.as_str());
        host.answer(&frame, &start, STATUS_SUCCESS);
    };
    let (settled, ()) = tokio::join!(
        container.set_new_application_context(ApplicationType::Transaction, &target),
        application
    );

    assert!(settled.unwrap().is_some());
    assert_eq!(container.correlator().pending_count(), 0);
    assert_eq!(container.app_type(), Some(ApplicationType::Transaction));
}

#[tokio::test]
async fn test_rejected_close_keeps_application_and_posts_nothing_else() {
    let host = Host::new();
    let container = transaction(&host).await;
    let frame = host.frame("tr");
    let target = url("https://legacy.example/sap/bc/gui/its/webgui?~transaction=SM30");

    let application = async {
        let posts = frame.wait_for_posts(1).await;
        host.answer(&frame, &posts[0].envelope().unwrap(), STATUS_ERROR);
    };
    let (settled, ()) = tokio::join!(
        container.set_new_application_context(ApplicationType::Transaction, &target),
        application
    );

    assert!(matches!(settled, Err(EmbedError::SessionCloseFailure(_))));
    tokio::task::yield_now().await;
    assert_eq!(frame.posts().len(), 1);
    assert!(frame.navigations().iter().all(|u| !u.as_str().contains("SM30")));
}

#[tokio::test]
async fn test_url_switch_navigates_without_messages() {
    let host = Host::new();
    let container = host.container("u");
    container
        .embed(EmbedRequest::new(ApplicationType::Url, url("https://portal.example/one")))
        .await
        .unwrap();
    let frame = host.frame("u");

    let settled = container
        .set_new_application_context(ApplicationType::Url, &url("https://portal.example/two"))
        .await
        .unwrap();
    assert!(settled.is_none());
    assert!(frame.posts().is_empty());
    assert_eq!(
        frame.navigations().last().map(|u| u.as_str().to_string()),
        Some("https://portal.example/two".to_string())
    );
}

#[tokio::test]
async fn test_unsupported_type_rejected_before_touching_frame() {
    let host = Host::new();
    let container = host.container("n");
    container
        .embed(EmbedRequest::new(ApplicationType::Nwbc, url("https://legacy.example/nwbc")))
        .await
        .unwrap();

    let result = container
        .set_new_application_context(ApplicationType::Nwbc, &url("https://legacy.example/other"))
        .await;
    assert!(matches!(
        result,
        Err(EmbedError::UnsupportedApplicationType(ApplicationType::Nwbc))
    ));
    assert!(host.frame("n").posts().is_empty());
}

#[tokio::test]
async fn test_reembedding_same_stateful_type_closes_old_session() {
    let host = Host::new();
    let container = transaction(&host).await;
    let old_frame = host.frame("tr");

    container
        .embed(EmbedRequest::new(
            ApplicationType::Transaction,
            url("https://legacy.example/sap/bc/gui/its/webgui?~transaction=SM30"),
        ))
        .await
        .unwrap();

    let posts = old_frame.posts();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].envelope().unwrap().service, services::CLOSE_SESSION);
    assert!(old_frame.is_closed());
    assert!(host.frame("tr").posts().is_empty());
}

#[tokio::test]
async fn test_url_switch_on_stateful_frame_closes_session_first() {
    let host = Host::new();
    let container = transaction(&host).await;
    let frame = host.frame("tr");
    let navigations_before = frame.navigations().len();

    let settled = container
        .set_new_application_context(ApplicationType::Url, &url("https://portal.example/home"))
        .await
        .unwrap();

    assert!(settled.is_none());
    let posts = frame.posts();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].envelope().unwrap().service, services::CLOSE_SESSION);
    assert_eq!(frame.navigations().len(), navigations_before + 1);
    assert_eq!(container.app_type(), Some(ApplicationType::Url));
    assert!(container.dirty_key().is_none());
}
