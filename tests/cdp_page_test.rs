//! CDP page integration tests
//!
//! Drive the WebSocket connection, the CDP client and the page context over a
//! real socket against the mock DevTools server.

mod mock_chrome;

use mock_chrome::MockChromeServer;
use profile_oxide::cdp::{CdpClient, CdpClientImpl, CdpConnection, CdpWebSocketConnection, EvaluationResult};
use profile_oxide::extract::{IdentityExtractor, ProfileSection, SectionExtractor};
use profile_oxide::session::{Locator, PageContext, PageContextImpl};
use profile_oxide::Error;
use std::sync::Arc;

const PAGE: &str = r#"<html><head><title>Jane Doe | LinkedIn</title></head><body><main>
<section class="pv-top-card"><h1 class="text-heading-xlarge">Jane Doe</h1>
<div class="text-body-medium">Engineer</div></section></main></body></html>"#;

async fn page(server: &MockChromeServer) -> PageContextImpl {
    let connection = CdpWebSocketConnection::connect(server.ws_endpoint()).await.unwrap();
    PageContextImpl::new(Arc::new(CdpClientImpl::new(connection)))
}

#[tokio::test]
async fn test_commands_round_trip_over_websocket() {
    let server = MockChromeServer::start(PAGE).await.unwrap();
    let connection = CdpWebSocketConnection::connect(server.ws_endpoint()).await.unwrap();
    let client = CdpClientImpl::new(connection.clone());

    client.enable_domain("Page").await.unwrap();
    client.enable_domain("Runtime").await.unwrap();
    assert_eq!(client.add_init_script("void 0").await.unwrap(), "1");

    let result = client.evaluate("location.href", false).await.unwrap();
    assert_eq!(result, EvaluationResult::String("about:blank".into()));

    connection.close().await.unwrap();
    assert!(!connection.is_active());
    assert!(client.enable_domain("Page").await.is_err());
}

#[tokio::test]
async fn test_protocol_errors_surface_as_cdp_errors() {
    let server = MockChromeServer::start(PAGE).await.unwrap();
    let connection = CdpWebSocketConnection::connect(server.ws_endpoint()).await.unwrap();

    let err = connection
        .send_command("Emulation.setNothing", serde_json::json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Cdp(_)));
    assert!(err.to_string().contains("wasn't found"));
}

#[tokio::test]
async fn test_page_context_reads_navigated_document() {
    let server = MockChromeServer::start(PAGE).await.unwrap();
    let page = page(&server).await;

    page.navigate("https://www.linkedin.com/in/jdoe/").await.unwrap();
    assert_eq!(page.current_url().await.unwrap(), "https://www.linkedin.com/in/jdoe/");

    let probe = page.probe(&[Locator::css("main")]).await.unwrap();
    assert!(probe.is_complete());
    assert!(probe.landmark_present);
    assert_eq!(probe.url, "https://www.linkedin.com/in/jdoe/");

    let html = page.content().await.unwrap();
    let ProfileSection::Identity(identity) = IdentityExtractor.extract_html(&html).unwrap() else {
        panic!("identity extractor returned another section");
    };
    assert_eq!(identity.name, "Jane Doe");
    assert_eq!(identity.headline.as_deref(), Some("Engineer"));
}

#[tokio::test]
async fn test_page_interactions_map_script_results() {
    let server = MockChromeServer::start(PAGE).await.unwrap();
    let page = page(&server).await;

    assert!(page.click(&Locator::css("button")).await.unwrap());
    assert_eq!(page.click_all(&Locator::css("button.more")).await.unwrap(), 2);
    assert!(page.scroll_into_view(&Locator::css("#experience")).await.unwrap());
}

#[tokio::test]
async fn test_navigation_error_text_fails_navigate() {
    let server = MockChromeServer::start(PAGE).await.unwrap();
    let page = page(&server).await;

    let err = page.navigate("https://unreachable.test/").await.unwrap_err();
    assert!(err.to_string().contains("ERR_NAME_NOT_RESOLVED"));
}

#[tokio::test]
async fn test_closed_page_stops_talking_to_browser() {
    let server = MockChromeServer::start(PAGE).await.unwrap();
    let page = page(&server).await;

    page.close().await.unwrap();
    assert!(!page.is_active());
    assert!(matches!(page.current_url().await, Err(Error::PageClosed(_))));
}
