//! HttpFetcher against a local mock server

mod common;

use common::wiremock_helpers::*;
use std::time::Duration;
use urlfeatures::fetch::{FetchError, HttpFetcher, PageFetcher};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fetcher(max_redirects: usize) -> HttpFetcher {
    HttpFetcher::new(Duration::from_secs(5), "urlfeatures-test", max_redirects).unwrap()
}

#[tokio::test]
async fn test_fetch_page_body() {
    let server = mock_page("/index.html", "<html><title>Hi</title></html>").await;
    let url = format!("{}/index.html", server.uri());

    let page = fetcher(10).fetch(&url).await.unwrap();

    assert_eq!(page.status, 200);
    assert_eq!(page.text(), "<html><title>Hi</title></html>");
    assert!(page.history.is_empty());
    assert_eq!(page.final_url, url);
    assert!(!page.is_placeholder());
}

#[tokio::test]
async fn test_latin1_body_decoded_with_declared_charset() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/legacy"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(&b"<p>\xa9 2024 Caf\xe9 Bank</p>"[..], "text/html; charset=ISO-8859-1"),
        )
        .mount(&server)
        .await;

    let page = fetcher(10)
        .fetch(&format!("{}/legacy", server.uri()))
        .await
        .unwrap();

    assert_eq!(page.charset.as_deref(), Some("ISO-8859-1"));
    assert_eq!(page.text(), "<p>© 2024 Café Bank</p>");
}

#[tokio::test]
async fn test_redirect_history_recorded() {
    let server = MockServer::start().await;
    mount_redirect(&server, "/start", "/middle", 302).await;
    mount_redirect(&server, "/middle", &format!("{}/final", server.uri()), 301).await;
    mount_page(&server, "/final", "<html>done</html>").await;

    let page = fetcher(10)
        .fetch(&format!("{}/start", server.uri()))
        .await
        .unwrap();

    assert_eq!(page.status, 200);
    assert_eq!(
        page.history,
        vec![
            format!("{}/start", server.uri()),
            format!("{}/middle", server.uri()),
        ]
    );
    assert_eq!(page.final_url, format!("{}/final", server.uri()));
}

#[tokio::test]
async fn test_too_many_redirects() {
    let server = MockServer::start().await;
    mount_redirect(&server, "/a", "/b", 302).await;
    mount_redirect(&server, "/b", "/c", 302).await;
    mount_page(&server, "/c", "end").await;

    let err = fetcher(1)
        .fetch(&format!("{}/a", server.uri()))
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::TooManyRedirects { limit: 1, .. }));
}

#[tokio::test]
async fn test_error_status_is_returned_not_raised() {
    let server = mock_error_server(404).await;

    let page = fetcher(10)
        .fetch(&format!("{}/missing", server.uri()))
        .await
        .unwrap();

    assert_eq!(page.status, 404);
    assert!(page.is_placeholder());
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    let err = fetcher(10)
        .fetch(&format!("{}/", unreachable_endpoint()))
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Transport { .. }));
}

#[tokio::test]
async fn test_invalid_url() {
    let err = fetcher(10).fetch("not a url").await.unwrap_err();
    assert!(matches!(err, FetchError::InvalidUrl { .. }));
}

#[tokio::test]
async fn test_timeout_is_transport_error() {
    let server = mock_timeout_server(2_000).await;
    let fetcher = HttpFetcher::new(Duration::from_millis(200), "urlfeatures-test", 10).unwrap();

    let err = fetcher.fetch(&server.uri()).await.unwrap_err();
    assert!(matches!(err, FetchError::Transport { .. }));
}
