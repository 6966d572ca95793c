use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Serves `html` at `url_path`.
pub async fn mock_page(url_path: &str, html: &str) -> MockServer {
    let server = MockServer::start().await;
    mount_page(&server, url_path, html).await;
    server
}

pub async fn mount_page(server: &MockServer, url_path: &str, html: &str) {
    Mock::given(method("GET"))
        .and(path(url_path))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(html.to_string())
                .insert_header("content-type", "text/html; charset=utf-8"),
        )
        .mount(server)
        .await;
}

/// `from` answers with `status` and a Location header pointing at `to`.
pub async fn mount_redirect(server: &MockServer, from: &str, to: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(from))
        .respond_with(ResponseTemplate::new(status).insert_header("location", to))
        .mount(server)
        .await;
}

/// Delays every response by `delay_ms` milliseconds.
pub async fn mock_timeout_server(delay_ms: u64) -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("delayed response")
                .set_delay(Duration::from_millis(delay_ms)),
        )
        .mount(&server)
        .await;

    server
}

/// Returns `status_code` for every request.
pub async fn mock_error_server(status_code: u16) -> MockServer {
    let server = MockServer::start().await;

    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(status_code))
        .mount(&server)
        .await;

    server
}

/// A base URL nothing listens on
pub fn unreachable_endpoint() -> String {
    "http://127.0.0.1:9".to_string()
}
