use crate::common::{
    closed_port_url, page_body, recording_fetcher, settings_for, KEY_HEADER, TEST_API_KEY,
};
use pulse_etl::pipeline::PageSource;
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_fetch_success_sends_key_and_paging() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/pulses/subscribed"))
        .and(query_param("page", "2"))
        .and(query_param("limit", "50"))
        .and(header(KEY_HEADER, TEST_API_KEY))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(page_body(&base_url, 2, &["a", "b"], true)),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let (fetcher, pause) = recording_fetcher(settings_for(&base_url));
    let page = fetcher.fetch(2).await.expect("Fetch failed");

    assert_eq!(page.len(), 2);
    assert!(page.has_next());
    assert!(pause.pauses().is_empty());
}

#[tokio::test]
async fn test_rate_limit_waits_as_told_and_is_not_counted() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/pulses/subscribed"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "2"))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/pulses/subscribed"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "4"))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/pulses/subscribed"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(page_body(&base_url, 1, &["a"], false)),
        )
        .mount(&mock_server)
        .await;

    // A single counted attempt is enough: rate limits must not spend it
    let mut settings = settings_for(&base_url);
    settings.max_attempts = 1;
    let (fetcher, pause) = recording_fetcher(settings);

    let page = fetcher.fetch(1).await.expect("Fetch failed");

    assert_eq!(page.len(), 1);
    assert_eq!(
        pause.pauses(),
        vec![Duration::from_secs(2), Duration::from_secs(4)]
    );
    assert!(pause.total() >= Duration::from_secs(6));
}

#[tokio::test]
async fn test_rate_limit_without_hint_uses_default_wait() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(page_body(&base_url, 1, &["a"], false)),
        )
        .mount(&mock_server)
        .await;

    let (fetcher, pause) = recording_fetcher(settings_for(&base_url));
    fetcher.fetch(1).await.expect("Fetch failed");

    assert_eq!(pause.pauses(), vec![Duration::from_secs(5)]);
}

#[tokio::test]
async fn test_server_errors_exhaust_budget_after_three_attempts() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/pulses/subscribed"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&mock_server)
        .await;

    let (fetcher, pause) = recording_fetcher(settings_for(&base_url));
    let err = fetcher.fetch(7).await.unwrap_err();

    assert_eq!(err.page, 7);
    assert_eq!(err.attempts, 3);
    assert!(err.last_error.contains("500"));
    // Waits only between attempts
    assert_eq!(
        pause.pauses(),
        vec![Duration::from_secs(3), Duration::from_secs(3)]
    );
}

#[tokio::test]
async fn test_transport_errors_exhaust_budget_after_three_attempts() {
    let (fetcher, pause) = recording_fetcher(settings_for(&closed_port_url()));

    let err = fetcher.fetch(1).await.unwrap_err();

    assert_eq!(err.page, 1);
    assert_eq!(err.attempts, 3);
    assert_eq!(pause.pauses().len(), 2);
}

#[tokio::test]
async fn test_transient_error_then_success() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(page_body(&base_url, 1, &["a", "b", "c"], false)),
        )
        .mount(&mock_server)
        .await;

    let (fetcher, pause) = recording_fetcher(settings_for(&base_url));
    let page = fetcher.fetch(1).await.expect("Fetch failed");

    assert_eq!(page.len(), 3);
    assert_eq!(pause.pauses(), vec![Duration::from_secs(3)]);
}

#[tokio::test]
async fn test_undecodable_body_is_retried() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>upstream hiccup</html>"))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(page_body(&base_url, 1, &["a"], false)),
        )
        .mount(&mock_server)
        .await;

    let (fetcher, pause) = recording_fetcher(settings_for(&base_url));
    let page = fetcher.fetch(1).await.expect("Fetch failed");

    assert_eq!(page.len(), 1);
    assert_eq!(pause.pauses().len(), 1);
}

#[tokio::test]
async fn test_rate_limits_interleaved_with_failures() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    // 500, 429, 500, 429, then success: two counted failures stay within budget
    for status in [500u16, 429, 500, 429] {
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(status).insert_header("Retry-After", "1"))
            .up_to_n_times(1)
            .mount(&mock_server)
            .await;
    }

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(page_body(&base_url, 1, &["a"], false)),
        )
        .mount(&mock_server)
        .await;

    let (fetcher, pause) = recording_fetcher(settings_for(&base_url));
    let page = fetcher.fetch(1).await.expect("Fetch failed");

    assert_eq!(page.len(), 1);
    assert_eq!(
        pause.pauses(),
        vec![
            Duration::from_secs(3),
            Duration::from_secs(1),
            Duration::from_secs(3),
            Duration::from_secs(1),
        ]
    );
}

#[tokio::test]
async fn test_oversized_retry_after_is_capped() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "999999999"))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(page_body(&base_url, 1, &["a"], false)),
        )
        .mount(&mock_server)
        .await;

    let (fetcher, pause) = recording_fetcher(settings_for(&base_url));
    fetcher.fetch(1).await.expect("Fetch failed");

    assert_eq!(pause.pauses(), vec![Duration::from_secs(60)]);
}

#[tokio::test]
async fn test_unbuildable_request_fails_without_retrying() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    // A line break can never appear in a header value
    let mut settings = settings_for(&base_url);
    settings.api_key = "test-key\nInjected: yes".to_string();
    let (fetcher, pause) = recording_fetcher(settings);

    let err = fetcher.fetch(1).await.unwrap_err();

    assert_eq!(err.page, 1);
    assert_eq!(err.attempts, 1);
    assert!(pause.pauses().is_empty());
}

#[tokio::test]
async fn test_unusable_header_name_fails_without_retrying() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut settings = settings_for(&base_url);
    settings.api_key_header = "X OTX KEY".to_string();
    let (fetcher, pause) = recording_fetcher(settings);

    let err = fetcher.fetch(1).await.unwrap_err();

    assert_eq!(err.attempts, 1);
    assert!(pause.pauses().is_empty());
}
