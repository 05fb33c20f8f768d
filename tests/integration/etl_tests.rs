use crate::common::{create_test_config, page_body, recording_fetcher, settings_for, TEST_API_KEY};
use pulse_etl::pipeline::{run_etl, Controller, PulseWriter, RecordingPause};
use pulse_etl::storage::{PulseStore, SqliteStorage};
use pulse_etl::StopReason;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_page(server: &MockServer, page: u32, ids: &[&str], has_next: bool) {
    Mock::given(method("GET"))
        .and(path("/pulses/subscribed"))
        .and(query_param("page", page.to_string()))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(page_body(&server.uri(), page, ids, has_next)),
        )
        .mount(server)
        .await;
}

fn storage_in(temp_dir: &TempDir) -> SqliteStorage {
    SqliteStorage::new(&temp_dir.path().join("pulses.db")).expect("Failed to open storage")
}

#[tokio::test]
async fn test_two_pages_with_overlap() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, 1, &["a", "b"], true).await;
    mount_page(&mock_server, 2, &["c", "a"], false).await;

    let temp_dir = TempDir::new().unwrap();
    let (fetcher, pause) = recording_fetcher(settings_for(&mock_server.uri()));
    let mut controller = Controller::new(
        fetcher,
        PulseWriter::new(storage_in(&temp_dir)),
        Arc::new(pause.clone()),
        Duration::from_secs(1),
    );

    let outcome = controller.run().await;

    assert_eq!(outcome.reason, StopReason::EndOfPages);
    assert_eq!(outcome.summary.pages_processed, 2);
    assert_eq!(outcome.summary.records_received, 4);
    assert_eq!(outcome.summary.records_inserted, 3);
    assert_eq!(outcome.summary.records_skipped, 1);
    assert_eq!(pause.pauses(), vec![Duration::from_secs(1)]);

    let store = controller.into_writer().into_store();
    assert_eq!(store.count_pulses().unwrap(), 3);

    let stored = store.get_pulse("a").unwrap().expect("Pulse a missing");
    assert_eq!(stored.name.as_deref(), Some("Pulse a"));
    assert_eq!(stored.tlp.as_deref(), Some("white"));
    assert_eq!(stored.public, Some(true));
    assert_eq!(
        stored.tags,
        Some(vec!["phishing".to_string(), "credential-theft".to_string()])
    );
}

#[tokio::test]
async fn test_empty_first_page_touches_nothing() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, 1, &[], true).await;

    let temp_dir = TempDir::new().unwrap();
    let (fetcher, pause) = recording_fetcher(settings_for(&mock_server.uri()));
    let mut controller = Controller::new(
        fetcher,
        PulseWriter::new(storage_in(&temp_dir)),
        Arc::new(pause.clone()),
        Duration::from_secs(1),
    );

    let outcome = controller.run().await;

    assert_eq!(outcome.reason, StopReason::EmptyPage);
    assert_eq!(outcome.summary.pages_processed, 1);
    assert_eq!(outcome.summary.records_received, 0);
    assert_eq!(outcome.summary.records_inserted, 0);
    assert!(pause.pauses().is_empty());
    assert_eq!(controller.into_writer().into_store().count_pulses().unwrap(), 0);
}

#[tokio::test]
async fn test_failed_second_page_keeps_first_page() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, 1, &["a", "b"], true).await;

    Mock::given(method("GET"))
        .and(path("/pulses/subscribed"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(502))
        .expect(3)
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let (fetcher, pause) = recording_fetcher(settings_for(&mock_server.uri()));
    let mut controller = Controller::new(
        fetcher,
        PulseWriter::new(storage_in(&temp_dir)),
        Arc::new(pause.clone()),
        Duration::from_secs(1),
    );

    let outcome = controller.run().await;

    assert_eq!(outcome.reason, StopReason::FetchFailed);
    assert!(outcome.reason.is_failure());
    assert_eq!(outcome.summary.pages_processed, 1);
    assert_eq!(outcome.summary.records_inserted, 2);
    // Page delay, then two transient waits on page 2
    assert_eq!(
        pause.pauses(),
        vec![
            Duration::from_secs(1),
            Duration::from_secs(3),
            Duration::from_secs(3),
        ]
    );
    assert_eq!(controller.into_writer().into_store().count_pulses().unwrap(), 2);
}

#[tokio::test]
async fn test_run_etl_is_idempotent() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, 1, &["p1", "p2", "p3"], true).await;
    mount_page(&mock_server, 2, &["p4"], false).await;

    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("pulses.db");
    let config = create_test_config(&mock_server.uri(), db_path.to_str().unwrap());

    let first = run_etl(&config, TEST_API_KEY.to_string())
        .await
        .expect("First run failed");
    assert_eq!(first.reason, StopReason::EndOfPages);
    assert_eq!(first.summary.records_inserted, 4);
    assert_eq!(first.summary.records_skipped, 0);

    let second = run_etl(&config, TEST_API_KEY.to_string())
        .await
        .expect("Second run failed");
    assert_eq!(second.reason, StopReason::EndOfPages);
    assert_eq!(second.summary.records_received, 4);
    assert_eq!(second.summary.records_inserted, 0);
    assert_eq!(second.summary.records_skipped, 4);

    let store = SqliteStorage::new(&db_path).unwrap();
    assert_eq!(store.count_pulses().unwrap(), 4);
}

#[tokio::test]
async fn test_records_without_id_are_skipped() {
    let mock_server = MockServer::start().await;
    let body = serde_json::json!({
        "results": [
            { "id": "kept", "name": "Kept" },
            { "name": "No identifier" }
        ],
        "next": null
    });
    Mock::given(method("GET"))
        .and(path("/pulses/subscribed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let (fetcher, _) = recording_fetcher(settings_for(&mock_server.uri()));
    let mut controller = Controller::new(
        fetcher,
        PulseWriter::new(storage_in(&temp_dir)),
        Arc::new(RecordingPause::new()),
        Duration::ZERO,
    );

    let outcome = controller.run().await;

    assert_eq!(outcome.reason, StopReason::EndOfPages);
    assert_eq!(outcome.summary.records_received, 2);
    assert_eq!(outcome.summary.records_inserted, 1);
    assert_eq!(outcome.summary.records_skipped, 1);
}
