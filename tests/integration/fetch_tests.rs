use bookshelf_etl::config::{FetchConfig, UserAgentConfig};
use bookshelf_etl::crawler::{build_http_client, fetch_with_retry, FetchPolicy, FetchResult};
use std::time::{Duration, Instant};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client() -> reqwest::Client {
    build_http_client(&UserAgentConfig::default(), &FetchConfig::default())
        .expect("Failed to build client")
}

fn fast_policy(max_attempts: u32) -> FetchPolicy {
    FetchPolicy {
        max_attempts,
        rate_limit_backoff: Duration::ZERO,
        status_retry_delay: Duration::ZERO,
        network_retry_delay: Duration::ZERO,
    }
}

#[tokio::test]
async fn test_ok_returns_on_first_attempt() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/book"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let url = format!("{}/book", mock_server.uri());
    let result = fetch_with_retry(&client(), &url, &fast_policy(5))
        .await
        .expect("Fetch failed");

    assert_eq!(result.status_code(), Some(200));
    assert_eq!(result.attempts(), 1);
    assert_eq!(result.ok_body(), Some("<html>ok</html>"));
}

#[tokio::test]
async fn test_rate_limited_retries_until_cap_and_returns_last_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/busy"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .expect(5)
        .mount(&mock_server)
        .await;

    let policy = FetchPolicy {
        rate_limit_backoff: Duration::from_millis(20),
        ..fast_policy(5)
    };

    let url = format!("{}/busy", mock_server.uri());
    let started = Instant::now();
    let result = fetch_with_retry(&client(), &url, &policy)
        .await
        .expect("Fetch failed");

    // Four pauses between five attempts
    assert!(started.elapsed() >= Duration::from_millis(80));
    assert_eq!(result.status_code(), Some(429));
    assert_eq!(result.attempts(), 5);
    assert_eq!(result.ok_body(), None);
}

#[tokio::test]
async fn test_rate_limit_shares_the_attempt_budget() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/busy"))
        .respond_with(ResponseTemplate::new(429))
        .expect(2)
        .mount(&mock_server)
        .await;

    let url = format!("{}/busy", mock_server.uri());
    let result = fetch_with_retry(&client(), &url, &fast_policy(2))
        .await
        .expect("Fetch failed");

    assert_eq!(result.status_code(), Some(429));
    assert_eq!(result.attempts(), 2);
}

#[tokio::test]
async fn test_server_error_then_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_string("recovered"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let url = format!("{}/flaky", mock_server.uri());
    let result = fetch_with_retry(&client(), &url, &fast_policy(5))
        .await
        .expect("Fetch failed");

    assert_eq!(result.status_code(), Some(200));
    assert_eq!(result.attempts(), 3);
    assert_eq!(result.ok_body(), Some("recovered"));
}

#[tokio::test]
async fn test_not_found_exhausts_and_returns_last_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not here"))
        .expect(5)
        .mount(&mock_server)
        .await;

    let url = format!("{}/missing", mock_server.uri());
    let result = fetch_with_retry(&client(), &url, &fast_policy(5))
        .await
        .expect("Fetch failed");

    match result {
        FetchResult::Response {
            status_code,
            body,
            attempts,
            ..
        } => {
            assert_eq!(status_code, 404);
            assert_eq!(body, "not here");
            assert_eq!(attempts, 5);
        }
        other => panic!("expected a response, got {:?}", other),
    }
}

#[tokio::test]
async fn test_connection_refused_is_exhausted() {
    // Reserve a port, then close it so nothing is listening
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("Failed to bind");
    let port = listener.local_addr().expect("No local addr").port();
    drop(listener);

    let url = format!("http://127.0.0.1:{}/book", port);
    let result = fetch_with_retry(&client(), &url, &fast_policy(3))
        .await
        .expect("Fetch failed");

    match result {
        FetchResult::Exhausted { attempts, .. } => assert_eq!(attempts, 3),
        other => panic!("expected exhaustion, got {:?}", other),
    }
}

#[tokio::test]
async fn test_timeout_is_retried_until_exhausted() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("too late")
                .set_delay(Duration::from_secs(3)),
        )
        .expect(2)
        .mount(&mock_server)
        .await;

    let fetch = FetchConfig {
        timeout_secs: 1,
        connect_timeout_secs: 1,
        ..FetchConfig::default()
    };
    let client =
        build_http_client(&UserAgentConfig::default(), &fetch).expect("Failed to build client");

    let url = format!("{}/slow", mock_server.uri());
    let result = fetch_with_retry(&client, &url, &fast_policy(2))
        .await
        .expect("Fetch failed");

    match result {
        FetchResult::Exhausted { attempts, .. } => assert_eq!(attempts, 2),
        other => panic!("expected exhaustion, got {:?}", other),
    }
}
