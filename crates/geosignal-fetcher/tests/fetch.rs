use geosignal_config::PipelineConfig;
use geosignal_fetcher::Fetcher;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(database_url: String) -> PipelineConfig {
    std::env::set_var("DATABASE_URL", &database_url);
    std::env::set_var("FETCH_TIMEOUT_SECONDS", "2");
    std::env::set_var("CIRCUIT_BREAKER_THRESHOLD", "2");
    std::env::set_var("CIRCUIT_BREAKER_COOLDOWN_SECONDS", "300");
    let cfg = PipelineConfig::from_env().unwrap();
    std::env::remove_var("DATABASE_URL");
    std::env::remove_var("FETCH_TIMEOUT_SECONDS");
    std::env::remove_var("CIRCUIT_BREAKER_THRESHOLD");
    std::env::remove_var("CIRCUIT_BREAKER_COOLDOWN_SECONDS");
    cfg
}

#[tokio::test]
async fn successful_fetch_returns_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/article"))
        .respond_with(ResponseTemplate::new(200).set_body_string("hello world"))
        .mount(&server)
        .await;

    let config = test_config("postgres://localhost/test".into());
    let fetcher = Fetcher::new(&config).unwrap();
    let cancel = CancellationToken::new();

    let page = fetcher
        .fetch(&format!("{}/article", server.uri()), &cancel)
        .await
        .unwrap();

    assert_eq!(page.status, 200);
    assert_eq!(page.body, b"hello world");
}

#[tokio::test]
async fn retries_on_503_then_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;

    let config = test_config("postgres://localhost/test".into());
    let fetcher = Fetcher::new(&config).unwrap();
    let cancel = CancellationToken::new();

    let page = fetcher
        .fetch(&format!("{}/flaky", server.uri()), &cancel)
        .await
        .unwrap();

    assert_eq!(page.status, 200);
}

#[tokio::test]
async fn circuit_breaker_blocks_after_repeated_failures() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let config = test_config("postgres://localhost/test".into());
    let fetcher = Fetcher::new(&config).unwrap();
    let cancel = CancellationToken::new();
    let url = format!("{}/down", server.uri());

    // threshold is 2: two failed fetch() calls should open the breaker.
    let _ = fetcher.fetch(&url, &cancel).await;
    let _ = fetcher.fetch(&url, &cancel).await;

    let result = fetcher.fetch(&url, &cancel).await;
    assert!(matches!(
        result,
        Err(geosignal_error::FetchError::DomainBlocked(_))
    ));
}

#[tokio::test]
async fn cancellation_short_circuits_inflight_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let config = test_config("postgres://localhost/test".into());
    let fetcher = Fetcher::new(&config).unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = fetcher
        .fetch(&format!("{}/slow", server.uri()), &cancel)
        .await;
    assert!(matches!(result, Err(geosignal_error::FetchError::Cancelled)));
}
