#![cfg(test)]
use super::util::*;
use super::*;

use httptest::{
    matchers::{all_of, contains, eq, json_decoded, key, matches, not, request},
    responders::{json_encoded, status_code},
    Expectation, Server,
};
use reqwest::{StatusCode, Url};
use serde_json::json;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use uuid::Uuid;

use crate::error::{
    ApiError, FieldError, ACCESS_DENIED_MESSAGE, NETWORK_ERROR_MESSAGE, NOT_FOUND_MESSAGE,
    SERVER_ERROR_MESSAGE, VALIDATION_MESSAGE,
};

fn server_client(server: &Server, store: Arc<MemoryCredentialStore>) -> ApiClient {
    ApiClient::builder(Url::parse(&server.url_str("")).unwrap())
        .credentials(store)
        .build()
}

/// Backoff policy scaled down so retry tests finish quickly. The delay
/// doubling is what the assertions measure, not the absolute values.
fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_network_retries: 3,
        base_delay: Duration::from_millis(25),
    }
}

/// AuthEvents sink that counts invocations.
#[derive(Default)]
struct CountingAuthEvents(AtomicU32);

impl CountingAuthEvents {
    fn count(&self) -> u32 {
        self.0.load(Ordering::SeqCst)
    }
}

impl AuthEvents for CountingAuthEvents {
    fn on_session_expired(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// Raw TCP server that drops the first `failures` connections on accept and
/// serves `body` as an HTTP 200 afterwards. httptest cannot simulate failures
/// below the HTTP layer, so connectivity retries are exercised against this.
async fn flaky_server(failures: u32, body: &'static str) -> (Url, Arc<AtomicU32>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accepts = Arc::new(AtomicU32::new(0));
    let counter = accepts.clone();
    tokio::spawn(async move {
        loop {
            let (mut socket, _) = match listener.accept().await {
                Ok(conn) => conn,
                Err(_) => break,
            };
            let n = counter.fetch_add(1, Ordering::SeqCst);
            if n < failures {
                drop(socket);
                continue;
            }
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
    });
    (Url::parse(&format!("http://{addr}")).unwrap(), accepts)
}

/// Accepts connections and never answers, to provoke the client-side timeout.
async fn black_hole_server() -> (Url, Arc<AtomicU32>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accepts = Arc::new(AtomicU32::new(0));
    let counter = accepts.clone();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            held.push(socket);
        }
    });
    (Url::parse(&format!("http://{addr}")).unwrap(), accepts)
}

#[test]
fn build_url_joins_paths() {
    let base = Url::parse("http://localhost:8080").unwrap();
    assert_eq!(
        build_url(&base, "/api/events").unwrap(),
        Url::parse("http://localhost:8080/api/events").unwrap()
    );

    let base_with_path = Url::parse("http://example.com/base/").unwrap();
    assert_eq!(
        build_url(&base_with_path, "path").unwrap(),
        Url::parse("http://example.com/base/path").unwrap()
    );
}

#[test]
fn build_url_rejects_invalid_path() {
    let base = Url::parse("http://localhost:8080").unwrap();
    match build_url(&base, "ftp:") {
        Err(ApiError::UrlParse(_)) => {}
        other => panic!("expected UrlParse error, got {:?}", other),
    }
}

// --- Token attachment ---

#[tokio::test]
async fn attaches_stored_bearer_token() {
    let server = Server::run();
    let store = Arc::new(MemoryCredentialStore::with_tokens("access-1", None));
    let client = server_client(&server, store);

    server.expect(
        Expectation::matching(all_of![
            request::method_path("GET", "/api/events"),
            request::headers(contains(("authorization", "Bearer access-1"))),
        ])
        .respond_with(json_encoded(json!({ "success": true, "data": [] }))),
    );

    let events = client.get_events(&EventQuery::default()).await.unwrap();
    assert!(events.is_empty());
}

#[tokio::test]
async fn sends_no_authorization_header_when_logged_out() {
    let server = Server::run();
    let store = Arc::new(MemoryCredentialStore::new());
    let client = server_client(&server, store);

    server.expect(
        Expectation::matching(all_of![
            request::method_path("GET", "/api/events"),
            request::headers(not(contains(key("authorization")))),
        ])
        .respond_with(json_encoded(json!({ "success": true, "data": [] }))),
    );

    let events = client.get_events(&EventQuery::default()).await.unwrap();
    assert!(events.is_empty());
}

#[tokio::test]
async fn store_failure_rejects_before_any_request() {
    let server = Server::run();

    /// Store whose reads always fail, as if the backing file were gone.
    struct FailingStore;

    impl CredentialStore for FailingStore {
        fn access_token(&self) -> Result<Option<String>, StoreError> {
            Err(StoreError::new("store offline"))
        }
        fn set_access_token(&self, _token: &str) -> Result<(), StoreError> {
            Ok(())
        }
        fn refresh_token(&self) -> Result<Option<String>, StoreError> {
            Err(StoreError::new("store offline"))
        }
        fn set_refresh_token(&self, _token: &str) -> Result<(), StoreError> {
            Ok(())
        }
        fn clear(&self) -> Result<(), StoreError> {
            Ok(())
        }
    }

    // No expectations: any request reaching the mock server fails the test
    // when it verifies on drop.
    let client = ApiClient::builder(Url::parse(&server.url_str("")).unwrap())
        .credentials(Arc::new(FailingStore))
        .build();

    let err = client.get_events(&EventQuery::default()).await.unwrap_err();
    match err {
        ApiError::CredentialStore(message) => assert!(message.contains("store offline")),
        other => panic!("expected CredentialStore error, got {:?}", other),
    }
}

// --- 401 refresh-and-retry ---

#[tokio::test]
async fn refreshes_once_and_replays_after_401() {
    let server = Server::run();
    let store = Arc::new(MemoryCredentialStore::with_tokens("stale", Some("refresh-1")));
    let client = server_client(&server, store.clone());
    let club_id = Uuid::new_v4();
    let path_pattern = format!("^/api/clubs/{club_id}$");

    server.expect(
        Expectation::matching(all_of![
            request::method("GET"),
            request::path(matches(path_pattern.clone())),
            request::headers(contains(("authorization", "Bearer stale"))),
        ])
        .times(1)
        .respond_with(status_code(401)),
    );
    server.expect(
        Expectation::matching(all_of![
            request::method_path("POST", "/api/auth/refresh"),
            request::body(json_decoded(eq(json!({ "refreshToken": "refresh-1" })))),
        ])
        .times(1)
        .respond_with(json_encoded(json!({
            "token": "fresh",
            "refreshToken": "refresh-2"
        }))),
    );
    server.expect(
        Expectation::matching(all_of![
            request::method("GET"),
            request::path(matches(path_pattern)),
            request::headers(contains(("authorization", "Bearer fresh"))),
        ])
        .times(1)
        .respond_with(json_encoded(json!({
            "success": true,
            "data": { "id": club_id, "name": "Chess Club" }
        }))),
    );

    let club = client.get_club(club_id).await.unwrap();
    assert_eq!(club.name, "Chess Club");
    assert_eq!(store.access_token().unwrap().as_deref(), Some("fresh"));
    assert_eq!(store.refresh_token().unwrap().as_deref(), Some("refresh-2"));
}

#[tokio::test]
async fn refresh_keeps_old_refresh_token_when_not_rotated() {
    let server = Server::run();
    let store = Arc::new(MemoryCredentialStore::with_tokens("stale", Some("refresh-1")));
    let client = server_client(&server, store.clone());

    server.expect(
        Expectation::matching(all_of![
            request::method_path("GET", "/api/users/profile"),
            request::headers(contains(("authorization", "Bearer stale"))),
        ])
        .times(1)
        .respond_with(status_code(401)),
    );
    server.expect(
        Expectation::matching(request::method_path("POST", "/api/auth/refresh"))
            .times(1)
            .respond_with(json_encoded(json!({ "token": "fresh" }))),
    );
    server.expect(
        Expectation::matching(all_of![
            request::method_path("GET", "/api/users/profile"),
            request::headers(contains(("authorization", "Bearer fresh"))),
        ])
        .times(1)
        .respond_with(json_encoded(json!({
            "success": true,
            "data": { "id": Uuid::new_v4(), "username": "alice", "email": "a@example.edu" }
        }))),
    );

    let user = client.get_profile().await.unwrap();
    assert_eq!(user.username, "alice");
    assert_eq!(store.refresh_token().unwrap().as_deref(), Some("refresh-1"));
}

#[tokio::test]
async fn second_401_rejects_without_clearing_session() {
    let server = Server::run();
    let store = Arc::new(MemoryCredentialStore::with_tokens("stale", Some("refresh-1")));
    let events = Arc::new(CountingAuthEvents::default());
    let client = ApiClient::builder(Url::parse(&server.url_str("")).unwrap())
        .credentials(store.clone())
        .auth_events(events.clone())
        .build();

    server.expect(
        Expectation::matching(all_of![
            request::method_path("GET", "/api/users/profile"),
            request::headers(contains(("authorization", "Bearer stale"))),
        ])
        .times(1)
        .respond_with(status_code(401)),
    );
    server.expect(
        Expectation::matching(request::method_path("POST", "/api/auth/refresh"))
            .times(1)
            .respond_with(json_encoded(json!({ "token": "fresh" }))),
    );
    // The replay is rejected too. No second refresh may happen; the call
    // fails with the raw status and the session stays intact.
    server.expect(
        Expectation::matching(all_of![
            request::method_path("GET", "/api/users/profile"),
            request::headers(contains(("authorization", "Bearer fresh"))),
        ])
        .times(1)
        .respond_with(status_code(401)),
    );

    let err = client.get_profile().await.unwrap_err();
    match err {
        ApiError::Status {
            status,
            user_message,
            ..
        } => {
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(user_message, None);
        }
        other => panic!("expected Status error, got {:?}", other),
    }
    assert_eq!(store.access_token().unwrap().as_deref(), Some("fresh"));
    assert_eq!(events.count(), 0);
}

#[tokio::test]
async fn missing_refresh_token_skips_refresh() {
    let server = Server::run();
    let store = Arc::new(MemoryCredentialStore::with_tokens("stale", None));
    let client = server_client(&server, store);

    // Exactly one request; a refresh call would trip the mock server's
    // unexpected-request check.
    server.expect(
        Expectation::matching(request::method_path("GET", "/api/users/profile"))
            .times(1)
            .respond_with(status_code(401)),
    );

    let err = client.get_profile().await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
}

#[tokio::test]
async fn failed_refresh_clears_session_and_fires_expiry_once() {
    let server = Server::run();
    let store = Arc::new(MemoryCredentialStore::with_tokens("stale", Some("refresh-1")));
    let events = Arc::new(CountingAuthEvents::default());
    let client = ApiClient::builder(Url::parse(&server.url_str("")).unwrap())
        .credentials(store.clone())
        .auth_events(events.clone())
        .build();

    server.expect(
        Expectation::matching(request::method_path("GET", "/api/users/profile"))
            .times(1)
            .respond_with(status_code(401)),
    );
    server.expect(
        Expectation::matching(request::method_path("POST", "/api/auth/refresh"))
            .times(1)
            .respond_with(status_code(401).body(json!({ "message": "expired" }).to_string())),
    );

    let err = client.get_profile().await.unwrap_err();
    match err {
        ApiError::RefreshFailed(inner) => {
            assert_eq!(inner.status(), Some(StatusCode::UNAUTHORIZED));
        }
        other => panic!("expected RefreshFailed, got {:?}", other),
    }
    assert_eq!(store.access_token().unwrap(), None);
    assert_eq!(store.refresh_token().unwrap(), None);
    assert_eq!(events.count(), 1);
}

// --- Status classification ---

#[tokio::test]
async fn annotates_recognized_statuses_with_fixed_messages() {
    let cases = [
        (403, ACCESS_DENIED_MESSAGE),
        (404, NOT_FOUND_MESSAGE),
        (500, SERVER_ERROR_MESSAGE),
    ];
    for (code, expected) in cases {
        let server = Server::run();
        let client = server_client(&server, Arc::new(MemoryCredentialStore::new()));

        server.expect(
            Expectation::matching(request::method_path("GET", "/api/trending"))
                .times(1)
                .respond_with(
                    status_code(code).body(json!({ "message": "backend detail" }).to_string()),
                ),
        );

        let err = client.get_trending().await.unwrap_err();
        match err {
            ApiError::Status {
                status,
                message,
                user_message,
            } => {
                assert_eq!(status.as_u16(), code);
                assert_eq!(message, "backend detail");
                assert_eq!(user_message, Some(expected));
            }
            other => panic!("expected Status error for {code}, got {:?}", other),
        }
    }
}

#[tokio::test]
async fn preserves_field_errors_from_validation_response() {
    let server = Server::run();
    let client = server_client(&server, Arc::new(MemoryCredentialStore::new()));

    server.expect(
        Expectation::matching(request::method_path("POST", "/api/events"))
            .times(1)
            .respond_with(status_code(400).body(
                json!({
                    "message": "Validation failed",
                    "errors": [
                        { "field": "title", "message": "Title is required" },
                        { "param": "startTime", "msg": "Must be in the future" }
                    ]
                })
                .to_string(),
            )),
    );

    let payload = CreateEventPayload {
        title: String::new(),
        description: None,
        location: None,
        category: None,
        club_id: None,
        start_time: chrono::Utc::now(),
        end_time: None,
    };
    let err = client.create_event(&payload).await.unwrap_err();

    assert_eq!(err.user_message(), Some(VALIDATION_MESSAGE));
    assert_eq!(
        err.validation_errors(),
        Some(
            &[
                FieldError {
                    field: Some("title".into()),
                    message: "Title is required".into(),
                },
                FieldError {
                    field: Some("startTime".into()),
                    message: "Must be in the future".into(),
                },
            ][..]
        )
    );
}

#[tokio::test]
async fn bad_request_without_field_errors_is_not_annotated() {
    let server = Server::run();
    let client = server_client(&server, Arc::new(MemoryCredentialStore::new()));

    server.expect(
        Expectation::matching(request::method_path("GET", "/api/trending"))
            .times(1)
            .respond_with(status_code(400).body(json!({ "message": "malformed" }).to_string())),
    );

    let err = client.get_trending().await.unwrap_err();
    match err {
        ApiError::Status {
            status,
            message,
            user_message,
        } => {
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(message, "malformed");
            assert_eq!(user_message, None);
        }
        other => panic!("expected Status error, got {:?}", other),
    }
}

// --- Network retry with backoff ---

#[tokio::test]
async fn retries_connectivity_failures_with_exponential_backoff() {
    let (url, accepts) = flaky_server(3, r#"{"success":true,"data":[]}"#).await;
    let client = ApiClient::builder(url).retry(fast_retry()).build();

    let started = Instant::now();
    let events = client.get_events(&EventQuery::default()).await.unwrap();
    let elapsed = started.elapsed();

    assert!(events.is_empty());
    assert_eq!(accepts.load(Ordering::SeqCst), 4);
    // Delays of 25ms, 50ms and 100ms must have been slept through.
    assert!(
        elapsed >= Duration::from_millis(175),
        "elapsed only {elapsed:?}"
    );
}

#[tokio::test]
async fn gives_up_after_exhausting_network_retries() {
    let (url, accepts) = flaky_server(u32::MAX, "").await;
    let client = ApiClient::builder(url).retry(fast_retry()).build();

    let err = client.get_events(&EventQuery::default()).await.unwrap_err();
    match err {
        ApiError::NetworkExhausted {
            attempts,
            user_message,
            ..
        } => {
            assert_eq!(attempts, 4);
            assert_eq!(user_message, NETWORK_ERROR_MESSAGE);
        }
        other => panic!("expected NetworkExhausted, got {:?}", other),
    }
    assert_eq!(accepts.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn client_timeout_is_not_retried() {
    let (url, accepts) = black_hole_server().await;
    let http = reqwest::Client::builder()
        .timeout(Duration::from_millis(100))
        .build()
        .unwrap();
    let client = ApiClient::builder(url)
        .http(http)
        .retry(fast_retry())
        .build();

    let err = client.get_events(&EventQuery::default()).await.unwrap_err();
    match err {
        ApiError::Transport(inner) => assert!(inner.is_timeout()),
        other => panic!("expected Transport timeout, got {:?}", other),
    }
    assert_eq!(accepts.load(Ordering::SeqCst), 1);
}

// --- Session lifecycle ---

#[tokio::test]
async fn login_stores_returned_token_pair() {
    let server = Server::run();
    let store = Arc::new(MemoryCredentialStore::new());
    let client = server_client(&server, store.clone());
    let user_id = Uuid::new_v4();

    server.expect(
        Expectation::matching(all_of![
            request::method_path("POST", "/api/auth/login"),
            request::body(json_decoded(eq(json!({
                "email": "alice@example.edu",
                "password": "hunter2hunter2"
            })))),
        ])
        .respond_with(json_encoded(json!({
            "token": "access-1",
            "refreshToken": "refresh-1",
            "user": { "id": user_id, "username": "alice", "email": "alice@example.edu" }
        }))),
    );

    let user = client
        .login(&LoginPayload {
            email: "alice@example.edu".into(),
            password: secrecy::SecretString::new("hunter2hunter2".to_string().into_boxed_str()),
        })
        .await
        .unwrap();

    assert_eq!(user.id, user_id);
    assert_eq!(store.access_token().unwrap().as_deref(), Some("access-1"));
    assert_eq!(store.refresh_token().unwrap().as_deref(), Some("refresh-1"));
}

#[tokio::test]
async fn logout_clears_tokens_even_when_server_fails() {
    let server = Server::run();
    let store = Arc::new(MemoryCredentialStore::with_tokens("access-1", Some("refresh-1")));
    let client = server_client(&server, store.clone());

    server.expect(
        Expectation::matching(request::method_path("POST", "/api/auth/logout"))
            .times(1)
            .respond_with(status_code(500).body(json!({ "message": "boom" }).to_string())),
    );

    let err = client.logout().await.unwrap_err();
    assert_eq!(err.user_message(), Some(SERVER_ERROR_MESSAGE));
    assert_eq!(store.access_token().unwrap(), None);
    assert_eq!(store.refresh_token().unwrap(), None);
}
