//! Registry client tests against a stub registry
//!
//! Each test spins up a small axum app on an ephemeral port and points the
//! client at it, so retry counts and pagination are observed end to end.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use packwatch_registry::{BackoffPolicy, ListQuery, RegistryClient, RegistryConfig, RegistryError};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

async fn spawn_registry(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn client_for(base_url: &str) -> RegistryClient {
    let mut config = RegistryConfig::new(base_url);
    config.retry = BackoffPolicy {
        max_attempts: 3,
        base_delay_ms: 10,
    };
    RegistryClient::new(&config).unwrap()
}

fn server_json(name: &str, version: &str, status: &str) -> Value {
    json!({
        "name": name,
        "version": version,
        "status": status,
        "packages": [{
            "registry_type": "npm",
            "identifier": name,
            "version": version,
            "transport": { "type": "stdio" }
        }]
    })
}

#[tokio::test]
async fn test_retries_server_errors_until_success() {
    let hits = Arc::new(AtomicUsize::new(0));
    let app = Router::new()
        .route(
            "/v0/servers",
            get(|State(hits): State<Arc<AtomicUsize>>| async move {
                if hits.fetch_add(1, Ordering::SeqCst) < 2 {
                    StatusCode::INTERNAL_SERVER_ERROR.into_response()
                } else {
                    Json(json!({
                        "servers": [server_json("acme/widget", "1.0.0", "active")],
                        "metadata": { "count": 1 }
                    }))
                    .into_response()
                }
            }),
        )
        .with_state(hits.clone());

    let base_url = spawn_registry(app).await;
    let client = client_for(&base_url);
    let cancel = CancellationToken::new();

    let page = client
        .list_servers(&cancel, &ListQuery::default())
        .await
        .unwrap();

    assert_eq!(page.servers.len(), 1);
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_retries_exhaust_after_attempt_cap() {
    let hits = Arc::new(AtomicUsize::new(0));
    let app = Router::new()
        .route(
            "/v0/servers",
            get(|State(hits): State<Arc<AtomicUsize>>| async move {
                hits.fetch_add(1, Ordering::SeqCst);
                StatusCode::SERVICE_UNAVAILABLE.into_response()
            }),
        )
        .with_state(hits.clone());

    let base_url = spawn_registry(app).await;
    let client = client_for(&base_url);
    let cancel = CancellationToken::new();

    let err = client
        .list_servers(&cancel, &ListQuery::default())
        .await
        .unwrap_err();

    match err {
        RegistryError::Exhausted { attempts, source } => {
            assert_eq!(attempts, 3);
            assert!(matches!(*source, RegistryError::Server { status: 503, .. }));
        }
        other => panic!("expected Exhausted, got {other:?}"),
    }
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_client_errors_are_never_retried() {
    let hits = Arc::new(AtomicUsize::new(0));
    let app = Router::new()
        .route(
            "/v0/servers",
            get(|State(hits): State<Arc<AtomicUsize>>| async move {
                hits.fetch_add(1, Ordering::SeqCst);
                (StatusCode::BAD_REQUEST, "limit out of range").into_response()
            }),
        )
        .with_state(hits.clone());

    let base_url = spawn_registry(app).await;
    let client = client_for(&base_url);
    let cancel = CancellationToken::new();

    let err = client
        .list_servers(&cancel, &ListQuery::default())
        .await
        .unwrap_err();

    match err {
        RegistryError::Client { status, body } => {
            assert_eq!(status, 400);
            assert_eq!(body, "limit out of range");
        }
        other => panic!("expected Client, got {other:?}"),
    }
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_get_server_maps_404_to_not_found() {
    let hits = Arc::new(AtomicUsize::new(0));
    let app = Router::new()
        .route(
            "/v0/servers/:id",
            get(
                |State(hits): State<Arc<AtomicUsize>>, Path(_id): Path<String>| async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    StatusCode::NOT_FOUND.into_response()
                },
            ),
        )
        .with_state(hits.clone());

    let base_url = spawn_registry(app).await;
    let client = client_for(&base_url);
    let cancel = CancellationToken::new();

    let err = client.get_server(&cancel, "missing-id").await.unwrap_err();

    assert!(matches!(err, RegistryError::NotFound { id } if id == "missing-id"));
    // 404 is a client error: exactly one request, no retries
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_list_all_servers_follows_cursor() {
    async fn paged(Query(params): Query<HashMap<String, String>>) -> Response {
        match params.get("cursor").map(String::as_str) {
            None => Json(json!({
                "servers": [server_json("acme/widget", "1.0.0", "active")],
                "metadata": { "count": 2, "next_cursor": "page-2" }
            }))
            .into_response(),
            Some("page-2") => Json(json!({
                "servers": [server_json("acme/gadget", "2.0.0", "active")],
                "metadata": { "count": 2 }
            }))
            .into_response(),
            Some(other) => panic!("unexpected cursor {other}"),
        }
    }

    let app = Router::new().route("/v0/servers", get(paged));
    let base_url = spawn_registry(app).await;
    let client = client_for(&base_url);
    let cancel = CancellationToken::new();

    let servers = client
        .list_all_servers(&cancel, &ListQuery::default())
        .await
        .unwrap();

    let names: Vec<_> = servers.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["acme/widget", "acme/gadget"]);
}

#[tokio::test]
async fn test_latest_active_prefers_highest_active_semver() {
    // 2.0.0 exists but is deprecated; the highest *active* version wins
    let app = Router::new().route(
        "/v0/servers",
        get(|| async {
            Json(json!({
                "servers": [
                    server_json("acme/widget", "1.0.0", "active"),
                    server_json("acme/widget", "1.5.0", "active"),
                    server_json("acme/widget", "2.0.0", "deprecated"),
                    server_json("acme/widget", "not-a-version", "active"),
                    server_json("acme/widget-pro", "9.9.9", "active"),
                ],
                "metadata": { "count": 5 }
            }))
        }),
    );

    let base_url = spawn_registry(app).await;
    let client = client_for(&base_url);
    let cancel = CancellationToken::new();

    let record = client.latest_active(&cancel, "acme/widget").await.unwrap();

    assert_eq!(record.name, "acme/widget");
    assert_eq!(record.version, "1.5.0");
}

#[tokio::test]
async fn test_latest_active_errors_without_parseable_active_version() {
    let app = Router::new().route(
        "/v0/servers",
        get(|| async {
            Json(json!({
                "servers": [
                    server_json("acme/widget", "not-a-version", "active"),
                    server_json("acme/widget", "2.0.0", "deprecated"),
                ],
                "metadata": { "count": 2 }
            }))
        }),
    );

    let base_url = spawn_registry(app).await;
    let client = client_for(&base_url);
    let cancel = CancellationToken::new();

    let err = client
        .latest_active(&cancel, "acme/widget")
        .await
        .unwrap_err();

    assert!(matches!(err, RegistryError::NoActiveVersion { name } if name == "acme/widget"));
}

#[tokio::test]
async fn test_cancellation_aborts_backoff_immediately() {
    let app = Router::new().route(
        "/v0/servers",
        get(|| async { StatusCode::INTERNAL_SERVER_ERROR.into_response() }),
    );

    let base_url = spawn_registry(app).await;
    let mut config = RegistryConfig::new(base_url.as_str());
    config.retry = BackoffPolicy {
        max_attempts: 3,
        base_delay_ms: 30_000,
    };
    let client = RegistryClient::new(&config).unwrap();

    let cancel = CancellationToken::new();
    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });

    let started = Instant::now();
    let err = client
        .list_servers(&cancel, &ListQuery::default())
        .await
        .unwrap_err();

    assert!(matches!(err, RegistryError::Cancelled));
    // the 30s backoff was not slept out
    assert!(started.elapsed() < Duration::from_secs(5));
}
