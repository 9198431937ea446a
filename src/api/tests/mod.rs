use super::*;
use crate::test_helpers::{create_test_tracker, test_config};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use std::time::Duration;
use tempfile::tempdir;
use tower::ServiceExt;
use wiremock::MockServer;

mod files;

/// Helper to create a router over a tracker whose upstreams point at `server`
async fn create_test_app(
    server: &MockServer,
    api_key: Option<&str>,
) -> (Router, Arc<DebridTracker>, tempfile::TempDir) {
    let (tracker, temp_dir) = create_test_tracker(&server.uri(), api_key).await;
    let tracker = Arc::new(tracker);
    let app = create_router(tracker.clone(), tracker.config.clone());
    (app, tracker, temp_dir)
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let server = MockServer::start().await;
    let (app, _tracker, _dir) = create_test_app(&server, None).await;

    let response = app.oneshot(get("/api/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_openapi_endpoint_lists_routes() {
    let server = MockServer::start().await;
    let (app, _tracker, _dir) = create_test_app(&server, None).await;

    let response = app.oneshot(get("/api/openapi.json")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let paths = body["paths"].as_object().unwrap();
    assert!(paths.contains_key("/api/torrents/recent"));
    assert!(paths.contains_key("/api/torrents/{id}/stream/{file_path}"));
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let server = MockServer::start().await;
    let (app, _tracker, _dir) = create_test_app(&server, None).await;

    let response = app.oneshot(get("/api/nope")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cors_enabled() {
    let server = MockServer::start().await;
    let (tracker, _dir) = create_test_tracker(&server.uri(), None).await;
    let tracker = Arc::new(tracker);

    let mut config = (*tracker.config).clone();
    config.server.api.cors_enabled = true;
    config.server.api.cors_origins = vec!["*".to_string()];
    let app = create_router(tracker, Arc::new(config));

    let request = Request::builder()
        .uri("/api/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .contains_key("access-control-allow-origin"),
        "CORS header should be present when CORS is enabled"
    );
}

#[tokio::test]
async fn test_cors_specific_origin() {
    let server = MockServer::start().await;
    let (tracker, _dir) = create_test_tracker(&server.uri(), None).await;
    let tracker = Arc::new(tracker);

    let mut config = (*tracker.config).clone();
    config.server.api.cors_enabled = true;
    config.server.api.cors_origins = vec!["http://dashboard.local".to_string()];
    let app = create_router(tracker, Arc::new(config));

    let request = Request::builder()
        .uri("/api/health")
        .header("Origin", "http://dashboard.local")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(
        response.headers()["access-control-allow-origin"],
        "http://dashboard.local"
    );
}

#[tokio::test]
async fn test_api_server_stops_on_cancel() {
    let server = MockServer::start().await;
    let temp_dir = tempdir().unwrap();
    let mut config = test_config(temp_dir.path(), &server.uri(), None);
    // Port 0 = OS assigns a free port
    config.server.api.bind_address = "127.0.0.1:0".parse().unwrap();
    let tracker = Arc::new(DebridTracker::new(config).await.unwrap());

    let token = CancellationToken::new();
    let handle = tokio::spawn(start_api_server(tracker, token.clone()));

    tokio::time::sleep(Duration::from_millis(100)).await;
    token.cancel();

    let result = tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("API server did not stop")
        .unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_spawn_api_server_follows_tracker_shutdown() {
    let server = MockServer::start().await;
    let temp_dir = tempdir().unwrap();
    let mut config = test_config(temp_dir.path(), &server.uri(), None);
    config.server.api.bind_address = "127.0.0.1:0".parse().unwrap();
    let tracker = Arc::new(DebridTracker::new(config).await.unwrap());

    let handle = tracker.spawn_api_server();
    tokio::time::sleep(Duration::from_millis(100)).await;
    tracker.shutdown().await.unwrap();
    assert!(tracker.is_shutting_down());

    let result = tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("API server did not stop")
        .unwrap();
    assert!(result.is_ok());
}
