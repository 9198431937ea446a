use super::*;
use crate::test_helpers::{insert_downloaded, insert_mirrored};
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

const LISTING: &str = r#"<!DOCTYPE html>
<html>
<head><title>Directory listing of /torrents/Show Name/</title></head>
<body>
<h1>Directory listing of /torrents/Show Name/</h1>
<table>
<tr><td><a href="../">../</a></td><td>-</td></tr>
<tr><td><a href="Season%201/">Season 1/</a></td><td>-</td></tr>
<tr><td><a href="Show%20Name.nfo">Show Name.nfo</a></td><td>2.1k</td></tr>
</table>
</body>
</html>"#;

// GET /api/torrents/:id/files

#[tokio::test]
async fn test_files_unknown_torrent() {
    let server = MockServer::start().await;
    let (app, _tracker, _dir) = create_test_app(&server, None).await;

    let response = app
        .oneshot(get("/api/torrents/NOPE/files"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_files_not_yet_mirrored() {
    let server = MockServer::start().await;
    let (app, tracker, _dir) = create_test_app(&server, None).await;
    insert_downloaded(&tracker, "PENDING", "Show Name").await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LISTING))
        .expect(0)
        .mount(&server)
        .await;

    let response = app
        .oneshot(get("/api/torrents/PENDING/files"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await["error"]["code"],
        "mirror_unavailable"
    );
}

#[tokio::test]
async fn test_files_lists_mirror_directory() {
    let server = MockServer::start().await;
    let (app, tracker, _dir) = create_test_app(&server, None).await;
    insert_mirrored(&tracker, "READY", "Show Name").await;

    Mock::given(method("GET"))
        .and(path("/torrents/Show%20Name/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LISTING))
        .expect(1)
        .mount(&server)
        .await;

    let response = app
        .oneshot(get("/api/torrents/READY/files"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        serde_json::json!([
            { "name": "Season 1", "type": "directory", "path": "Season 1/" },
            { "name": "Show Name.nfo", "type": "file", "path": "Show Name.nfo" }
        ])
    );
}

#[tokio::test]
async fn test_files_mirror_failure_is_empty_list() {
    let server = MockServer::start().await;
    let (app, tracker, _dir) = create_test_app(&server, None).await;
    insert_mirrored(&tracker, "FLAKY", "Flaky").await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let response = app
        .oneshot(get("/api/torrents/FLAKY/files"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, serde_json::json!([]));
}

// GET /api/torrents/:id/stream/*file_path

#[tokio::test]
async fn test_stream_passes_large_body_through() {
    let server = MockServer::start().await;
    let (app, tracker, _dir) = create_test_app(&server, None).await;
    insert_mirrored(&tracker, "BIG", "Show Name").await;

    let content: Vec<u8> = (0..10 * 1024 * 1024).map(|i| (i % 251) as u8).collect();
    Mock::given(method("GET"))
        .and(path("/torrents/Show%20Name/Season%201/ep%2001.mkv"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(content.clone(), "video/x-matroska"))
        .expect(1)
        .mount(&server)
        .await;

    let response = app
        .oneshot(get("/api/torrents/BIG/stream/Season%201/ep%2001.mkv"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers["content-type"], "video/x-matroska");
    assert_eq!(
        headers["content-disposition"],
        "attachment; filename=\"ep 01.mkv\""
    );
    assert_eq!(
        headers["content-length"],
        content.len().to_string().as_str()
    );

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(body.len(), content.len());
    assert!(body.as_ref() == content.as_slice());
}

#[tokio::test]
async fn test_stream_not_yet_mirrored() {
    let server = MockServer::start().await;
    let (app, tracker, _dir) = create_test_app(&server, None).await;
    insert_downloaded(&tracker, "WAIT", "Show Name").await;

    let response = app
        .oneshot(get("/api/torrents/WAIT/stream/file.mkv"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_stream_unknown_torrent() {
    let server = MockServer::start().await;
    let (app, _tracker, _dir) = create_test_app(&server, None).await;

    let response = app
        .oneshot(get("/api/torrents/NOPE/stream/file.mkv"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_stream_missing_file_on_mirror() {
    let server = MockServer::start().await;
    let (app, tracker, _dir) = create_test_app(&server, None).await;
    insert_mirrored(&tracker, "HOLE", "Show Name").await;

    let response = app
        .oneshot(get("/api/torrents/HOLE/stream/missing.mkv"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(response).await["error"]["code"], "upstream_not_found");
}
