use super::*;
use wiremock::matchers::{body_bytes, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> DebridClient {
    DebridClient::new(&DebridConfig {
        api_key: Some("secret".to_string()),
        base_url: server.uri(),
        ..Default::default()
    })
    .unwrap()
}

#[tokio::test]
async fn test_torrent_info_parses_partial_payload() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/torrents/info/ABC"))
        .and(header("authorization", "Bearer secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "ABC",
            "filename": "Some.Show.S01",
            "hash": "0123456789abcdef",
            "bytes": 734003200,
            "host": "real-debrid.com",
            "split": 2000,
            "progress": 57.6,
            "status": "downloading",
            "added": "2024-05-01T10:00:00.000Z",
            "links": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let info = client_for(&server)
        .torrent_info(&TorrentId::new("ABC"))
        .await
        .unwrap();

    assert_eq!(info.filename.as_deref(), Some("Some.Show.S01"));
    assert_eq!(info.bytes, Some(734003200));
    assert_eq!(info.progress_percent(), Some(58));
    assert_eq!(info.status.as_deref(), Some("downloading"));
    assert!(info.links.is_empty());
    assert_eq!(info.ended_timestamp(), None);
}

#[tokio::test]
async fn test_torrent_info_404_is_upstream_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/torrents/info/NEW"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "error": "unknown_ressource",
            "error_code": 7
        })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .torrent_info(&TorrentId::new("NEW"))
        .await
        .unwrap_err();

    assert!(err.is_upstream_not_found());
    match err {
        Error::Upstream { message, .. } => assert_eq!(message, "unknown_ressource"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_add_magnet_posts_form() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/torrents/addMagnet"))
        .and(header("authorization", "Bearer secret"))
        .and(body_string_contains("magnet=magnet%3A%3Fxt%3Durn%3Abtih%3Aabc"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "id": "XYZ",
            "uri": "https://api.real-debrid.com/rest/1.0/torrents/info/XYZ"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let added = client_for(&server)
        .add_magnet("magnet:?xt=urn:btih:abc")
        .await
        .unwrap();

    assert_eq!(added.id, "XYZ");
    assert!(added.uri.is_some());
    assert!(added.hash.is_none());
}

#[tokio::test]
async fn test_add_torrent_file_sends_raw_body() {
    let server = MockServer::start().await;
    let payload = b"d8:announce3:urle".to_vec();

    Mock::given(method("PUT"))
        .and(path("/torrents/addTorrent"))
        .and(header("content-type", "application/x-bittorrent"))
        .and(body_bytes(payload.clone()))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(serde_json::json!({ "id": "FILE1" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let added = client_for(&server).add_torrent_file(payload).await.unwrap();
    assert_eq!(added.id, "FILE1");
}

#[tokio::test]
async fn test_select_all_files_accepts_204() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/torrents/selectFiles/ABC"))
        .and(body_string_contains("files=all"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server)
        .select_all_files(&TorrentId::new("ABC"))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_select_all_files_429_is_rate_limited() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/torrents/selectFiles/ABC"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .select_all_files(&TorrentId::new("ABC"))
        .await
        .unwrap_err();

    assert!(err.is_rate_limited());
    assert!(err.to_string().contains("slow down"));
}

#[tokio::test]
async fn test_delete_torrent() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/torrents/delete/ABC"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server)
        .delete_torrent(&TorrentId::new("ABC"))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_missing_credential_fails_before_network() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let client = DebridClient::new(&DebridConfig {
        api_key: Some("   ".to_string()),
        base_url: server.uri(),
        ..Default::default()
    })
    .unwrap();

    assert!(!client.is_configured());
    let err = client.add_magnet("magnet:?xt=urn:btih:abc").await.unwrap_err();
    assert!(matches!(err, Error::NotConfigured));
}

#[test]
fn test_ended_timestamp_parses_rfc3339() {
    let info = TorrentInfo {
        ended: Some("2024-05-01T12:00:00.000Z".to_string()),
        ..Default::default()
    };
    assert_eq!(info.ended_timestamp(), Some(1714564800));

    let garbage = TorrentInfo {
        ended: Some("yesterday".to_string()),
        ..Default::default()
    };
    assert_eq!(garbage.ended_timestamp(), None);
}
