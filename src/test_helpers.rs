//! Shared test helpers for creating DebridTracker instances in tests.

use crate::config::Config;
use crate::db::NewTorrent;
use crate::tracker::DebridTracker;
use crate::types::{FILENAME_PLACEHOLDER, TorrentId, status};
use std::time::Duration;
use tempfile::tempdir;

/// Config pointing both the debrid API and the mirror at `upstream`, with a
/// database inside `temp_dir` and millisecond retry delays.
pub(crate) fn test_config(temp_dir: &std::path::Path, upstream: &str, api_key: Option<&str>) -> Config {
    let mut config = Config::default();
    config.persistence.database_path = temp_dir.join("test.db");
    config.debrid.api_key = api_key.map(str::to_string);
    config.debrid.base_url = upstream.to_string();
    config.debrid.timeout = Duration::from_secs(5);
    config.mirror.base_url = upstream.to_string();
    config.mirror.probe_timeout = Duration::from_secs(2);
    config.mirror.listing_timeout = Duration::from_secs(2);
    config.mirror.stream_timeout = Duration::from_secs(5);
    config.reconcile.interval = Duration::from_millis(20);
    config.reconcile.select_files_retry.delay = Duration::from_millis(10);
    config.server.api.swagger_ui = false;
    config
}

/// Helper to create a test DebridTracker backed by `upstream`.
/// Returns the tracker and the tempdir (which must be kept alive).
pub(crate) async fn create_test_tracker(
    upstream: &str,
    api_key: Option<&str>,
) -> (DebridTracker, tempfile::TempDir) {
    let temp_dir = tempdir().unwrap();
    let config = test_config(temp_dir.path(), upstream, api_key);
    let tracker = DebridTracker::new(config).await.unwrap();
    (tracker, temp_dir)
}

/// Fresh magnet submission as the API would insert it
pub(crate) fn placeholder_torrent(id: &str) -> NewTorrent {
    NewTorrent {
        id: TorrentId::new(id),
        filename: FILENAME_PLACEHOLDER.to_string(),
        hash: None,
        host: "real-debrid.com".to_string(),
        status: status::WAITING_FILES_SELECTION.to_string(),
    }
}

/// Insert a record that already finished on the debrid side
pub(crate) async fn insert_downloaded(tracker: &DebridTracker, id: &str, filename: &str) {
    tracker
        .db
        .insert_torrent(&NewTorrent {
            id: TorrentId::new(id),
            filename: filename.to_string(),
            hash: Some(format!("hash-{id}")),
            host: "real-debrid.com".to_string(),
            status: status::DOWNLOADED.to_string(),
        })
        .await
        .unwrap();
}

/// Insert a downloaded record and mark it available on the mirror
pub(crate) async fn insert_mirrored(tracker: &DebridTracker, id: &str, filename: &str) {
    insert_downloaded(tracker, id, filename).await;
    let update = crate::db::TorrentUpdate {
        bytes: Some(1024),
        mirror_available_at: Some(chrono::Utc::now().timestamp()),
        ..Default::default()
    };
    assert!(
        tracker
            .db
            .update_torrent(&TorrentId::new(id), &update)
            .await
            .unwrap()
    );
}
