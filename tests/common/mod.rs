//! Common utilities for debrid-tracker integration tests

use debrid_tracker::{Config, DebridTracker};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::MockServer;

/// Tracker wired to a mock server that plays both the debrid API and the
/// rclone mirror
pub async fn tracker_against(server: &MockServer) -> (Arc<DebridTracker>, TempDir) {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");

    let mut config = Config::default();
    config.persistence.database_path = temp_dir.path().join("tracker.db");
    config.debrid.api_key = Some("integration-key".to_string());
    config.debrid.base_url = server.uri();
    config.mirror.base_url = server.uri();
    config.reconcile.interval = Duration::from_millis(25);
    config.reconcile.select_files_retry.delay = Duration::from_millis(5);
    config.server.api.swagger_ui = false;

    let tracker = DebridTracker::new(config)
        .await
        .expect("Failed to create tracker");
    (Arc::new(tracker), temp_dir)
}

/// Poll until `check` passes or the deadline expires
pub async fn eventually<F, Fut>(timeout: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}
