//! The tracker service: shared store, clients and background tasks.
//!
//! [`DebridTracker`] owns everything the API handlers and the reconciler
//! need. Handlers call its methods; the binary spawns the reconciler and the
//! API server from it and calls [`DebridTracker::shutdown`] on a signal.

use crate::config::Config;
use crate::db::{Database, NewTorrent, Torrent};
use crate::debrid::DebridClient;
use crate::error::{Error, Result};
use crate::mirror::MirrorClient;
use crate::reconciler::Reconciler;
use crate::types::{FILENAME_PLACEHOLDER, FileEntry, TorrentId, TorrentSummary, status};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Name recorded for uploads that arrive without a file name
pub const UPLOAD_FALLBACK_NAME: &str = "upload.torrent";

/// Torrent tracker service
pub struct DebridTracker {
    /// Record store
    pub db: Arc<Database>,
    /// Debrid API client
    pub debrid: Arc<DebridClient>,
    /// rclone mirror client
    pub mirror: Arc<MirrorClient>,
    /// Configuration
    pub config: Arc<Config>,
    shutdown: CancellationToken,
}

impl DebridTracker {
    /// Open the store and build the clients
    pub async fn new(config: Config) -> Result<Self> {
        let db = Database::new(&config.persistence.database_path).await?;
        let debrid = DebridClient::new(&config.debrid)?;
        let mirror = MirrorClient::new(&config.mirror)?;

        info!(
            database = %config.persistence.database_path.display(),
            debrid_configured = debrid.is_configured(),
            mirror = %config.mirror.base_url,
            "Tracker initialized"
        );

        Ok(Self {
            db: Arc::new(db),
            debrid: Arc::new(debrid),
            mirror: Arc::new(mirror),
            config: Arc::new(config),
            shutdown: CancellationToken::new(),
        })
    }

    /// Build a reconciler over this tracker's store and clients
    pub fn reconciler(&self) -> Reconciler {
        Reconciler::new(
            self.db.clone(),
            self.debrid.clone(),
            self.mirror.clone(),
            self.config.reconcile.clone(),
        )
    }

    /// Spawn the reconciliation loop; it stops on [`DebridTracker::shutdown`]
    pub fn spawn_reconciler(&self) -> tokio::task::JoinHandle<()> {
        let reconciler = self.reconciler();
        let token = self.shutdown.clone();
        tokio::spawn(async move { reconciler.run(token).await })
    }

    /// Spawn the API server; it drains and stops on [`DebridTracker::shutdown`]
    pub fn spawn_api_server(self: &Arc<Self>) -> tokio::task::JoinHandle<Result<()>> {
        let tracker = self.clone();
        let token = self.shutdown.clone();

        tokio::spawn(async move { crate::api::start_api_server(tracker, token).await })
    }

    /// Signal background tasks to stop
    pub async fn shutdown(&self) -> Result<()> {
        info!("Initiating graceful shutdown");
        self.shutdown.cancel();
        Ok(())
    }

    /// Whether shutdown has been requested
    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// All records, most recently added first
    pub async fn recent(&self) -> Result<Vec<TorrentSummary>> {
        let torrents = self.db.list_torrents().await?;
        Ok(torrents.into_iter().map(TorrentSummary::from).collect())
    }

    /// Submit a magnet link and record it with placeholders
    pub async fn add_magnet(&self, magnet: &str) -> Result<TorrentId> {
        let magnet = magnet.trim();
        if magnet.is_empty() {
            return Err(Error::InvalidRequest("magnet link is empty".to_string()));
        }

        let added = self.debrid.add_magnet(magnet).await?;
        self.record_submission(added.id, FILENAME_PLACEHOLDER.to_string(), added.hash)
            .await
    }

    /// Upload a torrent file and record it under the uploaded name
    pub async fn add_torrent_file(&self, name: Option<&str>, torrent: Vec<u8>) -> Result<TorrentId> {
        if torrent.is_empty() {
            return Err(Error::InvalidRequest("torrent file is empty".to_string()));
        }

        let added = self.debrid.add_torrent_file(torrent).await?;
        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(UPLOAD_FALLBACK_NAME)
            .to_string();
        self.record_submission(added.id, name, added.hash).await
    }

    async fn record_submission(
        &self,
        id: String,
        filename: String,
        hash: Option<String>,
    ) -> Result<TorrentId> {
        let id = TorrentId::from(id);
        let torrent = NewTorrent {
            id: id.clone(),
            filename,
            hash: hash.filter(|h| !h.trim().is_empty()),
            host: self.config.debrid.host.clone(),
            status: status::WAITING_FILES_SELECTION.to_string(),
        };

        self.db.insert_torrent(&torrent).await?;
        info!(torrent_id = %id, filename = %torrent.filename, "Torrent submitted");
        Ok(id)
    }

    /// Look up a record whose content is confirmed on the mirror
    async fn mirrored_torrent(&self, id: &TorrentId) -> Result<Torrent> {
        let torrent = self
            .db
            .get_torrent(id)
            .await?
            .ok_or_else(|| Error::NotFound(id.to_string()))?;

        if !torrent.mirror_available {
            return Err(Error::MirrorUnavailable { id: id.to_string() });
        }

        Ok(torrent)
    }

    /// List the torrent's directory on the mirror
    pub async fn list_files(&self, id: &TorrentId) -> Result<Vec<FileEntry>> {
        let torrent = self.mirrored_torrent(id).await?;
        let files = self
            .mirror
            .list(&self.mirror.torrent_path(&torrent.filename))
            .await;

        if files.is_empty() {
            warn!(
                torrent_id = %id,
                filename = %torrent.filename,
                "Mirror returned no files for a torrent marked available"
            );
        }

        Ok(files)
    }

    /// Open a file of the torrent on the mirror for streaming
    pub async fn open_stream(&self, id: &TorrentId, file_path: &str) -> Result<reqwest::Response> {
        let torrent = self.mirrored_torrent(id).await?;
        self.mirror.open_file(&torrent.filename, file_path).await
    }

    /// Delete a record, optionally removing the torrent from the debrid service
    ///
    /// The remote removal is best-effort: its failure is logged and the local
    /// record is deleted anyway.
    pub async fn remove(&self, id: &TorrentId, remove_from_debrid: bool) -> Result<()> {
        if remove_from_debrid && !self.debrid.is_configured() {
            return Err(Error::NotConfigured);
        }

        if self.db.get_torrent(id).await?.is_none() {
            return Err(Error::NotFound(id.to_string()));
        }

        if remove_from_debrid {
            match self.debrid.delete_torrent(id).await {
                Ok(()) => info!(torrent_id = %id, "Deleted torrent from debrid service"),
                Err(e) => warn!(
                    torrent_id = %id,
                    error = %e,
                    "Failed to delete torrent from debrid service, removing local record anyway"
                ),
            }
        }

        if !self.db.delete_torrent(id).await? {
            return Err(Error::NotFound(id.to_string()));
        }

        info!(torrent_id = %id, "Torrent deleted");
        Ok(())
    }
}
