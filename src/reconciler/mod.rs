//! Background reconciliation of stored torrents against the debrid service
//! and the mirror.
//!
//! The [`Reconciler`] sleeps for the configured interval, then sweeps every
//! stored record:
//!
//! 1. Refresh details from the debrid API (skipped once `downloaded`). A 404
//!    only means the service has not registered the torrent yet.
//! 2. Select all files while the torrent waits for a selection, retrying
//!    throttled calls with a fixed delay.
//! 3. Probe the mirror once the torrent is downloaded, until it shows up.
//!
//! Changes for a record are written in one transaction. Nothing here is fatal:
//! failures are logged and the record is retried on the next sweep.

use crate::config::ReconcileConfig;
use crate::db::{Database, Torrent, TorrentUpdate};
use crate::debrid::{DebridClient, TorrentInfo};
use crate::error::{DatabaseError, Error, Result};
use crate::mirror::MirrorClient;
use crate::retry::retry_with_fixed_delay;
use crate::types::{FILENAME_PLACEHOLDER, FILENAME_PLACEHOLDER_LEGACY, TorrentId, status};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Counters for one sweep
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Records looked at
    pub examined: usize,
    /// Transactions that changed a row
    pub commits: usize,
    /// Records whose reconciliation hit an unexpected error
    pub failures: usize,
}

impl SweepReport {
    fn merge(&mut self, other: SweepReport) {
        self.examined += other.examined;
        self.commits += other.commits;
        self.failures += other.failures;
    }
}

/// Periodic reconciliation worker
pub struct Reconciler {
    db: Arc<Database>,
    debrid: Arc<DebridClient>,
    mirror: Arc<MirrorClient>,
    config: ReconcileConfig,
}

impl Reconciler {
    /// Create a reconciler over shared clients and store
    pub fn new(
        db: Arc<Database>,
        debrid: Arc<DebridClient>,
        mirror: Arc<MirrorClient>,
        config: ReconcileConfig,
    ) -> Self {
        Self {
            db,
            debrid,
            mirror,
            config,
        }
    }

    /// Run sweeps until `shutdown` is cancelled
    ///
    /// Each iteration sleeps first, so the first sweep happens one interval
    /// after startup. Cancellation is honored during the sleep; a sweep in
    /// progress is allowed to finish.
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            interval_secs = self.config.interval.as_secs_f64(),
            "Reconciler started"
        );

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.config.interval) => {}
            }

            match self.sweep().await {
                Ok(report) => debug!(
                    examined = report.examined,
                    commits = report.commits,
                    failures = report.failures,
                    "Reconciliation sweep finished"
                ),
                Err(e) => error!(error = %e, "Reconciliation sweep failed"),
            }
        }

        info!("Reconciler stopped");
    }

    /// Reconcile every stored record once
    ///
    /// # Errors
    /// Only fails when the records cannot be listed; per-record failures are
    /// counted in the report.
    pub async fn sweep(&self) -> Result<SweepReport> {
        let torrents = self.db.list_torrents().await?;
        let mut report = SweepReport::default();

        if !self.debrid.is_configured() && !torrents.is_empty() {
            debug!("Debrid API key not set, only probing the mirror");
        }

        for torrent in &torrents {
            report.merge(self.reconcile_torrent(torrent).await);
        }

        Ok(report)
    }

    /// Reconcile a single record
    pub async fn reconcile_torrent(&self, torrent: &Torrent) -> SweepReport {
        let commits = AtomicUsize::new(0);
        let result = self.reconcile_steps(torrent, &commits).await;

        let failures = match result {
            Ok(()) => 0,
            Err(e) => {
                warn!(torrent_id = %torrent.id, error = %e, "Failed to reconcile torrent");
                1
            }
        };

        SweepReport {
            examined: 1,
            commits: commits.load(Ordering::SeqCst),
            failures,
        }
    }

    async fn reconcile_steps(&self, torrent: &Torrent, commits: &AtomicUsize) -> Result<()> {
        let id = &torrent.id;
        let mut current = torrent.clone();
        let pending = Mutex::new(TorrentUpdate::default());

        if current.status != status::DOWNLOADED && self.debrid.is_configured() {
            match self.debrid.torrent_info(id).await {
                Ok(info) => {
                    let update = info_update(&current, &info);
                    if !update.is_empty() {
                        debug!(torrent_id = %id, fields = ?update.changed_fields(), "Debrid reported changes");
                    }
                    current.apply(&update);
                    *lock(&pending) = update;
                }
                Err(e) if e.is_upstream_not_found() => {
                    debug!(torrent_id = %id, "Torrent not registered upstream yet");
                    return Ok(());
                }
                Err(e) => return Err(e),
            }
        }

        if current.status == status::WAITING_FILES_SELECTION && self.debrid.is_configured() {
            retry_with_fixed_delay(&self.config.select_files_retry, |attempt| {
                let pending = &pending;
                async move {
                    debug!(torrent_id = %id, attempt, "Selecting all files");
                    let result = self.debrid.select_all_files(id).await;
                    // Keep what the info refresh learned even if selection keeps failing
                    commits.fetch_add(self.flush(id, pending).await?, Ordering::SeqCst);
                    result
                }
            })
            .await?;

            info!(torrent_id = %id, "Selected all files");
            return Ok(());
        }

        if current.status == status::DOWNLOADED
            && !current.mirror_available
            && !is_placeholder_name(&current.filename)
        {
            if self.mirror.probe(&current.filename).await {
                info!(torrent_id = %id, filename = %current.filename, "Torrent available on mirror");
                lock(&pending).mirror_available_at = Some(chrono::Utc::now().timestamp());
            } else {
                debug!(torrent_id = %id, "Torrent not on mirror yet");
            }
        }

        commits.fetch_add(self.flush(id, &pending).await?, Ordering::SeqCst);
        Ok(())
    }

    /// Write pending changes, returning the number of committed transactions
    async fn flush(&self, id: &TorrentId, pending: &Mutex<TorrentUpdate>) -> Result<usize> {
        let mut update = std::mem::take(&mut *lock(pending));
        if update.is_empty() {
            return Ok(0);
        }

        let written = match self.db.update_torrent(id, &update).await {
            Err(Error::Database(DatabaseError::ConstraintViolation(msg))) if update.hash.is_some() => {
                warn!(
                    torrent_id = %id,
                    error = %msg,
                    "Hash already belongs to another record, keeping the rest of the update"
                );
                update.hash = None;
                if update.is_empty() {
                    return Ok(0);
                }
                self.db.update_torrent(id, &update).await?
            }
            other => other?,
        };

        if written {
            debug!(torrent_id = %id, fields = ?update.changed_fields(), "Committed torrent update");
            Ok(1)
        } else {
            debug!(torrent_id = %id, "Torrent deleted during sweep, dropping update");
            Ok(0)
        }
    }
}

fn lock(pending: &Mutex<TorrentUpdate>) -> std::sync::MutexGuard<'_, TorrentUpdate> {
    pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn is_placeholder_name(filename: &str) -> bool {
    filename == FILENAME_PLACEHOLDER || filename == FILENAME_PLACEHOLDER_LEGACY
}

fn non_empty(value: &Option<String>) -> Option<&String> {
    value.as_ref().filter(|v| !v.trim().is_empty())
}

/// Compute the fields that differ between a stored record and upstream details
///
/// Identity fields are only back-filled while the record still carries
/// placeholders. Links are never replaced by an empty list.
pub fn info_update(current: &Torrent, info: &TorrentInfo) -> TorrentUpdate {
    let mut update = TorrentUpdate::default();

    if current.needs_metadata() {
        if let Some(filename) = non_empty(&info.filename)
            && *filename != current.filename
        {
            update.filename = Some(filename.clone());
        }
        if let Some(hash) = non_empty(&info.hash)
            && current.hash.as_ref() != Some(hash)
        {
            update.hash = Some(hash.clone());
        }
        if let Some(bytes) = info.bytes
            && bytes > 0
            && bytes != current.bytes
        {
            update.bytes = Some(bytes);
        }
        if let Some(host) = non_empty(&info.host)
            && *host != current.host
        {
            update.host = Some(host.clone());
        }
        if let Some(split) = info.split
            && split != current.split
        {
            update.split = Some(split);
        }
    }

    if let Some(status) = non_empty(&info.status)
        && *status != current.status
    {
        update.status = Some(status.clone());
    }

    if let Some(progress) = info.progress_percent()
        && progress != current.progress
    {
        update.progress = Some(progress);
    }

    if !info.links.is_empty() && info.links != current.links {
        update.links = Some(info.links.clone());
    }

    if current.ended_at.is_none()
        && let Some(ended_at) = info.ended_timestamp()
    {
        update.ended_at = Some(ended_at);
    }

    update
}
