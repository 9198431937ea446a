//! Database layer for debrid-tracker
//!
//! Handles SQLite persistence for torrent records.
//!
//! ## Submodules
//!
//! Methods on [`Database`] are organized by domain:
//! - [`migrations`] - Database lifecycle, schema migrations
//! - [`torrents`] - Torrent record CRUD
//!
//! ## Links column
//!
//! The ordered `links` list is stored as a JSON array of strings in a TEXT
//! column. Encoding and decoding happen only in this module; the rest of the
//! crate sees `Vec<String>`.

use crate::types::{
    FILENAME_PLACEHOLDER, FILENAME_PLACEHOLDER_LEGACY, TorrentId, TorrentSummary,
};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, sqlite::SqlitePool};

mod migrations;
mod torrents;

/// New torrent record to be inserted into the database
#[derive(Debug, Clone)]
pub struct NewTorrent {
    /// Identifier assigned by the debrid service
    pub id: TorrentId,
    /// Display name (placeholder until real metadata arrives)
    pub filename: String,
    /// Info hash, if the submission response carried one
    pub hash: Option<String>,
    /// Hoster label
    pub host: String,
    /// Initial status string
    pub status: String,
}

/// Torrent record from database
#[derive(Debug, Clone, PartialEq)]
pub struct Torrent {
    /// Identifier assigned by the debrid service
    pub id: TorrentId,
    /// Display name
    pub filename: String,
    /// Info hash (None until known)
    pub hash: Option<String>,
    /// Total size in bytes
    pub bytes: i64,
    /// Hoster label
    pub host: String,
    /// Split size reported by the debrid service
    pub split: i64,
    /// Progress percentage (0-100)
    pub progress: i64,
    /// Status string as reported by the debrid service
    pub status: String,
    /// Unix timestamp when the torrent was submitted
    pub added_at: i64,
    /// Unix timestamp when the debrid service finished the torrent
    pub ended_at: Option<i64>,
    /// Download links, in upstream order
    pub links: Vec<String>,
    /// Whether the mirror has been confirmed reachable
    pub mirror_available: bool,
    /// Unix timestamp of the first successful mirror probe
    pub mirror_available_at: Option<i64>,
}

impl Torrent {
    /// True while the record still carries submission placeholders
    pub fn needs_metadata(&self) -> bool {
        self.filename == FILENAME_PLACEHOLDER
            || self.filename == FILENAME_PLACEHOLDER_LEGACY
            || self.hash.is_none()
            || self.bytes == 0
    }

    /// Apply an update in memory, mirroring what the store writes
    pub fn apply(&mut self, update: &TorrentUpdate) {
        if let Some(filename) = &update.filename {
            self.filename = filename.clone();
        }
        if let Some(hash) = &update.hash {
            self.hash = Some(hash.clone());
        }
        if let Some(bytes) = update.bytes {
            self.bytes = bytes;
        }
        if let Some(host) = &update.host {
            self.host = host.clone();
        }
        if let Some(split) = update.split {
            self.split = split;
        }
        if let Some(progress) = update.progress {
            self.progress = progress;
        }
        if let Some(status) = &update.status {
            self.status = status.clone();
        }
        if let Some(links) = &update.links {
            self.links = links.clone();
        }
        if let Some(ended_at) = update.ended_at {
            self.ended_at = Some(ended_at);
        }
        if let Some(available_at) = update.mirror_available_at {
            self.mirror_available = true;
            self.mirror_available_at = Some(available_at);
        }
    }
}

/// Raw row as stored in SQLite
#[derive(Debug, Clone, FromRow)]
struct TorrentRow {
    id: TorrentId,
    filename: String,
    hash: Option<String>,
    bytes: i64,
    host: String,
    split: i64,
    progress: i64,
    status: String,
    added_at: i64,
    ended_at: Option<i64>,
    links: String,
    mirror_available: bool,
    mirror_available_at: Option<i64>,
}

impl From<TorrentRow> for Torrent {
    fn from(row: TorrentRow) -> Self {
        let links = decode_links(&row.id, &row.links);
        Torrent {
            id: row.id,
            filename: row.filename,
            hash: row.hash,
            bytes: row.bytes,
            host: row.host,
            split: row.split,
            progress: row.progress,
            status: row.status,
            added_at: row.added_at,
            ended_at: row.ended_at,
            links,
            mirror_available: row.mirror_available,
            mirror_available_at: row.mirror_available_at,
        }
    }
}

fn decode_links(id: &TorrentId, raw: &str) -> Vec<String> {
    if raw.is_empty() {
        return Vec::new();
    }
    match serde_json::from_str(raw) {
        Ok(links) => links,
        Err(e) => {
            tracing::warn!(torrent_id = %id, error = %e, "Stored links are not a JSON array, ignoring");
            Vec::new()
        }
    }
}

fn timestamp(secs: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
}

impl From<Torrent> for TorrentSummary {
    fn from(torrent: Torrent) -> Self {
        TorrentSummary {
            id: torrent.id,
            filename: torrent.filename,
            hash: torrent.hash,
            bytes: torrent.bytes,
            host: torrent.host,
            split: torrent.split,
            progress: torrent.progress,
            status: torrent.status,
            added: timestamp(torrent.added_at).unwrap_or_else(Utc::now),
            ended: torrent.ended_at.and_then(timestamp),
            links: torrent.links,
            mirror_available: torrent.mirror_available,
            mirror_available_at: torrent.mirror_available_at.and_then(timestamp),
        }
    }
}

/// Subset of torrent fields to write in a single transaction.
///
/// `None` leaves a column untouched. The mirror flag can only be raised:
/// setting `mirror_available_at` also sets `mirror_available = 1`, and there
/// is no way to express the reverse.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TorrentUpdate {
    /// New display name
    pub filename: Option<String>,
    /// New info hash
    pub hash: Option<String>,
    /// New total size
    pub bytes: Option<i64>,
    /// New hoster label
    pub host: Option<String>,
    /// New split size
    pub split: Option<i64>,
    /// New progress percentage
    pub progress: Option<i64>,
    /// New status string
    pub status: Option<String>,
    /// Replacement link list
    pub links: Option<Vec<String>>,
    /// Completion timestamp reported upstream
    pub ended_at: Option<i64>,
    /// Marks the mirror as available at this timestamp
    pub mirror_available_at: Option<i64>,
}

impl TorrentUpdate {
    /// True when no column would change
    pub fn is_empty(&self) -> bool {
        self.changed_fields().is_empty()
    }

    /// Names of the columns this update writes
    pub fn changed_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.filename.is_some() {
            fields.push("filename");
        }
        if self.hash.is_some() {
            fields.push("hash");
        }
        if self.bytes.is_some() {
            fields.push("bytes");
        }
        if self.host.is_some() {
            fields.push("host");
        }
        if self.split.is_some() {
            fields.push("split");
        }
        if self.progress.is_some() {
            fields.push("progress");
        }
        if self.status.is_some() {
            fields.push("status");
        }
        if self.links.is_some() {
            fields.push("links");
        }
        if self.ended_at.is_some() {
            fields.push("ended_at");
        }
        if self.mirror_available_at.is_some() {
            fields.push("mirror_available");
        }
        fields
    }
}

/// Database handle for debrid-tracker
pub struct Database {
    pool: SqlitePool,
}
