//! Core types for debrid-tracker

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Identifier assigned to a torrent by the debrid service
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct TorrentId(pub String);

impl TorrentId {
    /// Create a new TorrentId
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for TorrentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for TorrentId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for TorrentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// Implement sqlx Type, Encode, and Decode for database operations
impl sqlx::Type<sqlx::Sqlite> for TorrentId {
    fn type_info() -> sqlx::sqlite::SqliteTypeInfo {
        <String as sqlx::Type<sqlx::Sqlite>>::type_info()
    }

    fn compatible(ty: &sqlx::sqlite::SqliteTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Sqlite>>::compatible(ty)
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Sqlite> for TorrentId {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<sqlx::sqlite::SqliteArgumentValue<'q>>,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        sqlx::Encode::<sqlx::Sqlite>::encode_by_ref(&self.0, buf)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Sqlite> for TorrentId {
    fn decode(value: sqlx::sqlite::SqliteValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let id = <String as sqlx::Decode<sqlx::Sqlite>>::decode(value)?;
        Ok(Self(id))
    }
}

/// Status strings reported by the debrid service.
///
/// The set is open-ended; only a few values drive reconciliation and the
/// rest are stored as reported.
pub mod status {
    /// Torrent is parsed and waits for the file selection command
    pub const WAITING_FILES_SELECTION: &str = "waiting_files_selection";
    /// Content is fully downloaded on the debrid side
    pub const DOWNLOADED: &str = "downloaded";
}

/// Filename stored on a magnet submission until real metadata arrives
pub const FILENAME_PLACEHOLDER: &str = "Fetching info...";

/// Legacy filename placeholder, treated the same as [`FILENAME_PLACEHOLDER`]
pub const FILENAME_PLACEHOLDER_LEGACY: &str = "N/A";

/// Torrent record as served by the catalog endpoint
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TorrentSummary {
    /// Debrid identifier
    #[schema(value_type = String)]
    pub id: TorrentId,
    /// Torrent name (placeholder until the debrid service reports it)
    pub filename: String,
    /// Info hash, if known
    pub hash: Option<String>,
    /// Total size in bytes
    pub bytes: i64,
    /// Hoster the content is served from
    pub host: String,
    /// Split size reported by the debrid service
    pub split: i64,
    /// Progress percentage (0-100)
    pub progress: i64,
    /// Status string as reported by the debrid service
    pub status: String,
    /// When the torrent was submitted
    pub added: DateTime<Utc>,
    /// When the debrid service finished the torrent
    pub ended: Option<DateTime<Utc>>,
    /// Download links reported by the debrid service
    pub links: Vec<String>,
    /// Whether the content is reachable on the mirror
    pub mirror_available: bool,
    /// When the mirror was first confirmed reachable
    pub mirror_available_at: Option<DateTime<Utc>>,
}

/// Kind of directory listing entry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Regular file
    File,
    /// Sub-directory
    Directory,
}

/// Entry of a mirror directory listing
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FileEntry {
    /// Display name (no trailing slash for directories)
    pub name: String,
    /// File or directory
    #[serde(rename = "type")]
    pub kind: EntryKind,
    /// Percent-decoded link target relative to the listed directory
    pub path: String,
}

/// Response for torrent submissions
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct AddTorrentResponse {
    /// Human readable outcome
    pub message: String,
    /// Identifier assigned by the debrid service
    pub torrent_id: String,
}

/// Generic message response
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    /// Human readable outcome
    pub message: String,
}
