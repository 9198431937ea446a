//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`torrents`] - Catalog, submission and deletion
//! - [`files`] - Mirror listing and streaming
//! - [`system`] - Health, OpenAPI

use serde::{Deserialize, Serialize};

mod files;
mod system;
mod torrents;

// Re-export all handlers so `routes::function_name` continues to work
pub use files::*;
pub use system::*;
pub use torrents::*;

// ============================================================================
// Query/Request Types (shared across handlers)
// ============================================================================

/// Request body for POST /api/torrents/add-magnet
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct AddMagnetRequest {
    /// Magnet URI
    pub magnet: String,
}

/// Query parameters for DELETE /api/torrents/:id
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct DeleteTorrentQuery {
    /// Also remove the torrent from the debrid service (default: false)
    #[serde(default)]
    pub remove_from_rd: bool,
}
