//! Torrent catalog handlers.

use super::{AddMagnetRequest, DeleteTorrentQuery};
use crate::api::AppState;
use crate::error::{Error, Result};
use crate::types::{AddTorrentResponse, MessageResponse, TorrentId, TorrentSummary};
use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
};

/// GET /api/torrents/recent - List all torrents, newest first
#[utoipa::path(
    get,
    path = "/api/torrents/recent",
    tag = "torrents",
    responses(
        (status = 200, description = "All tracked torrents, most recently added first", body = Vec<TorrentSummary>),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    )
)]
pub async fn recent_torrents(State(state): State<AppState>) -> Result<Json<Vec<TorrentSummary>>> {
    Ok(Json(state.tracker.recent().await?))
}

/// POST /api/torrents/add-magnet - Submit a magnet link
#[utoipa::path(
    post,
    path = "/api/torrents/add-magnet",
    tag = "torrents",
    request_body = AddMagnetRequest,
    responses(
        (status = 200, description = "Magnet submitted", body = AddTorrentResponse),
        (status = 400, description = "Debrid API key not set or empty magnet", body = crate::error::ApiError),
        (status = 409, description = "Torrent already tracked", body = crate::error::ApiError),
        (status = 500, description = "Debrid service failure", body = crate::error::ApiError)
    )
)]
pub async fn add_magnet(
    State(state): State<AppState>,
    Json(request): Json<AddMagnetRequest>,
) -> Result<Json<AddTorrentResponse>> {
    if !state.tracker.debrid.is_configured() {
        return Err(Error::NotConfigured);
    }

    let id = state.tracker.add_magnet(&request.magnet).await?;

    Ok(Json(AddTorrentResponse {
        message: "Magnet link added successfully".to_string(),
        torrent_id: id.0,
    }))
}

/// POST /api/torrents/add-file - Upload a .torrent file
#[utoipa::path(
    post,
    path = "/api/torrents/add-file",
    tag = "torrents",
    request_body(content = Vec<u8>, description = "Torrent file upload in the 'file' field (multipart/form-data)", content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Torrent file submitted", body = AddTorrentResponse),
        (status = 400, description = "Debrid API key not set or no file provided", body = crate::error::ApiError),
        (status = 409, description = "Torrent already tracked", body = crate::error::ApiError),
        (status = 500, description = "Debrid service failure", body = crate::error::ApiError)
    )
)]
pub async fn add_torrent_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<AddTorrentResponse>> {
    if !state.tracker.debrid.is_configured() {
        return Err(Error::NotConfigured);
    }

    let mut upload: Option<(Option<String>, Vec<u8>)> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                return Err(Error::InvalidRequest(format!(
                    "Failed to read multipart body: {}",
                    e
                )));
            }
        };

        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| Error::InvalidRequest(format!("Failed to read file: {}", e)))?;
        upload = Some((file_name, bytes.to_vec()));
    }

    let Some((file_name, bytes)) = upload else {
        return Err(Error::InvalidRequest(
            "No torrent file provided in 'file' field".to_string(),
        ));
    };

    let id = state
        .tracker
        .add_torrent_file(file_name.as_deref(), bytes)
        .await?;

    Ok(Json(AddTorrentResponse {
        message: "Torrent file added successfully".to_string(),
        torrent_id: id.0,
    }))
}

/// DELETE /api/torrents/:id - Delete a torrent record
#[utoipa::path(
    delete,
    path = "/api/torrents/{id}",
    tag = "torrents",
    params(
        ("id" = String, Path, description = "Debrid torrent ID"),
        ("remove_from_rd" = Option<bool>, Query, description = "Also remove the torrent from the debrid service (default: false)")
    ),
    responses(
        (status = 200, description = "Torrent deleted", body = MessageResponse),
        (status = 400, description = "Remote removal requested but debrid API key not set", body = crate::error::ApiError),
        (status = 404, description = "Torrent not found", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    )
)]
pub async fn delete_torrent(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<DeleteTorrentQuery>,
) -> Result<Json<MessageResponse>> {
    let id = TorrentId::from(id);
    state.tracker.remove(&id, query.remove_from_rd).await?;

    Ok(Json(MessageResponse {
        message: format!("Torrent {} deleted successfully.", id),
    }))
}
