//! Mirror listing and streaming handlers.

use crate::api::AppState;
use crate::error::{Error, Result};
use crate::types::{FileEntry, TorrentId};
use axum::{
    Json,
    body::Body,
    extract::{Path, State},
    http::{StatusCode, header},
    response::Response,
};

/// GET /api/torrents/:id/files - List the torrent's directory on the mirror
#[utoipa::path(
    get,
    path = "/api/torrents/{id}/files",
    tag = "files",
    params(
        ("id" = String, Path, description = "Debrid torrent ID")
    ),
    responses(
        (status = 200, description = "Directory entries (empty when the mirror listing fails)", body = Vec<FileEntry>),
        (status = 400, description = "Torrent not yet available on the mirror", body = crate::error::ApiError),
        (status = 404, description = "Torrent not found", body = crate::error::ApiError)
    )
)]
pub async fn list_files(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<FileEntry>>> {
    let files = state.tracker.list_files(&TorrentId::from(id)).await?;
    Ok(Json(files))
}

/// GET /api/torrents/:id/stream/*file_path - Stream a file from the mirror
#[utoipa::path(
    get,
    path = "/api/torrents/{id}/stream/{file_path}",
    tag = "files",
    params(
        ("id" = String, Path, description = "Debrid torrent ID"),
        ("file_path" = String, Path, description = "Path of the file inside the torrent directory")
    ),
    responses(
        (status = 200, description = "File content streamed as an attachment", content_type = "application/octet-stream"),
        (status = 400, description = "Torrent not yet available on the mirror", body = crate::error::ApiError),
        (status = 404, description = "Torrent not found", body = crate::error::ApiError),
        (status = 500, description = "Mirror failure", body = crate::error::ApiError)
    )
)]
pub async fn stream_file(
    State(state): State<AppState>,
    Path((id, file_path)): Path<(String, String)>,
) -> Result<Response> {
    let upstream = state
        .tracker
        .open_stream(&TorrentId::from(id), &file_path)
        .await?;

    let content_type = upstream
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();
    let content_length = upstream.content_length();

    let mut response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition(basename(&file_path)),
        );
    if let Some(length) = content_length {
        response = response.header(header::CONTENT_LENGTH, length);
    }

    response
        .body(Body::from_stream(upstream.bytes_stream()))
        .map_err(|e| Error::Other(format!("Failed to build streaming response: {}", e)))
}

fn basename(file_path: &str) -> &str {
    file_path
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(file_path)
}

/// `attachment; filename="<name>"`, with an RFC 5987 `filename*` when the
/// name is not plain ASCII
fn content_disposition(name: &str) -> String {
    let is_plain = name
        .chars()
        .all(|c| c.is_ascii() && !c.is_ascii_control() && c != '"' && c != '\\');
    if is_plain {
        return format!("attachment; filename=\"{}\"", name);
    }

    let fallback: String = name
        .chars()
        .map(|c| {
            if c.is_ascii() && !c.is_ascii_control() && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(name)
    )
}
