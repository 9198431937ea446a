//! OpenAPI documentation and schema generation
//!
//! This module defines the OpenAPI specification for the debrid-tracker REST
//! API using utoipa for compile-time spec generation.

use utoipa::OpenApi;

/// OpenAPI documentation for the debrid-tracker REST API
///
/// The spec can be accessed via:
/// - `/api/openapi.json` - JSON format OpenAPI specification
/// - `/swagger-ui` - Interactive Swagger UI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "debrid-tracker REST API",
        version = "0.1.0",
        description = "Submit torrents to Real-Debrid, track their progress, and browse or stream finished content from the rclone mirror",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:8000", description = "Local development server")
    ),
    paths(
        // Torrents
        crate::api::routes::recent_torrents,
        crate::api::routes::add_magnet,
        crate::api::routes::add_torrent_file,
        crate::api::routes::delete_torrent,

        // Files
        crate::api::routes::list_files,
        crate::api::routes::stream_file,

        // System
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
    ),
    components(schemas(
        // Core types from types.rs
        crate::types::TorrentSummary,
        crate::types::FileEntry,
        crate::types::EntryKind,
        crate::types::AddTorrentResponse,
        crate::types::MessageResponse,

        // API request types from routes
        crate::api::routes::AddMagnetRequest,
        crate::api::routes::DeleteTorrentQuery,

        // Error types from error.rs
        crate::error::ApiError,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "torrents", description = "Torrent catalog - Submit magnets or torrent files, list and delete tracked torrents"),
        (name = "files", description = "Mirror access - Browse and stream finished torrent content"),
        (name = "system", description = "System endpoints - Health checks, OpenAPI spec"),
    )
)]
pub struct ApiDoc;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_spec_has_all_paths() {
        let spec = ApiDoc::openapi();

        for path in [
            "/api/torrents/recent",
            "/api/torrents/add-magnet",
            "/api/torrents/add-file",
            "/api/torrents/{id}",
            "/api/torrents/{id}/files",
            "/api/torrents/{id}/stream/{file_path}",
            "/api/health",
            "/api/openapi.json",
        ] {
            assert!(
                spec.paths.paths.contains_key(path),
                "OpenAPI spec should document {}",
                path
            );
        }
    }

    #[test]
    fn test_openapi_spec_has_components() {
        let spec = ApiDoc::openapi();
        let components = spec.components.expect("spec should have components");

        for schema in ["TorrentSummary", "FileEntry", "ApiError", "AddMagnetRequest"] {
            assert!(
                components.schemas.contains_key(schema),
                "missing schema {}",
                schema
            );
        }
    }

    #[test]
    fn test_openapi_spec_serializes() {
        let json = serde_json::to_value(ApiDoc::openapi()).unwrap();
        assert_eq!(json["info"]["title"], "debrid-tracker REST API");
    }
}
