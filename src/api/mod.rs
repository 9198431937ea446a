//! REST API server module
//!
//! Serves the torrent catalog, submission endpoints and mirror access to the
//! web frontend.

use crate::{Config, DebridTracker, Result};
use axum::{
    Router,
    http::HeaderValue,
    routing::{delete, get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod error_response;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use state::AppState;

/// Create the API router with all route definitions
///
/// # Routes
///
/// ## Torrents
/// - `GET /api/torrents/recent` - List all torrents, newest first
/// - `POST /api/torrents/add-magnet` - Submit a magnet link
/// - `POST /api/torrents/add-file` - Upload a torrent file
/// - `DELETE /api/torrents/:id` - Delete a torrent (optionally from the debrid service too)
///
/// ## Files
/// - `GET /api/torrents/:id/files` - List the torrent directory on the mirror
/// - `GET /api/torrents/:id/stream/*file_path` - Stream a file from the mirror
///
/// ## System
/// - `GET /api/health` - Health check
/// - `GET /api/openapi.json` - OpenAPI specification
/// - `GET /swagger-ui` - Interactive Swagger UI documentation (if enabled)
pub fn create_router(tracker: Arc<DebridTracker>, config: Arc<Config>) -> Router {
    let state = AppState::new(tracker, config.clone());

    // Build the router with all routes
    let router = Router::new()
        // Torrents
        .route("/api/torrents/recent", get(routes::recent_torrents))
        .route("/api/torrents/add-magnet", post(routes::add_magnet))
        .route("/api/torrents/add-file", post(routes::add_torrent_file))
        .route("/api/torrents/:id", delete(routes::delete_torrent))
        // Files
        .route("/api/torrents/:id/files", get(routes::list_files))
        .route(
            "/api/torrents/:id/stream/*file_path",
            get(routes::stream_file),
        )
        // System
        .route("/api/health", get(routes::health_check))
        .route("/api/openapi.json", get(routes::openapi_spec));

    // Merge Swagger UI routes if enabled in config (before applying state)
    let router = if config.server.api.swagger_ui {
        router.merge(SwaggerUi::new("/swagger-ui").url("/api/openapi.json", ApiDoc::openapi()))
    } else {
        router
    };

    // Add state to all routes
    let router = router.with_state(state).layer(TraceLayer::new_for_http());

    // Apply CORS middleware if enabled in config
    if config.server.api.cors_enabled {
        let cors = build_cors_layer(&config.server.api.cors_origins);
        router.layer(cors)
    } else {
        router
    }
}

/// Build a CORS layer based on configured origins
///
/// # Arguments
///
/// * `origins` - List of allowed origins (supports "*" for any origin)
///
/// # Returns
///
/// A configured CorsLayer that allows the specified origins, all methods,
/// and all headers for cross-origin requests.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    // Check if "*" (all origins) is in the list
    let allow_any = origins.iter().any(|o| o == "*");

    if allow_any || origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        // Allow specific origins
        let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Start the API server on the configured bind address.
///
/// Runs until `shutdown` is cancelled, then stops accepting connections and
/// lets in-flight requests finish.
///
/// # Example
///
/// ```no_run
/// use debrid_tracker::{Config, DebridTracker};
/// use std::sync::Arc;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let tracker = Arc::new(DebridTracker::new(Config::default()).await?);
///
/// // Start API server (blocks until the token is cancelled)
/// debrid_tracker::api::start_api_server(tracker, CancellationToken::new()).await?;
/// # Ok(())
/// # }
/// ```
pub async fn start_api_server(
    tracker: Arc<DebridTracker>,
    shutdown: CancellationToken,
) -> Result<()> {
    let config = tracker.config.clone();
    let bind_address = config.server.api.bind_address;

    tracing::info!(
        address = %bind_address,
        "Starting API server"
    );

    // Create the router with all routes
    let app = create_router(tracker, config);

    // Bind TCP listener to the configured address
    let listener = TcpListener::bind(bind_address)
        .await
        .map_err(crate::error::Error::Io)?;

    tracing::info!(
        address = %bind_address,
        "API server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| crate::error::Error::ApiServerError(e.to_string()))?;

    tracing::info!("API server stopped");
    Ok(())
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
