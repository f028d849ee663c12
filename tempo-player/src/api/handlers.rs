//! HTTP request handlers
//!
//! Control endpoints only enqueue a command and answer 202; the outcome
//! arrives on the event stream.

use crate::api::server::AppContext;
use crate::error::Error;
use crate::library::{self, LibraryEntry};
use crate::playback::StatusSnapshot;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};
use uuid::Uuid;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
    port: u16,
    uptime_secs: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct LoadRequest {
    uri: String,
}

#[derive(Debug, Serialize)]
pub struct LibraryResponse {
    root_folder: String,
    tracks: Vec<LibraryEntry>,
}

type ApiError = (StatusCode, Json<StatusResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(StatusResponse {
            status: format!("error: {}", message.into()),
        }),
    )
}

/// Map a failed command submission to a response
fn command_error(e: Error) -> ApiError {
    match e {
        Error::CoordinatorClosed(_) => {
            error!("{}", e);
            api_error(StatusCode::SERVICE_UNAVAILABLE, e.to_string())
        }
        other => api_error(StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
    }
}

fn accepted() -> (StatusCode, Json<StatusResponse>) {
    (
        StatusCode::ACCEPTED,
        Json(StatusResponse {
            status: "accepted".to_string(),
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /health
pub async fn health(State(ctx): State<AppContext>) -> Json<HealthResponse> {
    let uptime = tempo_common::time::now() - ctx.started_at;
    Json(HealthResponse {
        status: "ok".to_string(),
        module: "tempo-player".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        port: ctx.port,
        uptime_secs: uptime.num_seconds(),
    })
}

/// POST /playback/load
pub async fn load(
    State(ctx): State<AppContext>,
    Json(req): Json<LoadRequest>,
) -> Result<(StatusCode, Json<StatusResponse>), ApiError> {
    let uri = req.uri.trim();
    if uri.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "uri must not be empty"));
    }

    info!("Load request: {}", uri);
    ctx.coordinator.load(uri).map_err(command_error)?;
    Ok(accepted())
}

/// POST /playback/play
pub async fn play(
    State(ctx): State<AppContext>,
) -> Result<(StatusCode, Json<StatusResponse>), ApiError> {
    ctx.coordinator.play().map_err(command_error)?;
    Ok(accepted())
}

/// POST /playback/pause
pub async fn pause(
    State(ctx): State<AppContext>,
) -> Result<(StatusCode, Json<StatusResponse>), ApiError> {
    ctx.coordinator.pause().map_err(command_error)?;
    Ok(accepted())
}

/// POST /playback/stop
pub async fn stop(
    State(ctx): State<AppContext>,
) -> Result<(StatusCode, Json<StatusResponse>), ApiError> {
    ctx.coordinator.stop().map_err(command_error)?;
    Ok(accepted())
}

/// GET /playback/state
pub async fn get_playback_state(
    State(ctx): State<AppContext>,
) -> Result<Json<StatusSnapshot>, ApiError> {
    let snapshot = ctx.coordinator.status().await.map_err(command_error)?;
    Ok(Json(snapshot))
}

/// DELETE /clients/:client_id
///
/// Unknown ids are accepted; the coordinator ignores them.
pub async fn unregister_client(
    State(ctx): State<AppContext>,
    Path(client_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    debug!("Unregister request for client {}", client_id);
    ctx.coordinator.unregister(client_id).map_err(command_error)?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /library
pub async fn list_library(
    State(ctx): State<AppContext>,
) -> Result<Json<LibraryResponse>, ApiError> {
    let root = ctx.root_folder.clone();
    let tracks = tokio::task::spawn_blocking(move || library::scan(&root))
        .await
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .map_err(|e| {
            error!("{}", e);
            api_error(StatusCode::NOT_FOUND, e.to_string())
        })?;

    Ok(Json(LibraryResponse {
        root_folder: ctx.root_folder.to_string_lossy().into_owned(),
        tracks,
    }))
}
