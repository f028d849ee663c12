//! HTTP server setup and routing

use crate::error::{Error, Result};
use crate::playback::CoordinatorHandle;
use axum::{
    routing::{delete, get, post},
    Router,
};
use chrono::{DateTime, Utc};
use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared application context passed to all handlers
#[derive(Clone)]
pub struct AppContext {
    pub coordinator: CoordinatorHandle,
    /// Folder listed by `GET /library`
    pub root_folder: PathBuf,
    pub port: u16,
    pub started_at: DateTime<Utc>,
}

impl AppContext {
    pub fn new(coordinator: CoordinatorHandle, root_folder: PathBuf, port: u16) -> Self {
        Self {
            coordinator,
            root_folder,
            port,
            started_at: tempo_common::time::now(),
        }
    }
}

/// Build the router with all routes
pub fn create_router(ctx: AppContext) -> Router {
    Router::new()
        .route("/health", get(super::handlers::health))

        // Event stream and subscriber management
        .route("/events", get(super::sse::event_stream))
        .route("/clients/:client_id", delete(super::handlers::unregister_client))

        // Playback control
        .route("/playback/load", post(super::handlers::load))
        .route("/playback/play", post(super::handlers::play))
        .route("/playback/pause", post(super::handlers::pause))
        .route("/playback/stop", post(super::handlers::stop))
        .route("/playback/state", get(super::handlers::get_playback_state))

        // Media library
        .route("/library", get(super::handlers::list_library))

        .with_state(ctx)
        .layer(TraceLayer::new_for_http())
        // Enable CORS for local access
        .layer(CorsLayer::permissive())
}

/// Serve the API until `shutdown` resolves
pub async fn run(ctx: AppContext, shutdown: impl Future<Output = ()> + Send + 'static) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], ctx.port));
    let app = create_router(ctx);

    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Http(format!("Failed to bind to {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| Error::Http(format!("Server error: {}", e)))?;

    info!("HTTP server stopped");
    Ok(())
}
