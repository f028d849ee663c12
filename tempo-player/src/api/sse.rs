//! Server-Sent Events (SSE) stream
//!
//! Each connection registers a subscriber with the coordinator. Dropping the
//! connection drops the receiver, and the coordinator prunes the client on
//! its next failed delivery.

use crate::api::handlers::StatusResponse;
use crate::api::server::AppContext;
use crate::playback::Subscription;
use axum::{
    extract::State,
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::stream::Stream;
use serde_json::json;
use std::convert::Infallible;
use std::time::Duration;
use tracing::{debug, info, warn};

/// GET /events
pub async fn event_stream(
    State(ctx): State<AppContext>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, (StatusCode, Json<StatusResponse>)> {
    let Subscription { id, mut events } = ctx.coordinator.register().map_err(|e| {
        warn!("SSE subscription refused: {}", e);
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(StatusResponse {
                status: format!("error: {}", e),
            }),
        )
    })?;

    info!("SSE client {} connected", id);

    let stream = async_stream::stream! {
        yield Ok(Event::default()
            .event("Connected")
            .data(json!({ "client_id": id }).to_string()));

        while let Some(event) = events.recv().await {
            match serde_json::to_string(&event) {
                Ok(data) => {
                    debug!("SSE {} -> {}", event.event_type(), id);
                    yield Ok(Event::default().event(event.event_type()).data(data));
                }
                Err(e) => warn!("Failed to serialize event: {}", e),
            }
        }

        debug!("SSE stream for client {} ended", id);
    };

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    ))
}
