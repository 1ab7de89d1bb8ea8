//! Deploy and destroy event endpoint.

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::post;
use tracing::{error, info};

use crate::AppState;
use crate::error::{ApiError, envelope};
use crate::events::{Event, EventRequest};

pub fn router() -> Router<AppState> {
    Router::new().route("/events", post(handle_event))
}

async fn handle_event(State(state): State<AppState>, body: Bytes) -> Result<Response, ApiError> {
    let request: EventRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid event: {}", e)))?;
    let event =
        Event::try_from(request).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let action = event.action.as_str();
    let image = event.image.to_string();
    info!(action, image = %image, "Received event");

    match state.handler.handle(event).await {
        Ok(body) => Ok(envelope(StatusCode::OK, body)),
        Err(e) => {
            error!(action, image = %image, err = %e, "Event failed");
            Err(e.into())
        }
    }
}
