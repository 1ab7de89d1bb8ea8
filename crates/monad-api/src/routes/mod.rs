//! API routes.

pub mod events;
pub mod health;

use crate::AppState;
use crate::error::ApiError;
use axum::Router;

/// Build the handler router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(events::router())
        .fallback(not_found)
        .with_state(state)
}

async fn not_found() -> ApiError {
    ApiError::NotFound("not found".to_string())
}
