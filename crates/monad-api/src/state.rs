//! Application state.

use std::sync::Arc;

use crate::events::EventHandler;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub handler: Arc<dyn EventHandler>,
}

impl AppState {
    pub fn new(handler: Arc<dyn EventHandler>) -> Self {
        Self { handler }
    }
}
