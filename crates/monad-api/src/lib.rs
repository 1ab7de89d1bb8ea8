//! HTTP event handler for monad.
//!
//! Accepts deploy and destroy events naming a pushed image, rehydrates the
//! service from the image labels and drives the deploy saga.

pub mod error;
pub mod events;
pub mod routes;
pub mod state;

pub use events::{Action, Event, EventHandler, SagaHandler};
pub use state::AppState;
