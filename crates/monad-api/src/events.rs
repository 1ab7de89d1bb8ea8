//! Deploy and destroy events.

use async_trait::async_trait;
use monad_config::settings::keys;
use monad_config::{Basis, Config, ConfigResult, Schema, Settings};
use monad_core::provider::Caller;
use monad_core::{Clients, ImageConfig, ImageRef, Result};
use monad_step::Saga;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

/// Request body as delivered by the event source.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type")]
pub enum EventRequest {
    DeployRequest {
        #[serde(rename = "imageUri")]
        image_uri: String,
    },
    DestroyRequest {
        #[serde(rename = "imageUri")]
        image_uri: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Deploy,
    Destroy,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Deploy => "deploy",
            Action::Destroy => "destroy",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub action: Action,
    pub image: ImageRef,
}

impl TryFrom<EventRequest> for Event {
    type Error = monad_core::Error;

    fn try_from(request: EventRequest) -> Result<Self> {
        let (action, uri) = match request {
            EventRequest::DeployRequest { image_uri } => (Action::Deploy, image_uri),
            EventRequest::DestroyRequest { image_uri } => (Action::Destroy, image_uri),
        };
        Ok(Self {
            action,
            image: ImageRef::parse(&uri)?,
        })
    }
}

#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Handle one event, returning the response body.
    async fn handle(&self, event: Event) -> Result<Value>;
}

/// Decode the label schema of an image and rebuild its basis.
pub fn rehydrate(
    image: &ImageRef,
    config: &ImageConfig,
    caller: Caller,
    owner_prefix: bool,
) -> ConfigResult<(Schema, Basis)> {
    let schema = Schema::decode(&config.labels)?;
    let basis = Basis::from_schema(&schema, caller, image, owner_prefix)?;
    Ok((schema, basis))
}

/// Runs the standard saga against real providers.
pub struct SagaHandler {
    clients: Clients,
    settings: Settings,
}

impl SagaHandler {
    pub fn new(clients: Clients, settings: Settings) -> Self {
        Self { clients, settings }
    }
}

#[async_trait]
impl EventHandler for SagaHandler {
    async fn handle(&self, event: Event) -> Result<Value> {
        let clients = &self.clients;
        let caller = clients.identity.caller_identity().await?;
        let image_config = clients.registry.image_config(&event.image).await?;
        let owner_prefix = self.settings.flag(keys::OWNER_PREFIX)?;

        let (schema, basis) = rehydrate(&event.image, &image_config, caller, owner_prefix)?;
        let config = Config::resolve(&basis, &schema, &self.settings, clients).await?;
        info!(action = event.action.as_str(), name = %basis.name(), image = %event.image, "Handling event");

        let saga = Saga::standard(clients, &config);
        match event.action {
            Action::Deploy => saga.mount().await?,
            Action::Destroy => saga.unmount().await?,
        }

        Ok(json!({
            "action": event.action.as_str(),
            "name": basis.name(),
            "path": basis.path(),
            "image": event.image.to_string(),
        }))
    }
}
