//! The service's image repository.
//!
//! Not part of the deploy saga; driven directly by the `ecr` commands.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use monad_config::Config;
use monad_config::config::EcrConfig;
use monad_core::error::codes;
use monad_core::provider::EcrApi;
use monad_core::provider::ecr::RegistryCredentials;
use monad_core::{Error, Result, Step};
use std::sync::Arc;
use tracing::info;

use crate::tolerate;

pub struct EcrStep {
    ecr: Arc<dyn EcrApi>,
    config: EcrConfig,
}

impl EcrStep {
    pub fn new(ecr: Arc<dyn EcrApi>, config: &Config) -> Self {
        Self::with_config(ecr, config.ecr.clone())
    }

    /// The repository needs only the basis, not a full config.
    pub fn with_config(ecr: Arc<dyn EcrApi>, config: EcrConfig) -> Self {
        Self { ecr, config }
    }

    /// Fetch and decode registry credentials for `docker login`.
    pub async fn login(&self) -> Result<RegistryCredentials> {
        let token = self
            .ecr
            .authorization_token(&self.config.registry_id)
            .await?;
        let decoded = STANDARD
            .decode(token.token.trim())
            .map_err(|e| Error::Internal(format!("invalid authorization token: {}", e)))?;
        let decoded = String::from_utf8(decoded)
            .map_err(|e| Error::Internal(format!("invalid authorization token: {}", e)))?;
        let (username, password) = decoded
            .split_once(':')
            .ok_or_else(|| Error::Internal("authorization token is not user:password".into()))?;

        Ok(RegistryCredentials {
            endpoint: token.proxy_endpoint,
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    /// Remove `tag` (default: the current branch tag) from the repository.
    pub async fn untag(&self, tag: Option<&str>) -> Result<()> {
        let c = &self.config;
        let tag = tag.unwrap_or(&c.image_tag);
        if tag.is_empty() {
            return Err(Error::InvalidInput(format!(
                "{} has no tag to remove",
                c.image_path
            )));
        }
        tolerate(
            self.ecr.untag_image(&c.registry_id, &c.image_path, tag).await,
            &[codes::IMAGE_NOT_FOUND],
            "image tag",
            tag,
        )?;
        info!(action = "delete", kind = "image tag", name = %format!("{}:{}", c.image_path, tag));
        Ok(())
    }
}

#[async_trait]
impl Step for EcrStep {
    fn name(&self) -> &'static str {
        "ecr"
    }

    async fn mount(&self) -> Result<()> {
        let c = &self.config;
        tolerate(
            self.ecr
                .create_repository(&c.registry_id, &c.image_path, &c.tags)
                .await,
            &[codes::REPOSITORY_ALREADY_EXISTS],
            "repository",
            &c.image_path,
        )?;
        info!(action = "put", kind = "repository", name = %c.image_path);
        Ok(())
    }

    async fn unmount(&self) -> Result<()> {
        let c = &self.config;
        tolerate(
            self.ecr.delete_repository(&c.registry_id, &c.image_path).await,
            &[codes::REPOSITORY_NOT_FOUND],
            "repository",
            &c.image_path,
        )?;
        info!(action = "delete", kind = "repository", name = %c.image_path);
        Ok(())
    }
}
