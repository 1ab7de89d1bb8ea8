//! Execution roles and the service policy.

use async_trait::async_trait;
use monad_config::Config;
use monad_config::config::IamConfig;
use monad_core::error::codes;
use monad_core::provider::IamApi;
use monad_core::{ProviderResult, Result, Step, Tags};
use std::sync::Arc;
use tracing::info;

use crate::tolerate;

pub struct IamStep {
    iam: Arc<dyn IamApi>,
    config: IamConfig,
}

impl IamStep {
    pub fn new(iam: Arc<dyn IamApi>, config: &Config) -> Self {
        Self {
            iam,
            config: config.iam.clone(),
        }
    }

    /// Create a role, or refresh its trust policy and tags when it exists.
    async fn put_role(&self, name: &str, document: &str) -> ProviderResult<()> {
        let created = tolerate(
            self.iam.create_role(name, document, &self.config.tags).await,
            &[codes::ENTITY_ALREADY_EXISTS],
            "role",
            name,
        )?;
        if created.is_none() {
            self.iam.update_assume_role_policy(name, document).await?;
            self.iam.tag_role(name, &self.config.tags).await?;
        }
        info!(action = "put", kind = "role", name = %name);
        Ok(())
    }

    /// Create the shared network role if missing. An existing one is left as is.
    async fn ensure_shared_role(&self, name: &str, document: &str) -> ProviderResult<()> {
        let tags = Tags::from([("Monad".to_string(), "true".to_string())]);
        tolerate(
            self.iam.create_role(name, document, &tags).await,
            &[codes::ENTITY_ALREADY_EXISTS],
            "role",
            name,
        )?;
        info!(action = "put", kind = "role", name = %name);
        Ok(())
    }

    async fn put_policy(&self) -> ProviderResult<()> {
        let c = &self.config;
        let created = tolerate(
            self.iam
                .create_policy(&c.policy_name, &c.policy_document, &c.tags)
                .await,
            &[codes::ENTITY_ALREADY_EXISTS],
            "policy",
            &c.policy_name,
        )?;
        if created.is_none() {
            self.prune_versions().await?;
            self.iam
                .create_policy_version(&c.policy_arn, &c.policy_document)
                .await?;
            self.iam.tag_policy(&c.policy_arn, &c.tags).await?;
        }
        info!(action = "put", kind = "policy", name = %c.policy_name);
        Ok(())
    }

    /// Delete every non-default policy version.
    async fn prune_versions(&self) -> ProviderResult<()> {
        let arn = &self.config.policy_arn;
        let versions = self.iam.list_policy_versions(arn).await?;
        for version in versions.iter().filter(|v| !v.is_default) {
            tolerate(
                self.iam.delete_policy_version(arn, &version.version_id).await,
                &[codes::NO_SUCH_ENTITY],
                "policy version",
                &version.version_id,
            )?;
        }
        Ok(())
    }

    async fn attach(&self) -> ProviderResult<()> {
        let c = &self.config;
        self.iam
            .attach_role_policy(&c.eni_role_name, &c.eni_role_policy_arn)
            .await?;
        self.iam
            .attach_role_policy(&c.role_name, &c.policy_arn)
            .await?;
        info!(action = "attach", kind = "policy", name = %c.policy_name);

        if c.has_boundary() {
            self.iam
                .put_role_permissions_boundary(&c.role_name, &c.boundary_policy_arn)
                .await?;
            info!(action = "attach", kind = "boundary", name = %c.boundary_policy_name);
        } else {
            tolerate(
                self.iam.delete_role_permissions_boundary(&c.role_name).await,
                &[codes::NO_SUCH_ENTITY],
                "boundary",
                &c.role_name,
            )?;
        }
        Ok(())
    }
}

#[async_trait]
impl Step for IamStep {
    fn name(&self) -> &'static str {
        "iam"
    }

    async fn mount(&self) -> Result<()> {
        let c = &self.config;
        self.ensure_shared_role(&c.eni_role_name, &c.eni_role_document)
            .await?;
        self.put_policy().await?;
        self.put_role(&c.role_name, &c.role_document).await?;
        self.attach().await?;
        Ok(())
    }

    /// The shared network role stays; other services may still use it.
    async fn unmount(&self) -> Result<()> {
        let c = &self.config;
        let gone = &[codes::NO_SUCH_ENTITY];

        tolerate(
            self.iam.delete_role_permissions_boundary(&c.role_name).await,
            gone,
            "boundary",
            &c.role_name,
        )?;
        tolerate(
            self.iam.detach_role_policy(&c.role_name, &c.policy_arn).await,
            gone,
            "policy",
            &c.policy_name,
        )?;
        info!(action = "detach", kind = "policy", name = %c.policy_name);

        tolerate(self.iam.delete_role(&c.role_name).await, gone, "role", &c.role_name)?;
        info!(action = "delete", kind = "role", name = %c.role_name);

        tolerate(self.prune_versions().await, gone, "policy", &c.policy_name)?;
        tolerate(
            self.iam.delete_policy(&c.policy_arn).await,
            gone,
            "policy",
            &c.policy_name,
        )?;
        info!(action = "delete", kind = "policy", name = %c.policy_name);
        Ok(())
    }
}
