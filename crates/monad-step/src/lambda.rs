//! The function itself.

use async_trait::async_trait;
use monad_config::Config;
use monad_core::error::codes;
use monad_core::provider::lambda::FunctionDefinition;
use monad_core::provider::{ImageRegistry, LambdaApi};
use monad_core::{Architecture, ImageRef, Result, Step, Tags};
use std::sync::Arc;
use tracing::{debug, info};

use crate::retry::{RetryPolicy, with_backoff};
use crate::tolerate;

pub struct LambdaStep {
    lambda: Arc<dyn LambdaApi>,
    registry: Arc<dyn ImageRegistry>,
    image: ImageRef,
    /// Attached to the network role; the main role is switched in after create.
    function: FunctionDefinition,
    arn: String,
    role_arn: String,
    retries: i32,
    tags: Tags,
    retry: RetryPolicy,
}

impl LambdaStep {
    pub fn new(
        lambda: Arc<dyn LambdaApi>,
        registry: Arc<dyn ImageRegistry>,
        config: &Config,
    ) -> Self {
        let c = &config.lambda;
        let function = FunctionDefinition {
            name: c.function_name.clone(),
            role_arn: config.iam.eni_role_arn.clone(),
            image_uri: c.image_uri.clone(),
            // Replaced by the image's architecture on mount.
            architecture: Architecture::X86_64,
            memory_size: c.memory_size,
            timeout: c.timeout,
            ephemeral_storage: c.ephemeral_storage,
            environment: c.env.clone(),
            network: config.vpc.network(),
            log_group: config.cloudwatch.name.clone(),
            tags: c.tags.clone(),
        };
        Self {
            lambda,
            registry,
            image: c.image.clone(),
            function,
            arn: c.function_arn.clone(),
            role_arn: config.iam.role_arn.clone(),
            retries: c.retries,
            tags: c.tags.clone(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn architecture(&self) -> Result<Architecture> {
        let image = self.registry.image_config(&self.image).await?;
        debug!(image = %self.image, architecture = %image.architecture, "Read image config");
        Architecture::from_platform(&image.architecture)
    }
}

#[async_trait]
impl Step for LambdaStep {
    fn name(&self) -> &'static str {
        "lambda"
    }

    async fn mount(&self) -> Result<()> {
        let function = FunctionDefinition {
            architecture: self.architecture().await?,
            ..self.function.clone()
        };
        let name = function.name.as_str();
        let lambda = self.lambda.as_ref();

        // A new role may not be assumable yet.
        let created = tolerate(
            with_backoff(&self.retry, &[codes::INVALID_PARAMETER_VALUE], || {
                lambda.create_function(&function)
            })
            .await,
            &[codes::RESOURCE_CONFLICT],
            "function",
            name,
        )?;
        if created.is_some() {
            info!(action = "put", kind = "function", name = %name, "Created function");
        }

        // Each update waits for the previous one to settle.
        let busy = &[codes::RESOURCE_CONFLICT];
        with_backoff(&self.retry, busy, || {
            lambda.update_function_configuration(&function)
        })
        .await?;
        with_backoff(&self.retry, busy, || {
            lambda.update_function_code(name, &function.image_uri, function.architecture)
        })
        .await?;
        with_backoff(&self.retry, busy, || {
            lambda.update_function_role(name, &self.role_arn)
        })
        .await?;
        with_backoff(&self.retry, busy, || {
            lambda.put_function_event_invoke_config(name, self.retries)
        })
        .await?;
        info!(action = "put", kind = "function", name = %name, architecture = %function.architecture);

        lambda.tag_function(&self.arn, &self.tags).await?;
        info!(action = "tag", kind = "function", name = %name);
        Ok(())
    }

    async fn unmount(&self) -> Result<()> {
        let name = &self.function.name;
        tolerate(
            self.lambda.delete_function(name).await,
            &[codes::RESOURCE_NOT_FOUND],
            "function",
            name,
        )?;
        info!(action = "delete", kind = "function", name = %name);
        Ok(())
    }
}
