//! The function's log group.

use async_trait::async_trait;
use monad_config::Config;
use monad_config::config::CloudWatchConfig;
use monad_core::error::codes;
use monad_core::provider::LogsApi;
use monad_core::{Result, Step};
use std::sync::Arc;
use tracing::info;

use crate::tolerate;

pub struct CloudWatchStep {
    logs: Arc<dyn LogsApi>,
    config: CloudWatchConfig,
}

impl CloudWatchStep {
    pub fn new(logs: Arc<dyn LogsApi>, config: &Config) -> Self {
        Self {
            logs,
            config: config.cloudwatch.clone(),
        }
    }
}

#[async_trait]
impl Step for CloudWatchStep {
    fn name(&self) -> &'static str {
        "cloudwatch"
    }

    async fn mount(&self) -> Result<()> {
        let c = &self.config;
        let created = tolerate(
            self.logs.create_log_group(&c.name, &c.tags).await,
            &[codes::RESOURCE_ALREADY_EXISTS],
            "log group",
            &c.name,
        )?;
        if created.is_none() {
            self.logs.tag_log_group(&c.arn, &c.tags).await?;
            info!(action = "tag", kind = "log group", name = %c.name);
        }
        self.logs.put_retention_policy(&c.name, c.retention).await?;
        info!(action = "put", kind = "log group", name = %c.name, retention = c.retention);
        Ok(())
    }

    async fn unmount(&self) -> Result<()> {
        let c = &self.config;
        tolerate(
            self.logs.delete_log_group(&c.name).await,
            &[codes::RESOURCE_NOT_FOUND],
            "log group",
            &c.name,
        )?;
        info!(action = "delete", kind = "log group", name = %c.name);
        Ok(())
    }
}
