//! CloudWatch log groups.

use async_trait::async_trait;
use aws_sdk_cloudwatchlogs::Client;
use monad_core::provider::LogsApi;
use monad_core::provider::logs::{LogEvent, LogEventPage};
use monad_core::{ProviderResult, Tags};
use std::collections::HashMap;

use crate::error::{OrEmpty, SdkResultExt};

pub struct CloudWatchLogs {
    client: Client,
}

impl CloudWatchLogs {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

fn tag_map(tags: &Tags) -> HashMap<String, String> {
    tags.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
}

#[async_trait]
impl LogsApi for CloudWatchLogs {
    async fn create_log_group(&self, name: &str, tags: &Tags) -> ProviderResult<()> {
        self.client
            .create_log_group()
            .log_group_name(name)
            .set_tags(Some(tag_map(tags)))
            .send()
            .await
            .provider()?;
        Ok(())
    }

    async fn tag_log_group(&self, arn: &str, tags: &Tags) -> ProviderResult<()> {
        self.client
            .tag_resource()
            .resource_arn(arn)
            .set_tags(Some(tag_map(tags)))
            .send()
            .await
            .provider()?;
        Ok(())
    }

    async fn put_retention_policy(&self, name: &str, days: i32) -> ProviderResult<()> {
        self.client
            .put_retention_policy()
            .log_group_name(name)
            .retention_in_days(days)
            .send()
            .await
            .provider()?;
        Ok(())
    }

    async fn delete_log_group(&self, name: &str) -> ProviderResult<()> {
        self.client
            .delete_log_group()
            .log_group_name(name)
            .send()
            .await
            .provider()?;
        Ok(())
    }

    async fn filter_log_events(
        &self,
        name: &str,
        start_time: i64,
        next_token: Option<String>,
    ) -> ProviderResult<LogEventPage> {
        let out = self
            .client
            .filter_log_events()
            .log_group_name(name)
            .start_time(start_time)
            .set_next_token(next_token)
            .send()
            .await
            .provider()?;

        Ok(LogEventPage {
            events: out
                .events()
                .iter()
                .map(|e| LogEvent {
                    timestamp: e.timestamp().unwrap_or_default(),
                    message: e.message().or_empty(),
                })
                .collect(),
            next_token: out.next_token().map(str::to_string),
        })
    }
}
