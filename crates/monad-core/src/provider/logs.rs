//! Log groups.

use async_trait::async_trait;

use crate::{ProviderResult, Tags};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    /// Milliseconds since the epoch.
    pub timestamp: i64,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct LogEventPage {
    pub events: Vec<LogEvent>,
    pub next_token: Option<String>,
}

#[async_trait]
pub trait LogsApi: Send + Sync {
    async fn create_log_group(&self, name: &str, tags: &Tags) -> ProviderResult<()>;

    async fn tag_log_group(&self, arn: &str, tags: &Tags) -> ProviderResult<()>;

    async fn put_retention_policy(&self, name: &str, days: i32) -> ProviderResult<()>;

    async fn delete_log_group(&self, name: &str) -> ProviderResult<()>;

    async fn filter_log_events(
        &self,
        name: &str,
        start_time: i64,
        next_token: Option<String>,
    ) -> ProviderResult<LogEventPage>;
}
