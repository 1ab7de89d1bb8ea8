//! Serverless compute functions.

use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::{Architecture, ProviderResult, Tags};

/// Network attachment of a function. Both lists empty means "no VPC".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkConfig {
    pub subnet_ids: Vec<String>,
    pub security_group_ids: Vec<String>,
}

impl NetworkConfig {
    pub fn is_empty(&self) -> bool {
        self.subnet_ids.is_empty() && self.security_group_ids.is_empty()
    }
}

/// Everything needed to create or reconfigure a function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDefinition {
    pub name: String,
    pub role_arn: String,
    pub image_uri: String,
    pub architecture: Architecture,
    pub memory_size: i32,
    pub timeout: i32,
    pub ephemeral_storage: i32,
    pub environment: BTreeMap<String, String>,
    pub network: NetworkConfig,
    pub log_group: String,
    pub tags: Tags,
}

/// A resource-based policy statement granting another service invoke rights.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permission {
    pub function_name: String,
    pub statement_id: String,
    pub principal: String,
    pub source_arn: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FunctionSummary {
    pub name: String,
    pub arn: String,
    pub tags: Tags,
}

#[async_trait]
pub trait LambdaApi: Send + Sync {
    /// Create a function. An empty network config is omitted from the request.
    async fn create_function(&self, function: &FunctionDefinition) -> ProviderResult<()>;

    /// Reconfigure a function. The network config is always sent, so an
    /// empty one detaches any previous VPC attachment.
    async fn update_function_configuration(
        &self,
        function: &FunctionDefinition,
    ) -> ProviderResult<()>;

    async fn update_function_role(&self, name: &str, role_arn: &str) -> ProviderResult<()>;

    async fn update_function_code(
        &self,
        name: &str,
        image_uri: &str,
        architecture: Architecture,
    ) -> ProviderResult<()>;

    async fn put_function_event_invoke_config(
        &self,
        name: &str,
        maximum_retry_attempts: i32,
    ) -> ProviderResult<()>;

    async fn tag_function(&self, arn: &str, tags: &Tags) -> ProviderResult<()>;

    async fn delete_function(&self, name: &str) -> ProviderResult<()>;

    async fn add_permission(&self, permission: &Permission) -> ProviderResult<()>;

    async fn remove_permission(&self, function_name: &str, statement_id: &str)
    -> ProviderResult<()>;

    /// The function's resource-based policy document, if it has one.
    async fn get_policy(&self, function_name: &str) -> ProviderResult<Option<String>>;

    async fn list_functions(&self) -> ProviderResult<Vec<FunctionSummary>>;
}
