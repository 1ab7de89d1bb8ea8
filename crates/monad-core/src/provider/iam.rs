//! Identity and access management.

use async_trait::async_trait;

use crate::{ProviderResult, Tags};

/// One stored version of a managed policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyVersion {
    pub version_id: String,
    pub is_default: bool,
}

#[async_trait]
pub trait IamApi: Send + Sync {
    async fn create_policy(&self, name: &str, document: &str, tags: &Tags) -> ProviderResult<()>;

    async fn list_policy_versions(&self, policy_arn: &str) -> ProviderResult<Vec<PolicyVersion>>;

    /// Create a new version and make it the default.
    async fn create_policy_version(&self, policy_arn: &str, document: &str) -> ProviderResult<()>;

    async fn delete_policy_version(&self, policy_arn: &str, version_id: &str)
    -> ProviderResult<()>;

    async fn delete_policy(&self, policy_arn: &str) -> ProviderResult<()>;

    async fn tag_policy(&self, policy_arn: &str, tags: &Tags) -> ProviderResult<()>;

    async fn create_role(
        &self,
        name: &str,
        assume_role_document: &str,
        tags: &Tags,
    ) -> ProviderResult<()>;

    async fn update_assume_role_policy(&self, name: &str, document: &str) -> ProviderResult<()>;

    async fn tag_role(&self, name: &str, tags: &Tags) -> ProviderResult<()>;

    async fn delete_role(&self, name: &str) -> ProviderResult<()>;

    async fn attach_role_policy(&self, role: &str, policy_arn: &str) -> ProviderResult<()>;

    async fn detach_role_policy(&self, role: &str, policy_arn: &str) -> ProviderResult<()>;

    async fn put_role_permissions_boundary(
        &self,
        role: &str,
        policy_arn: &str,
    ) -> ProviderResult<()>;

    async fn delete_role_permissions_boundary(&self, role: &str) -> ProviderResult<()>;
}
