//! Network lookups.

use async_trait::async_trait;

use crate::ProviderResult;

#[async_trait]
pub trait Ec2Api: Send + Sync {
    /// Security group ids whose `group-name` matches any of `names`.
    async fn security_group_ids_by_name(&self, names: &[String]) -> ProviderResult<Vec<String>>;

    /// Subnet ids whose `Name` tag matches any of `names`.
    async fn subnet_ids_by_name(&self, names: &[String]) -> ProviderResult<Vec<String>>;
}
