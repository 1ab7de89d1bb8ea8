//! Container registry repositories.

use async_trait::async_trait;

use crate::{ProviderResult, Tags};

/// A registry authorization token as returned by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationToken {
    /// base64 of `user:password`.
    pub token: String,
    pub proxy_endpoint: String,
}

/// Decoded registry credentials, ready for `docker login`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryCredentials {
    pub endpoint: String,
    pub username: String,
    pub password: String,
}

#[async_trait]
pub trait EcrApi: Send + Sync {
    async fn create_repository(
        &self,
        registry_id: &str,
        name: &str,
        tags: &Tags,
    ) -> ProviderResult<()>;

    async fn delete_repository(&self, registry_id: &str, name: &str) -> ProviderResult<()>;

    async fn authorization_token(&self, registry_id: &str) -> ProviderResult<AuthorizationToken>;

    /// Remove a tag from a repository.
    async fn untag_image(&self, registry_id: &str, name: &str, tag: &str) -> ProviderResult<()>;
}
