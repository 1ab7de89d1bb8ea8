//! ECR repositories and registry credentials.

use async_trait::async_trait;
use aws_sdk_ecr::Client;
use aws_sdk_ecr::types::{ImageIdentifier, Tag};
use monad_core::error::codes;
use monad_core::provider::EcrApi;
use monad_core::provider::ecr::AuthorizationToken;
use monad_core::{ProviderError, ProviderResult, Tags};

use crate::error::{OrEmpty, SdkResultExt, build_error};

pub struct Ecr {
    client: Client,
}

impl Ecr {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EcrApi for Ecr {
    async fn create_repository(
        &self,
        registry_id: &str,
        name: &str,
        tags: &Tags,
    ) -> ProviderResult<()> {
        let tags = tags
            .iter()
            .map(|(k, v)| Tag::builder().key(k).value(v).build().map_err(build_error))
            .collect::<ProviderResult<Vec<_>>>()?;
        self.client
            .create_repository()
            .registry_id(registry_id)
            .repository_name(name)
            .set_tags(Some(tags))
            .send()
            .await
            .provider()?;
        Ok(())
    }

    async fn delete_repository(&self, registry_id: &str, name: &str) -> ProviderResult<()> {
        self.client
            .delete_repository()
            .registry_id(registry_id)
            .repository_name(name)
            .force(true)
            .send()
            .await
            .provider()?;
        Ok(())
    }

    async fn authorization_token(&self, registry_id: &str) -> ProviderResult<AuthorizationToken> {
        #[allow(deprecated)]
        let out = self
            .client
            .get_authorization_token()
            .registry_ids(registry_id)
            .send()
            .await
            .provider()?;

        let data = out.authorization_data().first().ok_or_else(|| {
            ProviderError::new(
                codes::REPOSITORY_NOT_FOUND,
                format!("no authorization data for registry {}", registry_id),
            )
        })?;
        Ok(AuthorizationToken {
            token: data.authorization_token().or_empty(),
            proxy_endpoint: data.proxy_endpoint().or_empty(),
        })
    }

    async fn untag_image(&self, registry_id: &str, name: &str, tag: &str) -> ProviderResult<()> {
        let out = self
            .client
            .batch_delete_image()
            .registry_id(registry_id)
            .repository_name(name)
            .image_ids(ImageIdentifier::builder().image_tag(tag).build())
            .send()
            .await
            .provider()?;

        if let Some(failure) = out.failures().first() {
            let code = match failure.failure_code().map(|c| c.as_str()) {
                Some("ImageNotFound") | Some("ImageTagDoesNotMatchDigest") => {
                    codes::IMAGE_NOT_FOUND.to_string()
                }
                Some(other) => other.to_string(),
                None => String::new(),
            };
            return Err(ProviderError::new(code, failure.failure_reason().or_empty()));
        }
        Ok(())
    }
}
