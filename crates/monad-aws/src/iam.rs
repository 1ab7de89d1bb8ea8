//! IAM roles and managed policies.

use async_trait::async_trait;
use aws_sdk_iam::Client;
use aws_sdk_iam::types::Tag;
use monad_core::provider::IamApi;
use monad_core::provider::iam::PolicyVersion;
use monad_core::{ProviderResult, Tags};

use crate::error::{OrEmpty, SdkResultExt, build_error};

pub struct Iam {
    client: Client,
}

impl Iam {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

fn iam_tags(tags: &Tags) -> ProviderResult<Vec<Tag>> {
    tags.iter()
        .map(|(k, v)| Tag::builder().key(k).value(v).build().map_err(build_error))
        .collect()
}

#[async_trait]
impl IamApi for Iam {
    async fn create_policy(&self, name: &str, document: &str, tags: &Tags) -> ProviderResult<()> {
        self.client
            .create_policy()
            .policy_name(name)
            .policy_document(document)
            .set_tags(Some(iam_tags(tags)?))
            .send()
            .await
            .provider()?;
        Ok(())
    }

    async fn list_policy_versions(&self, policy_arn: &str) -> ProviderResult<Vec<PolicyVersion>> {
        let out = self
            .client
            .list_policy_versions()
            .policy_arn(policy_arn)
            .send()
            .await
            .provider()?;
        Ok(out
            .versions()
            .iter()
            .map(|v| PolicyVersion {
                version_id: v.version_id().or_empty(),
                is_default: v.is_default_version(),
            })
            .collect())
    }

    async fn create_policy_version(&self, policy_arn: &str, document: &str) -> ProviderResult<()> {
        self.client
            .create_policy_version()
            .policy_arn(policy_arn)
            .policy_document(document)
            .set_as_default(true)
            .send()
            .await
            .provider()?;
        Ok(())
    }

    async fn delete_policy_version(
        &self,
        policy_arn: &str,
        version_id: &str,
    ) -> ProviderResult<()> {
        self.client
            .delete_policy_version()
            .policy_arn(policy_arn)
            .version_id(version_id)
            .send()
            .await
            .provider()?;
        Ok(())
    }

    async fn delete_policy(&self, policy_arn: &str) -> ProviderResult<()> {
        self.client
            .delete_policy()
            .policy_arn(policy_arn)
            .send()
            .await
            .provider()?;
        Ok(())
    }

    async fn tag_policy(&self, policy_arn: &str, tags: &Tags) -> ProviderResult<()> {
        self.client
            .tag_policy()
            .policy_arn(policy_arn)
            .set_tags(Some(iam_tags(tags)?))
            .send()
            .await
            .provider()?;
        Ok(())
    }

    async fn create_role(
        &self,
        name: &str,
        assume_role_document: &str,
        tags: &Tags,
    ) -> ProviderResult<()> {
        self.client
            .create_role()
            .role_name(name)
            .assume_role_policy_document(assume_role_document)
            .set_tags(Some(iam_tags(tags)?))
            .send()
            .await
            .provider()?;
        Ok(())
    }

    async fn update_assume_role_policy(&self, name: &str, document: &str) -> ProviderResult<()> {
        self.client
            .update_assume_role_policy()
            .role_name(name)
            .policy_document(document)
            .send()
            .await
            .provider()?;
        Ok(())
    }

    async fn tag_role(&self, name: &str, tags: &Tags) -> ProviderResult<()> {
        self.client
            .tag_role()
            .role_name(name)
            .set_tags(Some(iam_tags(tags)?))
            .send()
            .await
            .provider()?;
        Ok(())
    }

    async fn delete_role(&self, name: &str) -> ProviderResult<()> {
        self.client
            .delete_role()
            .role_name(name)
            .send()
            .await
            .provider()?;
        Ok(())
    }

    async fn attach_role_policy(&self, role: &str, policy_arn: &str) -> ProviderResult<()> {
        self.client
            .attach_role_policy()
            .role_name(role)
            .policy_arn(policy_arn)
            .send()
            .await
            .provider()?;
        Ok(())
    }

    async fn detach_role_policy(&self, role: &str, policy_arn: &str) -> ProviderResult<()> {
        self.client
            .detach_role_policy()
            .role_name(role)
            .policy_arn(policy_arn)
            .send()
            .await
            .provider()?;
        Ok(())
    }

    async fn put_role_permissions_boundary(
        &self,
        role: &str,
        policy_arn: &str,
    ) -> ProviderResult<()> {
        self.client
            .put_role_permissions_boundary()
            .role_name(role)
            .permissions_boundary(policy_arn)
            .send()
            .await
            .provider()?;
        Ok(())
    }

    async fn delete_role_permissions_boundary(&self, role: &str) -> ProviderResult<()> {
        self.client
            .delete_role_permissions_boundary()
            .role_name(role)
            .send()
            .await
            .provider()?;
        Ok(())
    }
}
