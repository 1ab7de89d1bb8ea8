//! Security group and subnet lookups.

use async_trait::async_trait;
use aws_sdk_ec2::Client;
use aws_sdk_ec2::types::Filter;
use monad_core::ProviderResult;
use monad_core::provider::Ec2Api;

use crate::error::{OrEmpty, SdkResultExt};

pub struct Ec2 {
    client: Client,
}

impl Ec2 {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

fn filter(name: &str, values: &[String]) -> Filter {
    Filter::builder()
        .name(name)
        .set_values(Some(values.to_vec()))
        .build()
}

#[async_trait]
impl Ec2Api for Ec2 {
    async fn security_group_ids_by_name(&self, names: &[String]) -> ProviderResult<Vec<String>> {
        let out = self
            .client
            .describe_security_groups()
            .filters(filter("group-name", names))
            .send()
            .await
            .provider()?;
        Ok(out
            .security_groups()
            .iter()
            .map(|g| g.group_id().or_empty())
            .filter(|id| !id.is_empty())
            .collect())
    }

    async fn subnet_ids_by_name(&self, names: &[String]) -> ProviderResult<Vec<String>> {
        let out = self
            .client
            .describe_subnets()
            .filters(filter("tag:Name", names))
            .send()
            .await
            .provider()?;
        Ok(out
            .subnets()
            .iter()
            .map(|s| s.subnet_id().or_empty())
            .filter(|id| !id.is_empty())
            .collect())
    }
}
