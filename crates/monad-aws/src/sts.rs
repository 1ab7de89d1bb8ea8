//! Caller identity.

use async_trait::async_trait;
use aws_sdk_sts::Client;
use monad_core::ProviderResult;
use monad_core::provider::{Caller, IdentityApi};

use crate::error::{OrEmpty, SdkResultExt};

pub struct Sts {
    client: Client,
    region: Option<String>,
}

impl Sts {
    /// `region` is the default region reported back with the identity.
    pub fn new(client: Client, region: Option<String>) -> Self {
        Self { client, region }
    }
}

#[async_trait]
impl IdentityApi for Sts {
    async fn caller_identity(&self) -> ProviderResult<Caller> {
        let out = self
            .client
            .get_caller_identity()
            .send()
            .await
            .provider()?;
        Ok(Caller {
            account_id: out.account().or_empty(),
            region: self.region.clone().unwrap_or_default(),
            arn: out.arn().or_empty(),
            user_id: out.user_id().or_empty(),
        })
    }
}
