//! Caller identity.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::ProviderResult;

/// The principal the provider credentials resolve to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub account_id: String,
    pub region: String,
    pub arn: String,
    pub user_id: String,
}

#[async_trait]
pub trait IdentityApi: Send + Sync {
    /// Resolve the caller's account, ARN and user id, plus the default region.
    async fn caller_identity(&self) -> ProviderResult<Caller>;
}
