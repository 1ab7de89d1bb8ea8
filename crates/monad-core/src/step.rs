//! The reconciler trait.

use async_trait::async_trait;

use crate::Result;

/// One resource kind driven to a desired state.
///
/// `mount` creates or updates the resource and is idempotent. `unmount`
/// deletes the resource and its children and treats "not found" as success.
#[async_trait]
pub trait Step: Send + Sync {
    /// Name of this step, used in logs.
    fn name(&self) -> &'static str;

    async fn mount(&self) -> Result<()>;

    async fn unmount(&self) -> Result<()>;
}
