//! Image metadata lookup.

use async_trait::async_trait;

use crate::{ImageConfig, ImageRef, ProviderResult};

#[async_trait]
pub trait ImageRegistry: Send + Sync {
    /// Fetch the config (architecture and labels) of a single-platform image.
    async fn image_config(&self, image: &ImageRef) -> ProviderResult<ImageConfig>;
}
