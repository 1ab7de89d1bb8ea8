//! Image repository configuration.

use monad_core::{Tags, ValidationErrors};

use crate::{Basis, ConfigResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EcrConfig {
    pub registry_id: String,
    pub region: String,
    pub image_path: String,
    /// Empty when the image is pinned by digest alone.
    pub image_tag: String,
    pub image_digest: Option<String>,
    pub tags: Tags,
}

impl EcrConfig {
    pub fn resolve(basis: &Basis) -> ConfigResult<Self> {
        let (image_path, image_tag) = basis.registry.image_parts();
        let config = Self {
            registry_id: basis.registry_id().to_string(),
            region: basis.registry_region().to_string(),
            image_path: image_path.to_string(),
            image_tag: image_tag.to_string(),
            image_digest: basis.registry.image_digest().map(str::to_string),
            tags: basis.tags().clone(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require("registry id", &self.registry_id);
        errors.require("registry region", &self.region);
        errors.require("image path", &self.image_path);
        if self.image_digest.is_none() {
            errors.require("image tag", &self.image_tag);
        }
        errors.into_result()
    }
}
