//! Image config lookup against ECR.
//!
//! The manifest comes from `BatchGetImage`; the config blob is downloaded from
//! the pre-signed layer URL the registry hands out.

use async_trait::async_trait;
use aws_sdk_ecr::Client;
use aws_sdk_ecr::types::ImageIdentifier;
use monad_core::error::codes;
use monad_core::provider::ImageRegistry;
use monad_core::{ImageConfig, ImageRef, ProviderError, ProviderResult};
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::SdkResultExt;

const ACCEPTED_MEDIA_TYPES: &[&str] = &[
    "application/vnd.docker.distribution.manifest.v2+json",
    "application/vnd.docker.distribution.manifest.list.v2+json",
    "application/vnd.oci.image.manifest.v1+json",
    "application/vnd.oci.image.index.v1+json",
];

/// Code used for malformed manifests and config blobs.
pub const INVALID_MANIFEST: &str = "InvalidManifest";

#[derive(Debug, Deserialize)]
struct Manifest {
    config: Option<Descriptor>,
    #[serde(default)]
    manifests: Vec<Descriptor>,
}

#[derive(Debug, Deserialize)]
struct Descriptor {
    digest: String,
    platform: Option<Platform>,
}

#[derive(Debug, Deserialize)]
struct Platform {
    architecture: String,
    os: String,
}

#[derive(Debug, Deserialize)]
struct ConfigBlob {
    #[serde(default)]
    architecture: String,
    #[serde(default)]
    os: String,
    #[serde(default)]
    config: ContainerConfig,
}

#[derive(Debug, Default, Deserialize)]
struct ContainerConfig {
    #[serde(rename = "Labels", default)]
    labels: Option<BTreeMap<String, String>>,
}

/// What a manifest points at next.
#[derive(Debug, PartialEq, Eq)]
enum Next {
    /// A single-platform manifest: fetch this config blob.
    Config(String),
    /// An index: fetch the manifest for this platform digest.
    Manifest(String),
}

fn invalid(message: impl Into<String>) -> ProviderError {
    ProviderError::new(INVALID_MANIFEST, message)
}

fn next(manifest: &str) -> ProviderResult<Next> {
    let manifest: Manifest = serde_json::from_str(manifest)
        .map_err(|e| invalid(format!("unreadable manifest: {}", e)))?;

    if let Some(config) = manifest.config {
        return Ok(Next::Config(config.digest));
    }

    // Attestation entries carry platform unknown/unknown.
    manifest
        .manifests
        .into_iter()
        .find(|m| {
            m.platform
                .as_ref()
                .is_some_and(|p| p.os == "linux" && p.architecture != "unknown")
        })
        .map(|m| Next::Manifest(m.digest))
        .ok_or_else(|| invalid("manifest has neither a config nor a linux platform"))
}

fn image_config(blob: &[u8]) -> ProviderResult<ImageConfig> {
    let blob: ConfigBlob = serde_json::from_slice(blob)
        .map_err(|e| invalid(format!("unreadable image config: {}", e)))?;
    Ok(ImageConfig {
        architecture: blob.architecture,
        os: blob.os,
        labels: blob.config.labels.unwrap_or_default(),
    })
}

pub struct EcrImageRegistry {
    client: Client,
    http: reqwest::Client,
}

impl EcrImageRegistry {
    pub fn new(client: Client) -> Self {
        Self::with_http(client, reqwest::Client::new())
    }

    pub fn with_http(client: Client, http: reqwest::Client) -> Self {
        Self { client, http }
    }

    async fn manifest(
        &self,
        registry_id: &str,
        repository: &str,
        id: ImageIdentifier,
    ) -> ProviderResult<String> {
        let request = self
            .client
            .batch_get_image()
            .registry_id(registry_id)
            .repository_name(repository)
            .image_ids(id);
        let request = ACCEPTED_MEDIA_TYPES
            .iter()
            .fold(request, |r, t| r.accepted_media_types(*t));
        let out = request.send().await.provider()?;

        if let Some(failure) = out.failures().first() {
            return Err(ProviderError::new(
                codes::IMAGE_NOT_FOUND,
                failure.failure_reason().unwrap_or("image not found"),
            ));
        }
        out.images()
            .first()
            .and_then(|i| i.image_manifest())
            .map(str::to_string)
            .ok_or_else(|| ProviderError::new(codes::IMAGE_NOT_FOUND, "image has no manifest"))
    }

    async fn blob(
        &self,
        registry_id: &str,
        repository: &str,
        digest: &str,
    ) -> ProviderResult<Vec<u8>> {
        let out = self
            .client
            .get_download_url_for_layer()
            .registry_id(registry_id)
            .repository_name(repository)
            .layer_digest(digest)
            .send()
            .await
            .provider()?;
        let url = out
            .download_url()
            .ok_or_else(|| invalid(format!("no download url for {}", digest)))?;

        let response = self
            .http
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| ProviderError::new("HttpError", e.to_string()))?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ProviderError::new("HttpError", e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl ImageRegistry for EcrImageRegistry {
    async fn image_config(&self, image: &ImageRef) -> ProviderResult<ImageConfig> {
        let registry_id = image.registry_id().ok_or_else(|| {
            ProviderError::new(
                codes::REPOSITORY_NOT_FOUND,
                format!("not an ECR registry: {}", image.registry),
            )
        })?;
        let repository = image.repository.as_str();

        let id = match (&image.digest, &image.tag) {
            (Some(digest), _) => ImageIdentifier::builder().image_digest(digest).build(),
            (None, tag) => ImageIdentifier::builder().set_image_tag(tag.clone()).build(),
        };
        debug!(image = %image, "Fetching manifest");
        let mut manifest = self.manifest(registry_id, repository, id).await?;

        // An index resolves to at most one platform manifest.
        for _ in 0..2 {
            match next(&manifest)? {
                Next::Config(digest) => {
                    let blob = self.blob(registry_id, repository, &digest).await?;
                    return image_config(&blob);
                }
                Next::Manifest(digest) => {
                    debug!(%digest, "Following index to platform manifest");
                    let id = ImageIdentifier::builder().image_digest(digest).build();
                    manifest = self.manifest(registry_id, repository, id).await?;
                }
            }
        }
        Err(invalid("nested image index"))
    }
}
