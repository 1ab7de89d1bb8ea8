//! Local Docker daemon: image inspection and registry login.

use async_trait::async_trait;
use bollard::Docker;
use bollard::errors::Error as DockerError;
use monad_core::error::codes;
use monad_core::provider::ImageRegistry;
use monad_core::provider::ecr::RegistryCredentials;
use monad_core::{ImageConfig, ImageRef, ProviderError, ProviderResult};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info};

/// Code used for failures talking to the Docker daemon or CLI.
pub const DOCKER_ERROR: &str = "DockerError";

fn docker_error(err: DockerError) -> ProviderError {
    match err {
        DockerError::DockerResponseServerError {
            status_code: 404,
            message,
        } => ProviderError::new(codes::IMAGE_NOT_FOUND, message),
        other => ProviderError::new(DOCKER_ERROR, other.to_string()),
    }
}

/// Reads image configs from images present in the local daemon.
pub struct LocalImages {
    docker: Docker,
}

impl LocalImages {
    /// Connect to the local Docker daemon.
    pub fn new() -> ProviderResult<Self> {
        let docker = Docker::connect_with_local_defaults().map_err(docker_error)?;
        Ok(Self { docker })
    }

    pub fn with_client(docker: Docker) -> Self {
        Self { docker }
    }
}

#[async_trait]
impl ImageRegistry for LocalImages {
    async fn image_config(&self, image: &ImageRef) -> ProviderResult<ImageConfig> {
        let reference = image.to_string();
        debug!(image = %reference, "Inspecting local image");
        let inspect = self
            .docker
            .inspect_image(&reference)
            .await
            .map_err(docker_error)?;

        Ok(ImageConfig {
            architecture: inspect.architecture.unwrap_or_default(),
            os: inspect.os.unwrap_or_default(),
            labels: inspect
                .config
                .and_then(|c| c.labels)
                .map(|labels| labels.into_iter().collect())
                .unwrap_or_default(),
        })
    }
}

/// `docker login` against a registry, feeding the password on stdin.
pub async fn login(credentials: &RegistryCredentials) -> ProviderResult<()> {
    let failed = |e: std::io::Error| ProviderError::new(DOCKER_ERROR, e.to_string());

    let mut child = Command::new("docker")
        .args(["login", "--username", &credentials.username, "--password-stdin"])
        .arg(&credentials.endpoint)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(failed)?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(credentials.password.as_bytes())
            .await
            .map_err(failed)?;
    }

    let output = child.wait_with_output().await.map_err(failed)?;
    if !output.status.success() {
        return Err(ProviderError::new(
            DOCKER_ERROR,
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }
    info!(endpoint = %credentials.endpoint, "Logged in to registry");
    Ok(())
}
