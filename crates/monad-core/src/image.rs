//! Container image references and the metadata read from an image config.

use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{Error, Result};

/// CPU architecture of a function, as the compute service names it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum Architecture {
    #[display("x86_64")]
    X86_64,
    #[display("arm64")]
    Arm64,
}

impl Architecture {
    /// Map an OCI platform architecture (`amd64`, `arm64`) to a function architecture.
    pub fn from_platform(platform: &str) -> Result<Self> {
        match platform {
            "amd64" => Ok(Self::X86_64),
            "arm64" => Ok(Self::Arm64),
            other => Err(Error::UnsupportedArchitecture(other.to_string())),
        }
    }
}

/// Metadata read from an image's config blob.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageConfig {
    pub architecture: String,
    pub os: String,
    pub labels: BTreeMap<String, String>,
}

/// A parsed image reference: `{registry}/{repository}[:tag][@digest]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageRef {
    pub registry: String,
    pub repository: String,
    pub tag: Option<String>,
    pub digest: Option<String>,
}

impl ImageRef {
    pub fn parse(uri: &str) -> Result<Self> {
        let invalid = || Error::InvalidInput(format!("invalid image uri: {}", uri));

        let (registry, rest) = uri.split_once('/').ok_or_else(invalid)?;
        if registry.is_empty() || !registry.contains('.') {
            return Err(invalid());
        }

        let (rest, digest) = match rest.split_once('@') {
            Some((rest, digest)) => (rest, Some(digest.to_string())),
            None => (rest, None),
        };

        // A colon after the last slash separates the tag.
        let last_slash = rest.rfind('/').map(|i| i + 1).unwrap_or(0);
        let (repository, tag) = match rest[last_slash..].find(':') {
            Some(i) => (
                &rest[..last_slash + i],
                Some(rest[last_slash + i + 1..].to_string()),
            ),
            None => (rest, None),
        };

        if repository.is_empty() || (tag.is_none() && digest.is_none()) {
            return Err(invalid());
        }

        Ok(Self {
            registry: registry.to_string(),
            repository: repository.to_string(),
            tag,
            digest,
        })
    }

    /// Digest if present, otherwise tag.
    pub fn reference(&self) -> &str {
        self.digest
            .as_deref()
            .or(self.tag.as_deref())
            .unwrap_or_default()
    }

    /// Account id of an ECR registry host (`{id}.dkr.ecr.{region}.amazonaws.com`).
    pub fn registry_id(&self) -> Option<&str> {
        let (id, rest) = self.registry.split_once('.')?;
        rest.starts_with("dkr.ecr.").then_some(id)
    }

    /// Region of an ECR registry host.
    pub fn registry_region(&self) -> Option<&str> {
        self.registry
            .split('.')
            .collect::<Vec<_>>()
            .windows(3)
            .find(|w| w[0] == "dkr" && w[1] == "ecr")
            .map(|w| w[2])
    }
}

impl std::fmt::Display for ImageRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.registry, self.repository)?;
        if let Some(tag) = &self.tag {
            write!(f, ":{}", tag)?;
        }
        if let Some(digest) = &self.digest {
            write!(f, "@{}", digest)?;
        }
        Ok(())
    }
}

impl std::str::FromStr for ImageRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
