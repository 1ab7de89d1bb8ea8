//! The basis: immutable identity every other layer derives from.

use monad_core::provider::{Caller, IdentityApi};
use monad_core::{ImageRef, Tags, ValidationErrors};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::schema::Schema;
use crate::settings::{Settings, keys};
use crate::template::{self, AccountData, GitData, ResourceData, ServiceData, TemplateData};
use crate::{ConfigError, ConfigResult, GitContext, assets};

/// Replace `/` so a branch can appear in names and image tags.
pub fn sanitize_branch(branch: &str) -> String {
    branch.replace('/', "-")
}

/// Registry coordinates of the service image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registry {
    pub id: String,
    pub region: String,
    /// `path[:tag][@digest]`, e.g. `acme/svc/api:feature-x`.
    pub image: String,
}

impl Registry {
    pub fn host(&self) -> String {
        format!("{}.dkr.ecr.{}.amazonaws.com", self.id, self.region)
    }

    /// Fully qualified image URI.
    pub fn image_uri(&self) -> String {
        format!("{}/{}", self.host(), self.image)
    }

    /// Image path and tag, split on the last `:` after the last `/`.
    /// A digest is not part of either.
    pub fn image_parts(&self) -> (&str, &str) {
        let image = self
            .image
            .split_once('@')
            .map_or(self.image.as_str(), |(image, _)| image);
        let last_slash = image.rfind('/').map(|i| i + 1).unwrap_or(0);
        match image[last_slash..].rfind(':') {
            Some(i) => (&image[..last_slash + i], &image[last_slash + i + 1..]),
            None => (image, ""),
        }
    }

    pub fn image_digest(&self) -> Option<&str> {
        self.image.split_once('@').map(|(_, digest)| digest)
    }
}

/// Names, paths and tags of every managed resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub name_prefix: String,
    pub name: String,
    pub path_prefix: String,
    pub path: String,
    pub tags: Tags,
}

impl Resource {
    /// Derive naming from git and service. With `owner_prefix`, names and
    /// paths also lead with the owner.
    pub fn derive(git: &GitContext, service: &str, owner_prefix: bool) -> Self {
        let branch = sanitize_branch(&git.branch);
        let (name_prefix, path_prefix) = if owner_prefix {
            (
                format!("{}-{}-{}", git.owner, git.repo, branch),
                format!("{}/{}/{}", git.owner, git.repo, git.branch),
            )
        } else {
            (
                format!("{}-{}", git.repo, branch),
                format!("{}/{}", git.repo, git.branch),
            )
        };

        Self {
            name: format!("{}-{}", name_prefix, service),
            path: format!("{}/{}", path_prefix, service),
            name_prefix,
            path_prefix,
            tags: resource_tags(git, service),
        }
    }
}

/// The tag set that marks a cloud resource as managed.
pub fn resource_tags(git: &GitContext, service: &str) -> Tags {
    Tags::from([
        ("Monad".to_string(), "true".to_string()),
        ("Service".to_string(), service.to_string()),
        ("Owner".to_string(), git.owner.clone()),
        ("Repo".to_string(), git.repo.clone()),
        ("Branch".to_string(), git.branch.clone()),
        ("Sha".to_string(), git.sha.clone()),
    ])
}

/// Git, service, caller, registry and resource identity for one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Basis {
    pub git: GitContext,
    pub service: String,
    pub caller: Caller,
    pub registry: Registry,
    pub resource: Resource,
    /// Directory service templates are read from.
    pub dir: PathBuf,
}

impl Basis {
    /// Resolve the basis from settings, the working directory and the caller identity.
    ///
    /// `MONAD_CHDIR` is applied before anything else is derived.
    pub async fn resolve(settings: &Settings, identity: &dyn IdentityApi) -> ConfigResult<Self> {
        if let Some(dir) = settings.get(keys::CHDIR) {
            debug!(dir = %dir, "Changing directory");
            std::env::set_current_dir(dir).map_err(|e| ConfigError::InvalidValue {
                field: keys::CHDIR.to_string(),
                message: format!("{}: {}", dir, e),
            })?;
        }

        let dir = std::env::current_dir()?;
        let git = GitContext::resolve(settings, &dir);
        let caller = identity.caller_identity().await?;
        Self::from_parts(settings, git, caller, &dir)
    }

    /// Build and validate a basis from already-resolved parts.
    pub fn from_parts(
        settings: &Settings,
        git: GitContext,
        caller: Caller,
        dir: &Path,
    ) -> ConfigResult<Self> {
        let service = settings
            .get(keys::SERVICE)
            .map(str::to_string)
            .or_else(|| {
                dir.file_name()
                    .map(|name| name.to_string_lossy().to_string())
            })
            .unwrap_or_default();

        let image = match settings.get(keys::IMAGE) {
            Some(image) => with_tag(image, &git.branch),
            None => format!(
                "{}/{}/{}:{}",
                git.owner,
                git.repo,
                service,
                sanitize_branch(&git.branch)
            ),
        };

        let registry = Registry {
            id: settings
                .get(keys::REGISTRY_ID)
                .unwrap_or(&caller.account_id)
                .to_string(),
            region: settings
                .get(keys::REGISTRY_REGION)
                .unwrap_or(&caller.region)
                .to_string(),
            image,
        };

        let basis = Self {
            resource: Resource::derive(&git, &service, false),
            git,
            service,
            caller,
            registry,
            dir: dir.to_path_buf(),
        };
        basis.validate().into_result()?;

        info!(name = %basis.name(), path = %basis.path(), "Resolved basis");
        Ok(basis)
    }

    /// Rehydrate a basis from decoded image labels.
    ///
    /// The image keeps the tag and digest it was referenced by; only a bare
    /// repository falls back to the branch tag.
    pub fn from_schema(
        schema: &Schema,
        caller: Caller,
        image: &ImageRef,
        owner_prefix: bool,
    ) -> ConfigResult<Self> {
        let mut reference = image.repository.clone();
        match (&image.tag, &image.digest) {
            (None, None) => {
                reference = format!("{}:{}", reference, sanitize_branch(&schema.git.branch));
            }
            (tag, digest) => {
                if let Some(tag) = tag {
                    reference = format!("{}:{}", reference, tag);
                }
                if let Some(digest) = digest {
                    reference = format!("{}@{}", reference, digest);
                }
            }
        }
        let registry = Registry {
            id: image
                .registry_id()
                .unwrap_or(&caller.account_id)
                .to_string(),
            region: image
                .registry_region()
                .unwrap_or(&caller.region)
                .to_string(),
            image: reference,
        };

        let basis = Self {
            resource: Resource::derive(&schema.git, &schema.service, owner_prefix),
            git: schema.git.clone(),
            service: schema.service.clone(),
            caller,
            registry,
            dir: PathBuf::new(),
        };
        basis.validate().into_result()?;
        Ok(basis)
    }

    pub fn validate(&self) -> ValidationErrors {
        let mut errors = self.git.validate();
        errors.require("service name", &self.service);
        errors.require("caller account id", &self.caller.account_id);
        errors.require("caller region", &self.caller.region);
        errors.require("caller arn", &self.caller.arn);
        errors.require("caller user id", &self.caller.user_id);
        errors.require("registry id", &self.registry.id);
        errors.require("registry region", &self.registry.region);
        errors.require("image", &self.registry.image);
        errors
    }

    pub fn name(&self) -> &str {
        &self.resource.name
    }

    pub fn path(&self) -> &str {
        &self.resource.path
    }

    pub fn name_prefix(&self) -> &str {
        &self.resource.name_prefix
    }

    pub fn path_prefix(&self) -> &str {
        &self.resource.path_prefix
    }

    pub fn tags(&self) -> &Tags {
        &self.resource.tags
    }

    pub fn image(&self) -> &str {
        &self.registry.image
    }

    pub fn image_uri(&self) -> String {
        self.registry.image_uri()
    }

    pub fn registry_id(&self) -> &str {
        &self.registry.id
    }

    pub fn registry_region(&self) -> &str {
        &self.registry.region
    }

    pub fn account_id(&self) -> &str {
        &self.caller.account_id
    }

    pub fn region(&self) -> &str {
        &self.caller.region
    }

    pub fn policy_template(&self) -> &'static str {
        assets::POLICY
    }

    pub fn role_template(&self) -> &'static str {
        assets::ROLE
    }

    pub fn rule_template(&self) -> &'static str {
        assets::RULE
    }

    pub fn env_template(&self) -> &'static str {
        assets::ENV
    }

    pub fn template_data(&self) -> TemplateData {
        TemplateData {
            account: AccountData {
                id: self.caller.account_id.clone(),
                region: self.caller.region.clone(),
            },
            git: GitData {
                repo: self.git.repo.clone(),
                owner: self.git.owner.clone(),
                branch: self.git.branch.clone(),
                sha: self.git.sha.clone(),
            },
            service: ServiceData {
                name: self.service.clone(),
            },
            resource: ResourceData {
                name: self.resource.name.clone(),
                path: self.resource.path.clone(),
                name_prefix: self.resource.name_prefix.clone(),
                path_prefix: self.resource.path_prefix.clone(),
            },
        }
    }

    pub fn render(&self, name: &str, source: &str) -> ConfigResult<String> {
        template::render(name, source, &self.template_data())
    }
}

/// Append `:branch` when an image override carries no tag.
fn with_tag(image: &str, branch: &str) -> String {
    let last_slash = image.rfind('/').map(|i| i + 1).unwrap_or(0);
    if image[last_slash..].contains(':') {
        image.to_string()
    } else {
        format!("{}:{}", image, sanitize_branch(branch))
    }
}
