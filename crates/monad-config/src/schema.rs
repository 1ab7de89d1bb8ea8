//! Image label schema.
//!
//! A release is fingerprinted onto its container image as labels under
//! `org.kaixo.monad.*`. Each value is the base64 of the compacted content:
//!
//! | Key | Required | Content |
//! |---|---|---|
//! | `schema` | yes | schema version |
//! | `name` | yes | service name |
//! | `git.{branch,sha,origin,owner,repo,dirty}` | yes | git context |
//! | `role` | no | assume-role template |
//! | `policy` | no | permission policy template |
//! | `resources` | no | sizing and env template |
//! | `bus.<rule>` | no | one per file in `bus/` |
//!
//! Absent optional files fall back to the embedded defaults.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use monad_core::provider::eventbridge::RuleExpression;
use monad_core::{Tags, ValidationErrors};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

use crate::basis::{Resource, resource_tags, sanitize_branch};
use crate::template::{self, TemplateData};
use crate::{ConfigResult, GitContext, assets};

pub const VERSION: &str = "1.1";
pub const LABEL_PREFIX: &str = "org.kaixo.monad.";

/// Label keys.
pub mod labels {
    pub const SCHEMA: &str = "org.kaixo.monad.schema";
    pub const NAME: &str = "org.kaixo.monad.name";
    pub const GIT_BRANCH: &str = "org.kaixo.monad.git.branch";
    pub const GIT_SHA: &str = "org.kaixo.monad.git.sha";
    pub const GIT_ORIGIN: &str = "org.kaixo.monad.git.origin";
    pub const GIT_OWNER: &str = "org.kaixo.monad.git.owner";
    pub const GIT_REPO: &str = "org.kaixo.monad.git.repo";
    pub const GIT_DIRTY: &str = "org.kaixo.monad.git.dirty";
    pub const ROLE: &str = "org.kaixo.monad.role";
    pub const POLICY: &str = "org.kaixo.monad.policy";
    pub const RESOURCES: &str = "org.kaixo.monad.resources";
    pub const BUS_PREFIX: &str = "org.kaixo.monad.bus.";
}

/// How a piece of content is compacted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Json,
    Text,
}

impl ContentKind {
    /// Schedule expressions are text; every other rule document is JSON.
    fn of_rule(content: &str) -> Self {
        match RuleExpression::classify(content) {
            RuleExpression::Schedule(_) => Self::Text,
            RuleExpression::Pattern(_) => Self::Json,
        }
    }
}

/// Remove whitespace outside of JSON strings, keeping key order and escapes.
pub fn compact_json(content: &str) -> Result<String, serde_json::Error> {
    serde_json::from_str::<serde::de::IgnoredAny>(content)?;

    let mut out = String::with_capacity(content.len());
    let mut in_string = false;
    let mut escaped = false;
    for c in content.chars() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
        } else if c == '"' {
            in_string = true;
            out.push(c);
        } else if !matches!(c, ' ' | '\t' | '\n' | '\r') {
            out.push(c);
        }
    }
    Ok(out)
}

/// Trim every line.
pub fn compact_text(content: &str) -> String {
    content
        .lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

pub fn compact(content: &str, kind: ContentKind) -> Result<String, serde_json::Error> {
    match kind {
        ContentKind::Json => compact_json(content),
        ContentKind::Text => Ok(compact_text(content)),
    }
}

/// The full release fingerprint: git context plus the service's templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    pub version: String,
    pub service: String,
    pub git: GitContext,
    pub role: String,
    pub policy: String,
    pub resources: String,
    /// Rule name to rule document.
    pub bus: BTreeMap<String, String>,
}

impl Schema {
    /// Read templates from `dir` and fingerprint them with `git` and `service`.
    ///
    /// Every missing or invalid input is collected into one report.
    pub fn encode(git: &GitContext, service: &str, dir: &Path) -> ConfigResult<Self> {
        let mut errors = git.validate();
        errors.require("service name", service);

        let role = read_template(dir, assets::files::ROLE, assets::ROLE, &mut errors);
        let policy = read_template(dir, assets::files::POLICY, assets::POLICY, &mut errors);
        let resources = read_template(
            dir,
            assets::files::RESOURCES,
            assets::RESOURCES,
            &mut errors,
        );
        let bus = read_bus(&dir.join(assets::files::BUS_DIR), &mut errors);

        errors.into_result()?;
        Ok(Self {
            version: VERSION.to_string(),
            service: service.to_string(),
            git: git.clone(),
            role,
            policy,
            resources,
            bus,
        })
    }

    /// Rebuild a schema from an image label map.
    pub fn decode(map: &BTreeMap<String, String>) -> ConfigResult<Self> {
        let mut errors = ValidationErrors::new();
        let mut required = |key: &str| -> String {
            match map.get(key) {
                Some(value) => decode_value(key, value, ContentKind::Text, &mut errors),
                None => {
                    errors.push(format!("label {} is required", key));
                    String::new()
                }
            }
        };

        let version = required(labels::SCHEMA);
        let service = required(labels::NAME);
        let branch = required(labels::GIT_BRANCH);
        let sha = required(labels::GIT_SHA);
        let origin = required(labels::GIT_ORIGIN);
        let owner = required(labels::GIT_OWNER);
        let repo = required(labels::GIT_REPO);
        let dirty = required(labels::GIT_DIRTY);

        if !version.is_empty() && version != VERSION {
            errors.push(format!("unsupported schema version {}", version));
        }
        let dirty = match dirty.as_str() {
            "true" => true,
            "false" => false,
            other => {
                errors.push(format!("label {} is not a bool: {}", labels::GIT_DIRTY, other));
                false
            }
        };

        let mut optional = |key: &str, default: &str| -> String {
            match map.get(key) {
                Some(value) => decode_value(key, value, ContentKind::Json, &mut errors),
                None => compact_json(default).unwrap_or_else(|_| default.to_string()),
            }
        };
        let role = optional(labels::ROLE, assets::ROLE);
        let policy = optional(labels::POLICY, assets::POLICY);
        let resources = optional(labels::RESOURCES, assets::RESOURCES);

        let mut bus = BTreeMap::new();
        for (key, value) in map.range(labels::BUS_PREFIX.to_string()..) {
            let Some(rule) = key.strip_prefix(labels::BUS_PREFIX) else {
                break;
            };
            let raw = decode_base64(key, value, &mut errors);
            let document = compact_or_report(key, &raw, ContentKind::of_rule(&raw), &mut errors);
            bus.insert(rule.to_string(), document);
        }

        errors.into_result()?;
        Ok(Self {
            version,
            service,
            git: GitContext {
                owner,
                repo,
                branch,
                sha,
                origin,
                dirty,
                ..GitContext::default()
            },
            role,
            policy,
            resources,
            bus,
        })
    }

    /// The label map, values base64 encoded.
    pub fn labels(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        let mut put = |key: String, value: &str| {
            map.insert(key, STANDARD.encode(value));
        };

        put(labels::SCHEMA.to_string(), &self.version);
        put(labels::NAME.to_string(), &self.service);
        put(labels::GIT_BRANCH.to_string(), &self.git.branch);
        put(labels::GIT_SHA.to_string(), &self.git.sha);
        put(labels::GIT_ORIGIN.to_string(), &self.git.origin);
        put(labels::GIT_OWNER.to_string(), &self.git.owner);
        put(labels::GIT_REPO.to_string(), &self.git.repo);
        put(labels::GIT_DIRTY.to_string(), if self.git.dirty { "true" } else { "false" });
        put(labels::ROLE.to_string(), &self.role);
        put(labels::POLICY.to_string(), &self.policy);
        put(labels::RESOURCES.to_string(), &self.resources);
        for (rule, document) in &self.bus {
            put(format!("{}{}", labels::BUS_PREFIX, rule), document);
        }
        map
    }

    /// `--label key=value` arguments for an image build.
    pub fn docker_label_args(&self) -> Vec<String> {
        self.labels()
            .into_iter()
            .flat_map(|(k, v)| ["--label".to_string(), format!("{}={}", k, v)])
            .collect()
    }

    pub fn resource_name(&self, owner_prefix: bool) -> String {
        Resource::derive(&self.git, &self.service, owner_prefix).name
    }

    pub fn resource_path(&self, owner_prefix: bool) -> String {
        Resource::derive(&self.git, &self.service, owner_prefix).path
    }

    pub fn image_path(&self) -> String {
        format!("{}/{}/{}", self.git.owner, self.git.repo, self.service)
    }

    pub fn image_branch_tag(&self, registry: &str) -> String {
        format!(
            "{}/{}:{}",
            registry,
            self.image_path(),
            sanitize_branch(&self.git.branch)
        )
    }

    pub fn image_sha_tag(&self, registry: &str) -> String {
        format!("{}/{}:{}", registry, self.image_path(), self.git.sha)
    }

    pub fn policy_document(&self, data: &TemplateData) -> ConfigResult<String> {
        template::render(assets::files::POLICY, &self.policy, data)
    }

    pub fn role_document(&self, data: &TemplateData) -> ConfigResult<String> {
        template::render(assets::files::ROLE, &self.role, data)
    }

    pub fn resource_document(&self, data: &TemplateData) -> ConfigResult<String> {
        template::render(assets::files::RESOURCES, &self.resources, data)
    }

    /// Rendered rule documents keyed by rule name.
    pub fn event_bridge_documents(
        &self,
        data: &TemplateData,
    ) -> ConfigResult<BTreeMap<String, String>> {
        self.bus
            .iter()
            .map(|(rule, document)| Ok((rule.clone(), template::render(rule, document, data)?)))
            .collect()
    }

    pub fn resource_tags(&self) -> Tags {
        resource_tags(&self.git, &self.service)
    }
}

fn read_template(
    dir: &Path,
    file: &str,
    default: &str,
    errors: &mut ValidationErrors,
) -> String {
    let path = dir.join(file);
    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(file = %file, "Using default template");
            default.to_string()
        }
        Err(e) => {
            errors.push(format!("{}: {}", path.display(), e));
            return String::new();
        }
    };
    compact_or_report(&path.display().to_string(), &content, ContentKind::Json, errors)
}

fn read_bus(dir: &Path, errors: &mut ValidationErrors) -> BTreeMap<String, String> {
    let mut bus = BTreeMap::new();
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return bus,
        Err(e) => {
            errors.push(format!("{}: {}", dir.display(), e));
            return bus;
        }
    };

    for entry in entries {
        let path = match entry {
            Ok(entry) => entry.path(),
            Err(e) => {
                errors.push(format!("{}: {}", dir.display(), e));
                continue;
            }
        };
        if !path.is_file() {
            continue;
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let rule = file_name.split('.').next().unwrap_or_default().to_string();
        if rule.is_empty() {
            continue;
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => {
                let document = compact_or_report(
                    &path.display().to_string(),
                    &content,
                    ContentKind::of_rule(&content),
                    errors,
                );
                if bus.insert(rule.clone(), document).is_some() {
                    errors.push(format!("duplicate bus rule {}", rule));
                }
            }
            Err(e) => errors.push(format!("{}: {}", path.display(), e)),
        }
    }
    bus
}

fn compact_or_report(
    origin: &str,
    content: &str,
    kind: ContentKind,
    errors: &mut ValidationErrors,
) -> String {
    match compact(content, kind) {
        Ok(compacted) => compacted,
        Err(e) => {
            errors.push(format!("{} is not valid JSON: {}", origin, e));
            String::new()
        }
    }
}

fn decode_base64(key: &str, value: &str, errors: &mut ValidationErrors) -> String {
    match STANDARD
        .decode(value.trim())
        .map_err(|e| e.to_string())
        .and_then(|bytes| String::from_utf8(bytes).map_err(|e| e.to_string()))
    {
        Ok(decoded) => decoded,
        Err(e) => {
            errors.push(format!("label {} is not valid base64 text: {}", key, e));
            String::new()
        }
    }
}

fn decode_value(key: &str, value: &str, kind: ContentKind, errors: &mut ValidationErrors) -> String {
    let raw = decode_base64(key, value, errors);
    compact_or_report(key, &raw, kind, errors)
}
