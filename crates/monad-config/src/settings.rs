//! Recognised `MONAD_*` settings.
//!
//! A single table drives value resolution and help output. Values come from
//! the process environment and may be overridden by CLI flags.

use std::collections::BTreeMap;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use crate::{ConfigError, ConfigResult};

/// Environment variable names.
pub mod keys {
    pub const CHDIR: &str = "MONAD_CHDIR";
    pub const OWNER: &str = "MONAD_OWNER";
    pub const REPO: &str = "MONAD_REPO";
    pub const BRANCH: &str = "MONAD_BRANCH";
    pub const SHA: &str = "MONAD_SHA";
    pub const SERVICE: &str = "MONAD_SERVICE";
    pub const IMAGE: &str = "MONAD_IMAGE";
    pub const REGISTRY_ID: &str = "MONAD_REGISTRY_ID";
    pub const REGISTRY_REGION: &str = "MONAD_REGISTRY_REGION";
    pub const POLICY: &str = "MONAD_POLICY";
    pub const ROLE: &str = "MONAD_ROLE";
    pub const BOUNDARY_POLICY: &str = "MONAD_BOUNDARY_POLICY";
    pub const ENV: &str = "MONAD_ENV";
    pub const MEMORY: &str = "MONAD_MEMORY";
    pub const TIMEOUT: &str = "MONAD_TIMEOUT";
    pub const STORAGE: &str = "MONAD_STORAGE";
    pub const RETRIES: &str = "MONAD_RETRIES";
    pub const LAMBDA_REGION: &str = "MONAD_LAMBDA_REGION";
    pub const LOG_REGION: &str = "MONAD_LOG_REGION";
    pub const LOG_RETENTION: &str = "MONAD_LOG_RETENTION";
    pub const API: &str = "MONAD_API";
    pub const AUTH: &str = "MONAD_AUTH";
    pub const ROUTE: &str = "MONAD_ROUTE";
    pub const API_REGION: &str = "MONAD_API_REGION";
    pub const BUS_NAME: &str = "MONAD_BUS_NAME";
    pub const BUS_RULE: &str = "MONAD_BUS_RULE";
    pub const BUS_REGION: &str = "MONAD_BUS_REGION";
    pub const SECURITY_GROUPS: &str = "MONAD_SECURITY_GROUPS";
    pub const SUBNETS: &str = "MONAD_SUBNETS";
    pub const OWNER_PREFIX: &str = "MONAD_OWNER_PREFIX";
    pub const LOG_FORMAT: &str = "MONAD_LOG_FORMAT";
    pub const BIND: &str = "MONAD_BIND";
}

/// How a setting's raw string is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagKind {
    Text,
    /// Comma-separated list.
    List,
    Number,
    Bool,
    /// Inline content or `file://PATH`.
    File,
}

/// One recognised setting.
#[derive(Debug, Clone, Copy)]
pub struct FlagSpec {
    pub flag: &'static str,
    pub env: &'static str,
    pub kind: FlagKind,
    pub description: &'static str,
}

const fn spec(
    flag: &'static str,
    env: &'static str,
    kind: FlagKind,
    description: &'static str,
) -> FlagSpec {
    FlagSpec {
        flag,
        env,
        kind,
        description,
    }
}

pub const FLAGS: &[FlagSpec] = &[
    spec("chdir", keys::CHDIR, FlagKind::Text, "change to this directory before anything else"),
    spec("owner", keys::OWNER, FlagKind::Text, "git repository owner"),
    spec("repo", keys::REPO, FlagKind::Text, "git repository name"),
    spec("branch", keys::BRANCH, FlagKind::Text, "git branch"),
    spec("sha", keys::SHA, FlagKind::Text, "git commit sha"),
    spec("service", keys::SERVICE, FlagKind::Text, "service name, defaults to the directory name"),
    spec("image", keys::IMAGE, FlagKind::Text, "image path and tag, defaults to owner/repo/service:branch"),
    spec("registry-id", keys::REGISTRY_ID, FlagKind::Text, "registry account id, defaults to the caller account"),
    spec("registry-region", keys::REGISTRY_REGION, FlagKind::Text, "registry region, defaults to the caller region"),
    spec("policy", keys::POLICY, FlagKind::File, "permission policy template"),
    spec("role", keys::ROLE, FlagKind::File, "assume-role policy template"),
    spec("boundary-policy", keys::BOUNDARY_POLICY, FlagKind::Text, "permissions boundary policy name or ARN"),
    spec("env", keys::ENV, FlagKind::File, "function environment template in .env format"),
    spec("memory", keys::MEMORY, FlagKind::Number, "function memory in MiB"),
    spec("timeout", keys::TIMEOUT, FlagKind::Number, "function timeout in seconds"),
    spec("storage", keys::STORAGE, FlagKind::Number, "function ephemeral storage in MiB"),
    spec("retries", keys::RETRIES, FlagKind::Number, "asynchronous invocation retries"),
    spec("lambda-region", keys::LAMBDA_REGION, FlagKind::Text, "function region"),
    spec("log-region", keys::LOG_REGION, FlagKind::Text, "log group region"),
    spec("log-retention", keys::LOG_RETENTION, FlagKind::Number, "log retention in days"),
    spec("api", keys::API, FlagKind::Text, "HTTP API id or name"),
    spec("auth", keys::AUTH, FlagKind::List, "route authorizers: none, aws_iam, or an authorizer id or name"),
    spec("route", keys::ROUTE, FlagKind::List, "route keys, each ending in {proxy+}"),
    spec("api-region", keys::API_REGION, FlagKind::Text, "HTTP API region"),
    spec("bus-name", keys::BUS_NAME, FlagKind::Text, "event bus name"),
    spec("bus-rule", keys::BUS_RULE, FlagKind::File, "single event rule document"),
    spec("bus-region", keys::BUS_REGION, FlagKind::Text, "event bus region"),
    spec("security-groups", keys::SECURITY_GROUPS, FlagKind::List, "security group ids or names"),
    spec("subnets", keys::SUBNETS, FlagKind::List, "subnet ids or Name tags"),
    spec("owner-prefix", keys::OWNER_PREFIX, FlagKind::Bool, "prefix resource names with the owner when reading image labels"),
    spec("log-format", keys::LOG_FORMAT, FlagKind::Text, "log output format: text or json"),
    spec("bind", keys::BIND, FlagKind::Text, "event handler listen address"),
];

/// Resolved setting values, keyed by environment variable name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    values: BTreeMap<String, String>,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect every recognised, non-empty variable from the process environment.
    pub fn from_env() -> Self {
        Self::from_pairs(std::env::vars())
    }

    /// Collect recognised, non-empty pairs; unknown names are ignored.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut settings = Self::new();
        for (key, value) in pairs {
            let key = key.into();
            if Self::spec(&key).is_some() {
                settings.set(&key, value);
            }
        }
        settings
    }

    pub fn spec(env: &str) -> Option<&'static FlagSpec> {
        FLAGS.iter().find(|f| f.env == env)
    }

    /// Override a value. Empty values are treated as unset.
    pub fn set(&mut self, env: &str, value: impl Into<String>) {
        let value = value.into();
        if value.trim().is_empty() {
            self.values.remove(env);
        } else {
            self.values.insert(env.to_string(), value);
        }
    }

    /// Override a value only when `value` is `Some`.
    pub fn set_opt(&mut self, env: &str, value: Option<impl Into<String>>) {
        if let Some(value) = value {
            self.set(env, value);
        }
    }

    pub fn get(&self, env: &str) -> Option<&str> {
        self.values.get(env).map(|s| s.trim())
    }

    pub fn get_or<'a>(&'a self, env: &str, default: &'a str) -> &'a str {
        self.get(env).unwrap_or(default)
    }

    /// Comma-separated list, trimmed, empties dropped.
    pub fn list(&self, env: &str) -> Vec<String> {
        self.get(env)
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn parse<T>(&self, env: &str) -> ConfigResult<Option<T>>
    where
        T: FromStr,
        T::Err: Display,
    {
        self.get(env)
            .map(|raw| {
                raw.parse::<T>().map_err(|e| ConfigError::InvalidValue {
                    field: env.to_string(),
                    message: format!("{}: {}", raw, e),
                })
            })
            .transpose()
    }

    pub fn flag(&self, env: &str) -> ConfigResult<bool> {
        Ok(self.parse::<bool>(env)?.unwrap_or(false))
    }

    /// Inline content, or the content of `file://PATH`.
    pub fn file_or_inline(&self, env: &str) -> ConfigResult<Option<String>> {
        let Some(raw) = self.get(env) else {
            return Ok(None);
        };
        let Some(rest) = raw.strip_prefix("file://") else {
            return Ok(Some(raw.to_string()));
        };

        let path = match url::Url::parse(raw).ok().and_then(|u| u.to_file_path().ok()) {
            Some(path) if rest.starts_with('/') => path,
            _ => PathBuf::from(rest),
        };
        std::fs::read_to_string(&path)
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue {
                field: env.to_string(),
                message: format!("{}: {}", path.display(), e),
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
