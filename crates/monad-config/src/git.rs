//! Git context discovery.

use monad_core::ValidationErrors;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

use crate::settings::{Settings, keys};

/// The git coordinates a release is derived from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitContext {
    pub owner: String,
    pub repo: String,
    pub branch: String,
    pub sha: String,
    pub origin: String,
    pub base_path: PathBuf,
    pub dirty: bool,
}

impl GitContext {
    /// Populate git context by running git commands in `dir`.
    ///
    /// Fields git cannot answer are left empty; validation reports them.
    pub fn discover(dir: &Path) -> Self {
        let run_git = |args: &[&str]| -> Option<String> {
            Command::new("git")
                .args(args)
                .current_dir(dir)
                .output()
                .ok()
                .filter(|o| o.status.success())
                .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
        };

        let mut ctx = Self {
            base_path: dir.to_path_buf(),
            ..Self::default()
        };

        let Some(root) = run_git(&["rev-parse", "--show-toplevel"]) else {
            debug!(dir = %dir.display(), "Not a git repository");
            return ctx;
        };
        ctx.base_path = PathBuf::from(root);

        if let Some(sha) = run_git(&["rev-parse", "HEAD"]) {
            ctx.sha = sha;
        }

        if let Some(branch) = run_git(&["rev-parse", "--abbrev-ref", "HEAD"]) {
            if branch != "HEAD" {
                ctx.branch = branch;
            }
        }

        if let Some(origin) = run_git(&["remote", "get-url", "origin"]) {
            if let Some((owner, repo)) = parse_origin(&origin) {
                ctx.owner = owner;
                ctx.repo = repo;
            }
            ctx.origin = origin;
        }

        if let Some(status) = run_git(&["status", "--porcelain"]) {
            ctx.dirty = !status.is_empty();
        }

        ctx
    }

    /// Environment overrides first, discovery for whatever is left.
    pub fn resolve(settings: &Settings, dir: &Path) -> Self {
        let overridden = [keys::OWNER, keys::REPO, keys::BRANCH, keys::SHA]
            .iter()
            .all(|k| settings.get(k).is_some());

        let mut ctx = if overridden {
            Self {
                base_path: dir.to_path_buf(),
                ..Self::default()
            }
        } else {
            Self::discover(dir)
        };

        if let Some(owner) = settings.get(keys::OWNER) {
            ctx.owner = owner.to_string();
        }
        if let Some(repo) = settings.get(keys::REPO) {
            ctx.repo = repo.to_string();
        }
        if let Some(branch) = settings.get(keys::BRANCH) {
            ctx.branch = branch.to_string();
        }
        if let Some(sha) = settings.get(keys::SHA) {
            ctx.sha = sha.to_string();
        }
        ctx
    }

    pub fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        errors.require("git owner", &self.owner);
        errors.require("git repo", &self.repo);
        errors.require("git branch", &self.branch);
        errors.require("git sha", &self.sha);
        errors
    }
}

/// Owner and repository name from an origin remote URL.
///
/// Handles `git@host:owner/repo.git`, `ssh://git@host/owner/repo.git` and
/// `https://host/owner/repo(.git)`.
pub fn parse_origin(origin: &str) -> Option<(String, String)> {
    let path = match url::Url::parse(origin) {
        Ok(url) if url.has_host() => url.path().to_string(),
        _ => {
            // scp-like syntax
            let (_, path) = origin.split_once(':')?;
            path.to_string()
        }
    };

    let path = path.trim_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);
    let mut segments = path.rsplit('/');
    let repo = segments.next().filter(|s| !s.is_empty())?;
    let owner = segments.next().filter(|s| !s.is_empty())?;
    Some((owner.to_string(), repo.to_string()))
}
