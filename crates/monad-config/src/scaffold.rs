//! Starter files for a new service.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

use crate::assets::{self, files};
use crate::{ConfigError, ConfigResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Go,
    Python,
    Node,
    Rust,
}

impl Language {
    pub const ALL: [Language; 4] = [Self::Go, Self::Python, Self::Node, Self::Rust];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Go => "go",
            Self::Python => "python",
            Self::Node => "node",
            Self::Rust => "rust",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = ConfigError;

    fn from_str(s: &str) -> ConfigResult<Self> {
        Self::ALL
            .into_iter()
            .find(|l| l.as_str() == s)
            .ok_or_else(|| ConfigError::InvalidValue {
                field: "language".to_string(),
                message: format!("{} (expected one of go, python, node, rust)", s),
            })
    }
}

/// A file to write, relative to the service directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaffoldFile {
    pub path: &'static str,
    pub content: &'static str,
}

const fn file(path: &'static str, content: &'static str) -> ScaffoldFile {
    ScaffoldFile { path, content }
}

const GO: &[ScaffoldFile] = &[
    file("Dockerfile", include_str!("../assets/scaffold/go/Dockerfile")),
    file("go.mod", include_str!("../assets/scaffold/go/go.mod")),
    file("main.go", include_str!("../assets/scaffold/go/main.go")),
];

const PYTHON: &[ScaffoldFile] = &[
    file("Dockerfile", include_str!("../assets/scaffold/python/Dockerfile")),
    file("app.py", include_str!("../assets/scaffold/python/app.py")),
    file(
        "requirements.txt",
        include_str!("../assets/scaffold/python/requirements.txt"),
    ),
];

const NODE: &[ScaffoldFile] = &[
    file("Dockerfile", include_str!("../assets/scaffold/node/Dockerfile")),
    file("index.js", include_str!("../assets/scaffold/node/index.js")),
    file("package.json", include_str!("../assets/scaffold/node/package.json")),
];

const RUST: &[ScaffoldFile] = &[
    file("Dockerfile", include_str!("../assets/scaffold/rust/Dockerfile")),
    file("Cargo.toml", include_str!("../assets/scaffold/rust/Cargo.toml.in")),
    file("src/main.rs", include_str!("../assets/scaffold/rust/main.rs.in")),
];

/// Language files followed by the shared templates.
pub fn files(language: Language) -> Vec<ScaffoldFile> {
    let own = match language {
        Language::Go => GO,
        Language::Python => PYTHON,
        Language::Node => NODE,
        Language::Rust => RUST,
    };
    own.iter()
        .copied()
        .chain([
            file(files::POLICY, assets::POLICY),
            file(files::ROLE, assets::ROLE),
            file(files::RESOURCES, assets::RESOURCES),
        ])
        .collect()
}

/// Write the scaffold for `language` into `dir`.
///
/// Nothing is written if any target already exists, unless `force` is set.
pub fn write(dir: &Path, language: Language, force: bool) -> ConfigResult<Vec<PathBuf>> {
    let files = files(language);
    if !force {
        if let Some(existing) = files.iter().map(|f| dir.join(f.path)).find(|p| p.exists()) {
            return Err(ConfigError::Exists(existing.display().to_string()));
        }
    }

    let mut written = Vec::with_capacity(files.len());
    for f in files {
        let path = dir.join(f.path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, f.content)?;
        info!(path = %path.display(), "Wrote file");
        written.push(path);
    }
    Ok(written)
}
