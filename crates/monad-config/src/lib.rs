//! Configuration for monad.
//!
//! This crate handles:
//! - Settings from `MONAD_*` environment variables and CLI flags
//! - Git context discovery
//! - The basis: naming and tagging derived from git, service and caller
//! - The image label schema and template rendering
//! - Per-resource configuration
//! - Starter files for new services

pub mod assets;
pub mod basis;
pub mod config;
pub mod error;
pub mod git;
pub mod scaffold;
pub mod schema;
pub mod settings;
pub mod template;

pub use basis::{Basis, Registry, Resource};
pub use config::Config;
pub use error::{ConfigError, ConfigResult};
pub use git::GitContext;
pub use schema::Schema;
pub use settings::{FLAGS, FlagSpec, Settings};
pub use template::TemplateData;
