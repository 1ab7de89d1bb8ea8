//! Configuration errors.

use monad_core::{ProviderError, ValidationErrors};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("invalid configuration:\n{0}")]
    Validation(#[from] ValidationErrors),

    #[error("template error: {0}")]
    Template(String),

    #[error("schema error: {0}")]
    Schema(String),

    #[error("refusing to overwrite {0}; use --force")]
    Exists(String),

    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<minijinja::Error> for ConfigError {
    fn from(err: minijinja::Error) -> Self {
        ConfigError::Template(err.to_string())
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Schema(err.to_string())
    }
}

impl From<ConfigError> for monad_core::Error {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation(errors) => monad_core::Error::Validation(errors),
            ConfigError::Provider(err) => monad_core::Error::Provider(err),
            ConfigError::Io(err) => monad_core::Error::Io(err),
            other => monad_core::Error::InvalidInput(other.to_string()),
        }
    }
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
