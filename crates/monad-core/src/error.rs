//! Error types for monad.

use std::fmt;
use thiserror::Error;

/// Well-known provider error codes.
pub mod codes {
    pub const RESOURCE_ALREADY_EXISTS: &str = "ResourceAlreadyExistsException";
    pub const ENTITY_ALREADY_EXISTS: &str = "EntityAlreadyExists";
    pub const RESOURCE_CONFLICT: &str = "ResourceConflictException";
    pub const REPOSITORY_ALREADY_EXISTS: &str = "RepositoryAlreadyExistsException";

    pub const RESOURCE_NOT_FOUND: &str = "ResourceNotFoundException";
    pub const NO_SUCH_ENTITY: &str = "NoSuchEntity";
    pub const NOT_FOUND: &str = "NotFoundException";
    pub const REPOSITORY_NOT_FOUND: &str = "RepositoryNotFoundException";
    pub const IMAGE_NOT_FOUND: &str = "ImageNotFoundException";

    pub const INVALID_PARAMETER_VALUE: &str = "InvalidParameterValueException";

    /// Codes meaning "the thing you tried to create is already there".
    pub const ALREADY_EXISTS: &[&str] = &[
        RESOURCE_ALREADY_EXISTS,
        ENTITY_ALREADY_EXISTS,
        RESOURCE_CONFLICT,
        REPOSITORY_ALREADY_EXISTS,
    ];

    /// Codes meaning "the thing you tried to delete is already gone".
    pub const NOT_FOUND_ANY: &[&str] = &[
        RESOURCE_NOT_FOUND,
        NO_SUCH_ENTITY,
        NOT_FOUND,
        REPOSITORY_NOT_FOUND,
        IMAGE_NOT_FOUND,
    ];
}

/// An error returned by a cloud provider API, reduced to its error code and message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct ProviderError {
    pub code: String,
    pub message: String,
}

impl ProviderError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Whether this error carries the given code.
    pub fn is(&self, code: &str) -> bool {
        self.code == code
    }

    /// Whether this error carries any of the given codes.
    pub fn is_any(&self, codes: &[&str]) -> bool {
        codes.iter().any(|c| self.is(c))
    }
}

pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// Error-code triage for provider results.
pub trait ProviderResultExt<T> {
    /// Turn the listed error codes into `Ok(None)`; any other error passes through.
    fn swallow(self, codes: &[&str]) -> ProviderResult<Option<T>>;
}

impl<T> ProviderResultExt<T> for ProviderResult<T> {
    fn swallow(self, codes: &[&str]) -> ProviderResult<Option<T>> {
        match self {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_any(codes) => Ok(None),
            Err(err) => Err(err),
        }
    }
}

/// A set of validation failures reported together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<String>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: impl Into<String>) {
        self.0.push(message.into());
    }

    /// Record that `field` is required when `value` is empty.
    pub fn require(&mut self, field: &str, value: &str) {
        if value.is_empty() {
            self.push(format!("{} is required", field));
        }
    }

    pub fn extend(&mut self, other: ValidationErrors) {
        self.0.extend(other.0);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn messages(&self) -> &[String] {
        &self.0
    }

    /// `Ok(())` when nothing was recorded.
    pub fn into_result(self) -> std::result::Result<(), ValidationErrors> {
        if self.0.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, message) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "- {}", message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("validation failed:\n{0}")]
    Validation(#[from] ValidationErrors),

    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("unsupported architecture: {0}")]
    UnsupportedArchitecture(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;
