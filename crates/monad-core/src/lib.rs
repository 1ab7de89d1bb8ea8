//! Core domain types and traits for monad.
//!
//! This crate contains:
//! - Error types and provider error-code triage
//! - Image references and architectures
//! - Provider API traits, one per cloud service
//! - The `Step` trait every reconciler implements

pub mod error;
pub mod image;
pub mod provider;
pub mod step;

pub use error::{Error, ProviderError, ProviderResult, ProviderResultExt, Result, ValidationErrors};
pub use image::{Architecture, ImageConfig, ImageRef};
pub use provider::Clients;
pub use step::Step;

/// Resource tags. Ordered so that tag payloads are deterministic.
pub type Tags = std::collections::BTreeMap<String, String>;
