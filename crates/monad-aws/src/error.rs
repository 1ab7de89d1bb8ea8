//! SDK error conversion.
//!
//! Every SDK error is reduced to its service error code and message so that
//! reconcilers can triage by code without knowing the SDK types.

use aws_sdk_sts::error::{BuildError, DisplayErrorContext, ProvideErrorMetadata};
use monad_core::{ProviderError, ProviderResult};

/// Code used when the service returned no error code (transport failures).
pub const UNKNOWN: &str = "Unknown";

pub(crate) fn provider_error<E>(err: E) -> ProviderError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    let code = err.code().unwrap_or(UNKNOWN).to_string();
    let message = match err.message() {
        Some(message) => message.to_string(),
        None => DisplayErrorContext(&err).to_string(),
    };
    ProviderError::new(code, message)
}

pub(crate) fn build_error(err: BuildError) -> ProviderError {
    ProviderError::new("BuildError", err.to_string())
}

pub(crate) trait SdkResultExt<T> {
    fn provider(self) -> ProviderResult<T>;
}

impl<T, E> SdkResultExt<T> for Result<T, E>
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    fn provider(self) -> ProviderResult<T> {
        self.map_err(provider_error)
    }
}

/// Owned text from an SDK string accessor, empty when absent.
pub(crate) trait OrEmpty {
    fn or_empty(self) -> String;
}

impl OrEmpty for &str {
    fn or_empty(self) -> String {
        self.to_string()
    }
}

impl OrEmpty for Option<&str> {
    fn or_empty(self) -> String {
        self.unwrap_or_default().to_string()
    }
}
