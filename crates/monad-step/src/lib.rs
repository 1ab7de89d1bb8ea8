//! Resource reconcilers for monad.
//!
//! One [`Step`] per resource kind, each bringing its resource to the state a
//! [`monad_config::Config`] describes. The [`Saga`] runs them in dependency
//! order for deploy and in reverse for destroy.

pub mod apigateway;
pub mod cloudwatch;
pub mod ecr;
pub mod eventbridge;
pub mod iam;
pub mod lambda;
pub mod retry;
pub mod saga;

#[cfg(test)]
pub(crate) mod fake;

pub use apigateway::ApiGatewayStep;
pub use cloudwatch::CloudWatchStep;
pub use ecr::EcrStep;
pub use eventbridge::EventBridgeStep;
pub use iam::IamStep;
pub use lambda::LambdaStep;
pub use monad_core::Step;
pub use retry::{RetryPolicy, with_backoff};
pub use saga::Saga;

use monad_core::{ProviderResult, ProviderResultExt};
use tracing::debug;

/// Treat the listed provider error codes as success, logging what was ignored.
pub(crate) fn tolerate<T>(
    result: ProviderResult<T>,
    codes: &[&str],
    kind: &str,
    name: &str,
) -> ProviderResult<Option<T>> {
    if let Err(err) = &result {
        if err.is_any(codes) {
            debug!(kind, name, code = %err.code, "Ignoring provider error");
        }
    }
    result.swallow(codes)
}
