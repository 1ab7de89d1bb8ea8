//! AWS implementations of the monad provider traits.
//!
//! One adapter per service, each a thin wrapper over its SDK client that
//! reduces SDK errors to [`monad_core::ProviderError`]. [`clients`] builds the
//! full [`monad_core::Clients`] bundle with per-service regions.

pub mod apigateway;
pub mod clients;
pub mod docker;
pub mod ec2;
pub mod ecr;
pub mod error;
pub mod eventbridge;
pub mod iam;
pub mod lambda;
pub mod logs;
pub mod registry;
pub mod sts;

pub use apigateway::ApiGateway;
pub use clients::{Regions, clients, load_config};
pub use docker::LocalImages;
pub use ec2::Ec2;
pub use ecr::Ecr;
pub use eventbridge::EventBridge;
pub use iam::Iam;
pub use lambda::Lambda;
pub use logs::CloudWatchLogs;
pub use registry::EcrImageRegistry;
pub use sts::Sts;
