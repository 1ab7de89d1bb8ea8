//! Provider API traits.
//!
//! Each trait covers the slice of one cloud service that the reconcilers use.
//! Implementations live in `monad-aws`; tests substitute in-memory fakes.

pub mod apigateway;
pub mod ec2;
pub mod ecr;
pub mod eventbridge;
pub mod iam;
pub mod identity;
pub mod lambda;
pub mod logs;
pub mod registry;

use std::sync::Arc;

pub use apigateway::ApiGatewayApi;
pub use ec2::Ec2Api;
pub use ecr::EcrApi;
pub use eventbridge::EventBridgeApi;
pub use iam::IamApi;
pub use identity::{Caller, IdentityApi};
pub use lambda::LambdaApi;
pub use logs::LogsApi;
pub use registry::ImageRegistry;

/// One client per provider service, each already bound to its region.
#[derive(Clone)]
pub struct Clients {
    pub iam: Arc<dyn IamApi>,
    pub logs: Arc<dyn LogsApi>,
    pub lambda: Arc<dyn LambdaApi>,
    pub apigateway: Arc<dyn ApiGatewayApi>,
    pub eventbridge: Arc<dyn EventBridgeApi>,
    pub ecr: Arc<dyn EcrApi>,
    pub ec2: Arc<dyn Ec2Api>,
    pub identity: Arc<dyn IdentityApi>,
    pub registry: Arc<dyn ImageRegistry>,
}
