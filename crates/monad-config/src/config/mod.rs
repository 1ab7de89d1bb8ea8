//! Per-resource configuration.
//!
//! Every sub-config is derived from the basis, the label schema and settings.
//! Resolution reports every problem across all resources at once.

pub mod apigateway;
pub mod cloudwatch;
pub mod ecr;
pub mod eventbridge;
pub mod iam;
pub mod lambda;
pub mod vpc;

use monad_core::{Clients, ValidationErrors};
use tracing::debug;

pub use apigateway::ApiGatewayConfig;
pub use cloudwatch::CloudWatchConfig;
pub use ecr::EcrConfig;
pub use eventbridge::{EventBridgeConfig, RuleConfig};
pub use iam::IamConfig;
pub use lambda::LambdaConfig;
pub use vpc::VpcConfig;

use crate::settings::Settings;
use crate::{Basis, ConfigError, ConfigResult, Schema};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub iam: IamConfig,
    pub cloudwatch: CloudWatchConfig,
    pub lambda: LambdaConfig,
    pub ecr: EcrConfig,
    pub vpc: VpcConfig,
    pub apigateway: ApiGatewayConfig,
    pub eventbridge: EventBridgeConfig,
}

impl Config {
    pub async fn resolve(
        basis: &Basis,
        schema: &Schema,
        settings: &Settings,
        clients: &Clients,
    ) -> ConfigResult<Self> {
        let mut errors = ValidationErrors::new();

        let iam = collect(IamConfig::resolve(basis, schema, settings), &mut errors)?;
        let cloudwatch = collect(CloudWatchConfig::resolve(basis, settings), &mut errors)?;
        let lambda = collect(LambdaConfig::resolve(basis, schema, settings), &mut errors)?;
        let ecr = collect(EcrConfig::resolve(basis), &mut errors)?;
        let vpc = collect(
            VpcConfig::resolve(settings, clients.ec2.as_ref()).await,
            &mut errors,
        )?;
        let apigateway = collect(
            ApiGatewayConfig::resolve(basis, settings, clients.apigateway.as_ref()).await,
            &mut errors,
        )?;
        let eventbridge = collect(
            EventBridgeConfig::resolve(basis, schema, settings, clients.eventbridge.as_ref())
                .await,
            &mut errors,
        )?;

        let (
            Some(iam),
            Some(cloudwatch),
            Some(lambda),
            Some(ecr),
            Some(vpc),
            Some(apigateway),
            Some(eventbridge),
        ) = (iam, cloudwatch, lambda, ecr, vpc, apigateway, eventbridge)
        else {
            return Err(ConfigError::Validation(errors));
        };

        debug!(name = %basis.name(), rules = eventbridge.rules.len(), "Resolved config");
        Ok(Self {
            iam,
            cloudwatch,
            lambda,
            ecr,
            vpc,
            apigateway,
            eventbridge,
        })
    }
}

/// Fold a sub-config failure into `errors`. Provider and IO failures abort.
fn collect<T>(result: ConfigResult<T>, errors: &mut ValidationErrors) -> ConfigResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(ConfigError::Validation(e)) => {
            errors.extend(e);
            Ok(None)
        }
        Err(e @ (ConfigError::Provider(_) | ConfigError::Io(_))) => Err(e),
        Err(e) => {
            errors.push(e.to_string());
            Ok(None)
        }
    }
}
