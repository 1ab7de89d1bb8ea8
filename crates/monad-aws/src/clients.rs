//! Region-aware client construction.

use aws_config::{BehaviorVersion, Region, SdkConfig};
use monad_core::Clients;
use std::sync::Arc;
use tracing::debug;

use crate::{
    ApiGateway, CloudWatchLogs, Ec2, Ecr, EcrImageRegistry, EventBridge, Iam, Lambda, Sts,
};

/// Per-service region overrides. `None` falls back to the default region.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Regions {
    pub lambda: Option<String>,
    pub logs: Option<String>,
    pub apigateway: Option<String>,
    pub eventbridge: Option<String>,
    pub registry: Option<String>,
}

/// Load the shared SDK config from the environment.
pub async fn load_config() -> SdkConfig {
    aws_config::defaults(BehaviorVersion::latest()).load().await
}

fn region_for(shared: &SdkConfig, region: &Option<String>) -> Option<Region> {
    region
        .clone()
        .map(Region::new)
        .or_else(|| shared.region().cloned())
}

/// Build every provider client, each bound to its region.
pub fn clients(shared: &SdkConfig, regions: &Regions) -> Clients {
    debug!(?regions, default = ?shared.region(), "Building clients");

    let lambda_region = region_for(shared, &regions.lambda);
    let registry_region = region_for(shared, &regions.registry);

    let iam = aws_sdk_iam::Client::new(shared);
    let sts = aws_sdk_sts::Client::new(shared);
    let logs = aws_sdk_cloudwatchlogs::Client::from_conf(
        aws_sdk_cloudwatchlogs::config::Builder::from(shared)
            .region(region_for(shared, &regions.logs))
            .build(),
    );
    let lambda = aws_sdk_lambda::Client::from_conf(
        aws_sdk_lambda::config::Builder::from(shared)
            .region(lambda_region.clone())
            .build(),
    );
    let apigateway = aws_sdk_apigatewayv2::Client::from_conf(
        aws_sdk_apigatewayv2::config::Builder::from(shared)
            .region(region_for(shared, &regions.apigateway))
            .build(),
    );
    let eventbridge = aws_sdk_eventbridge::Client::from_conf(
        aws_sdk_eventbridge::config::Builder::from(shared)
            .region(region_for(shared, &regions.eventbridge))
            .build(),
    );
    let ec2 = aws_sdk_ec2::Client::from_conf(
        aws_sdk_ec2::config::Builder::from(shared)
            .region(lambda_region)
            .build(),
    );
    let ecr = aws_sdk_ecr::Client::from_conf(
        aws_sdk_ecr::config::Builder::from(shared)
            .region(registry_region)
            .build(),
    );

    Clients {
        iam: Arc::new(Iam::new(iam)),
        logs: Arc::new(CloudWatchLogs::new(logs)),
        lambda: Arc::new(Lambda::new(lambda)),
        apigateway: Arc::new(ApiGateway::new(apigateway)),
        eventbridge: Arc::new(EventBridge::new(eventbridge)),
        ecr: Arc::new(Ecr::new(ecr.clone())),
        ec2: Arc::new(Ec2::new(ec2)),
        identity: Arc::new(Sts::new(sts, shared.region().map(|r| r.to_string()))),
        registry: Arc::new(EcrImageRegistry::new(ecr)),
    }
}
