//! Ordered execution of steps.

use monad_config::Config;
use monad_core::{Clients, Result, Step};
use tracing::{error, info};

use crate::{ApiGatewayStep, CloudWatchStep, EventBridgeStep, IamStep, LambdaStep};

/// Runs steps forward on mount and in reverse on unmount.
///
/// Stops at the first failing step and returns its error. Nothing is rolled
/// back: every step is idempotent, so re-running converges.
pub struct Saga {
    steps: Vec<Box<dyn Step>>,
}

impl Saga {
    pub fn new(steps: Vec<Box<dyn Step>>) -> Self {
        Self { steps }
    }

    /// IAM, CloudWatch, Lambda, API Gateway, EventBridge.
    pub fn standard(clients: &Clients, config: &Config) -> Self {
        Self::new(vec![
            Box::new(IamStep::new(clients.iam.clone(), config)),
            Box::new(CloudWatchStep::new(clients.logs.clone(), config)),
            Box::new(LambdaStep::new(
                clients.lambda.clone(),
                clients.registry.clone(),
                config,
            )),
            Box::new(ApiGatewayStep::new(
                clients.apigateway.clone(),
                clients.lambda.clone(),
                config,
            )),
            Box::new(EventBridgeStep::new(
                clients.eventbridge.clone(),
                clients.lambda.clone(),
                config,
            )),
        ])
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    pub async fn mount(&self) -> Result<()> {
        for step in &self.steps {
            info!(step = step.name(), "Mounting");
            if let Err(e) = step.mount().await {
                error!(step = step.name(), err = %e, "Mount failed");
                return Err(e);
            }
        }
        info!(steps = self.steps.len(), "Mounted");
        Ok(())
    }

    pub async fn unmount(&self) -> Result<()> {
        for step in self.steps.iter().rev() {
            info!(step = step.name(), "Unmounting");
            if let Err(e) = step.unmount().await {
                error!(step = step.name(), err = %e, "Unmount failed");
                return Err(e);
            }
        }
        info!(steps = self.steps.len(), "Unmounted");
        Ok(())
    }
}
