//! Routes, integrations and invoke permissions on an HTTP API.
//!
//! Mount is reset-then-rebuild: everything pointing at the function is removed
//! from every API, then the configured routes are created fresh.

use async_trait::async_trait;
use monad_config::Config;
use monad_config::config::ApiGatewayConfig;
use monad_config::config::apigateway::PRINCIPAL;
use monad_core::error::codes;
use monad_core::provider::apigateway::{IntegrationDefinition, RouteDefinition};
use monad_core::provider::lambda::Permission;
use monad_core::provider::{ApiGatewayApi, LambdaApi};
use monad_core::{ProviderResult, Result, Step};
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info};

use crate::tolerate;

pub struct ApiGatewayStep {
    apigateway: Arc<dyn ApiGatewayApi>,
    lambda: Arc<dyn LambdaApi>,
    config: ApiGatewayConfig,
}

/// Statement ids in a resource policy granted to `principal`.
pub fn statement_ids(policy: &str, principal: &str) -> Vec<String> {
    let Ok(policy) = serde_json::from_str::<Value>(policy) else {
        return Vec::new();
    };
    let statements = match &policy["Statement"] {
        Value::Array(statements) => statements.clone(),
        Value::Object(_) => vec![policy["Statement"].clone()],
        _ => Vec::new(),
    };
    statements
        .iter()
        .filter(|s| s["Principal"]["Service"].as_str() == Some(principal))
        .filter_map(|s| s["Sid"].as_str().map(str::to_string))
        .collect()
}

impl ApiGatewayStep {
    pub fn new(
        apigateway: Arc<dyn ApiGatewayApi>,
        lambda: Arc<dyn LambdaApi>,
        config: &Config,
    ) -> Self {
        Self {
            apigateway,
            lambda,
            config: config.apigateway.clone(),
        }
    }

    /// Remove routes and integrations targeting the function from one API.
    async fn clear_api(&self, api_id: &str) -> ProviderResult<()> {
        let gone = &[codes::NOT_FOUND];
        let ours: BTreeSet<String> = self
            .apigateway
            .get_integrations(api_id)
            .await?
            .into_iter()
            .filter(|i| i.uri == self.config.function_arn)
            .map(|i| i.id)
            .collect();
        if ours.is_empty() {
            return Ok(());
        }

        let targets: BTreeSet<String> = ours
            .iter()
            .map(|id| format!("integrations/{}", id))
            .collect();
        for route in self.apigateway.get_routes(api_id).await? {
            if route.target.as_ref().is_some_and(|t| targets.contains(t)) {
                tolerate(
                    self.apigateway.delete_route(api_id, &route.id).await,
                    gone,
                    "route",
                    &route.route_key,
                )?;
                info!(action = "delete", kind = "route", name = %route.route_key, api = %api_id);
            }
        }
        for id in &ours {
            tolerate(
                self.apigateway.delete_integration(api_id, id).await,
                gone,
                "integration",
                id,
            )?;
            info!(action = "delete", kind = "integration", name = %id, api = %api_id);
        }
        Ok(())
    }

    async fn clear_permissions(&self) -> ProviderResult<()> {
        let function = &self.config.function_name;
        let Some(policy) = self.lambda.get_policy(function).await? else {
            return Ok(());
        };
        for sid in statement_ids(&policy, PRINCIPAL) {
            tolerate(
                self.lambda.remove_permission(function, &sid).await,
                &[codes::RESOURCE_NOT_FOUND],
                "permission",
                &sid,
            )?;
            info!(action = "delete", kind = "permission", name = %sid);
        }
        Ok(())
    }
}

#[async_trait]
impl Step for ApiGatewayStep {
    fn name(&self) -> &'static str {
        "apigateway"
    }

    async fn mount(&self) -> Result<()> {
        self.unmount().await?;

        let c = &self.config;
        let Some(api_id) = c.api_id.as_deref() else {
            debug!(name = %c.function_name, "No API configured");
            return Ok(());
        };

        for (i, route_key) in c.routes.iter().enumerate() {
            let integration_id = self
                .apigateway
                .create_integration(
                    api_id,
                    &IntegrationDefinition {
                        function_arn: c.function_arn.clone(),
                        forwarded_prefix: c.forwarded_prefixes[i].clone(),
                    },
                )
                .await?;
            info!(action = "put", kind = "integration", name = %integration_id, api = %api_id);

            self.apigateway
                .create_route(
                    api_id,
                    &RouteDefinition {
                        route_key: route_key.clone(),
                        integration_id,
                        authorization_type: c.auth_types[i].clone(),
                        authorizer_id: c.authorizer_id(i),
                    },
                )
                .await?;
            info!(action = "put", kind = "route", name = %route_key, api = %api_id);

            let statement_id = c.statement_id(api_id, i);
            tolerate(
                self.lambda
                    .add_permission(&Permission {
                        function_name: c.function_name.clone(),
                        statement_id: statement_id.clone(),
                        principal: PRINCIPAL.to_string(),
                        source_arn: c.source_arn(api_id, i),
                    })
                    .await,
                &[codes::RESOURCE_CONFLICT],
                "permission",
                &statement_id,
            )?;
            info!(action = "put", kind = "permission", name = %statement_id);
        }
        Ok(())
    }

    async fn unmount(&self) -> Result<()> {
        for api in self.apigateway.get_apis().await? {
            self.clear_api(&api.id).await?;
        }
        self.clear_permissions().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{self, FakeCloud};
    use crate::lambda::LambdaStep;
    use crate::retry::RetryPolicy;
    use monad_config::settings::keys;
    use monad_core::provider::apigateway::{ApiSummary, IntegrationSummary, RouteSummary};

    const ROUTES: &str = "GET /svc/{proxy+},POST /hooks/{proxy+}";

    async fn setup(cloud: &Arc<FakeCloud>, extra: &[(&str, &str)]) -> (ApiGatewayStep, Config) {
        let dir = tempfile::tempdir().unwrap();
        let config = fake::config(cloud, dir.path(), extra).await;
        LambdaStep::new(cloud.clone(), cloud.clone(), &config)
            .with_retry(RetryPolicy::immediate(1))
            .mount()
            .await
            .unwrap();
        (ApiGatewayStep::new(cloud.clone(), cloud.clone(), &config), config)
    }

    #[test]
    fn test_statement_ids_by_principal() {
        let policy = r#"{"Statement":[
            {"Sid":"apigatewayv2-x-api1-0","Principal":{"Service":"apigateway.amazonaws.com"}},
            {"Sid":"eventbridge-default-x","Principal":{"Service":"events.amazonaws.com"}}
        ]}"#;
        assert_eq!(
            statement_ids(policy, PRINCIPAL),
            vec!["apigatewayv2-x-api1-0".to_string()]
        );
        assert!(statement_ids("not json", PRINCIPAL).is_empty());
    }

    #[tokio::test]
    async fn test_mount_builds_routes_with_unique_statements() {
        let cloud = FakeCloud::new();
        let (step, config) = setup(&cloud, &[(keys::API, "public"), (keys::ROUTE, ROUTES)]).await;

        step.mount().await.unwrap();

        let state = cloud.state.lock().unwrap();
        let routes = &state.routes["api1"];
        assert_eq!(routes.len(), 2);
        assert_eq!(state.integrations["api1"].len(), 2);

        let permissions = &state.permissions[&config.apigateway.function_name];
        let sids: BTreeSet<_> = permissions.iter().map(|p| p.statement_id.clone()).collect();
        assert_eq!(sids.len(), 2);
        assert!(sids.contains("apigatewayv2-svc-main-api-api1-0"));
        assert_eq!(
            permissions[1].source_arn,
            format!("arn:aws:execute-api:us-east-1:{}:api1/*/*/hooks/{{proxy+}}", fake::ACCOUNT)
        );
    }

    #[tokio::test]
    async fn test_remount_replaces_instead_of_duplicating() {
        let cloud = FakeCloud::new();
        let (step, config) = setup(&cloud, &[(keys::API, "api1"), (keys::ROUTE, ROUTES)]).await;

        step.mount().await.unwrap();
        step.mount().await.unwrap();

        let state = cloud.state.lock().unwrap();
        assert_eq!(state.routes["api1"].len(), 2);
        assert_eq!(state.integrations["api1"].len(), 2);
        assert_eq!(state.permissions[&config.apigateway.function_name].len(), 2);
    }

    #[tokio::test]
    async fn test_unmount_leaves_foreign_routes() {
        let cloud = FakeCloud::new();
        let (step, config) = setup(&cloud, &[(keys::API, "public")]).await;
        {
            let mut state = cloud.state.lock().unwrap();
            state.apis.push(ApiSummary {
                id: "api2".into(),
                name: "internal".into(),
            });
            state.integrations.insert(
                "api2".into(),
                vec![IntegrationSummary {
                    id: "int-other".into(),
                    uri: "arn:aws:lambda:us-east-1:123456789012:function:other".into(),
                }],
            );
            state.routes.insert(
                "api2".into(),
                vec![RouteSummary {
                    id: "route-other".into(),
                    route_key: "ANY /other/{proxy+}".into(),
                    target: Some("integrations/int-other".into()),
                }],
            );
        }

        step.mount().await.unwrap();
        step.unmount().await.unwrap();

        let state = cloud.state.lock().unwrap();
        assert!(state.routes["api1"].is_empty());
        assert!(state.integrations["api1"].is_empty());
        assert_eq!(state.routes["api2"].len(), 1);
        assert_eq!(state.integrations["api2"].len(), 1);
        assert!(state.permissions[&config.apigateway.function_name].is_empty());
    }

    #[tokio::test]
    async fn test_no_api_is_inert() {
        let cloud = FakeCloud::new();
        let (step, _) = setup(&cloud, &[]).await;

        step.mount().await.unwrap();
        assert!(cloud.calls_to("apigateway.create_").is_empty());
        assert!(cloud.state.lock().unwrap().routes.is_empty());
    }
}
