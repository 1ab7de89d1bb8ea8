//! API Gateway v2 HTTP APIs.

use async_trait::async_trait;
use aws_sdk_apigatewayv2::Client;
use aws_sdk_apigatewayv2::types::{AuthorizationType, IntegrationType};
use monad_core::ProviderResult;
use monad_core::provider::ApiGatewayApi;
use monad_core::provider::apigateway::{
    ApiSummary, AuthorizerSummary, IntegrationDefinition, IntegrationSummary, RouteDefinition,
    RouteSummary,
};

use crate::error::{OrEmpty, SdkResultExt};

pub const PAYLOAD_FORMAT_VERSION: &str = "2.0";
pub const FORWARDED_PREFIX_PARAMETER: &str = "overwrite:header.X-Forwarded-Prefix";
pub const PATH_PARAMETER: &str = "overwrite:path";
pub const PROXY_PATH: &str = "$request.path.proxy";

pub struct ApiGateway {
    client: Client,
}

impl ApiGateway {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ApiGatewayApi for ApiGateway {
    async fn get_apis(&self) -> ProviderResult<Vec<ApiSummary>> {
        let mut apis = Vec::new();
        let mut token = None;
        loop {
            let out = self
                .client
                .get_apis()
                .set_next_token(token)
                .send()
                .await
                .provider()?;
            apis.extend(out.items().iter().map(|a| ApiSummary {
                id: a.api_id().or_empty(),
                name: a.name().or_empty(),
            }));
            token = out.next_token().map(str::to_string);
            if token.is_none() {
                return Ok(apis);
            }
        }
    }

    async fn get_routes(&self, api_id: &str) -> ProviderResult<Vec<RouteSummary>> {
        let mut routes = Vec::new();
        let mut token = None;
        loop {
            let out = self
                .client
                .get_routes()
                .api_id(api_id)
                .set_next_token(token)
                .send()
                .await
                .provider()?;
            routes.extend(out.items().iter().map(|r| RouteSummary {
                id: r.route_id().or_empty(),
                route_key: r.route_key().or_empty(),
                target: r.target().map(str::to_string),
            }));
            token = out.next_token().map(str::to_string);
            if token.is_none() {
                return Ok(routes);
            }
        }
    }

    async fn get_integrations(&self, api_id: &str) -> ProviderResult<Vec<IntegrationSummary>> {
        let mut integrations = Vec::new();
        let mut token = None;
        loop {
            let out = self
                .client
                .get_integrations()
                .api_id(api_id)
                .set_next_token(token)
                .send()
                .await
                .provider()?;
            integrations.extend(out.items().iter().map(|i| IntegrationSummary {
                id: i.integration_id().or_empty(),
                uri: i.integration_uri().or_empty(),
            }));
            token = out.next_token().map(str::to_string);
            if token.is_none() {
                return Ok(integrations);
            }
        }
    }

    async fn get_authorizers(&self, api_id: &str) -> ProviderResult<Vec<AuthorizerSummary>> {
        let mut authorizers = Vec::new();
        let mut token = None;
        loop {
            let out = self
                .client
                .get_authorizers()
                .api_id(api_id)
                .set_next_token(token)
                .send()
                .await
                .provider()?;
            authorizers.extend(out.items().iter().map(|a| AuthorizerSummary {
                id: a.authorizer_id().or_empty(),
                name: a.name().or_empty(),
                authorizer_type: a
                    .authorizer_type()
                    .map(|t| t.as_str().to_string())
                    .unwrap_or_default(),
            }));
            token = out.next_token().map(str::to_string);
            if token.is_none() {
                return Ok(authorizers);
            }
        }
    }

    async fn create_integration(
        &self,
        api_id: &str,
        integration: &IntegrationDefinition,
    ) -> ProviderResult<String> {
        let out = self
            .client
            .create_integration()
            .api_id(api_id)
            .integration_type(IntegrationType::AwsProxy)
            .integration_uri(&integration.function_arn)
            .payload_format_version(PAYLOAD_FORMAT_VERSION)
            .request_parameters(FORWARDED_PREFIX_PARAMETER, &integration.forwarded_prefix)
            .request_parameters(PATH_PARAMETER, PROXY_PATH)
            .send()
            .await
            .provider()?;
        Ok(out.integration_id().or_empty())
    }

    async fn create_route(&self, api_id: &str, route: &RouteDefinition) -> ProviderResult<String> {
        let out = self
            .client
            .create_route()
            .api_id(api_id)
            .route_key(&route.route_key)
            .target(format!("integrations/{}", route.integration_id))
            .authorization_type(AuthorizationType::from(route.authorization_type.as_str()))
            .set_authorizer_id(route.authorizer_id.clone())
            .send()
            .await
            .provider()?;
        Ok(out.route_id().or_empty())
    }

    async fn delete_route(&self, api_id: &str, route_id: &str) -> ProviderResult<()> {
        self.client
            .delete_route()
            .api_id(api_id)
            .route_id(route_id)
            .send()
            .await
            .provider()?;
        Ok(())
    }

    async fn delete_integration(&self, api_id: &str, integration_id: &str) -> ProviderResult<()> {
        self.client
            .delete_integration()
            .api_id(api_id)
            .integration_id(integration_id)
            .send()
            .await
            .provider()?;
        Ok(())
    }
}
