//! HTTP APIs.

use async_trait::async_trait;

use crate::ProviderResult;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiSummary {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteSummary {
    pub id: String,
    pub route_key: String,
    /// `integrations/{id}` when the route targets an integration.
    pub target: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrationSummary {
    pub id: String,
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizerSummary {
    pub id: String,
    pub name: String,
    /// Provider authorizer type, e.g. `JWT` or `REQUEST`.
    pub authorizer_type: String,
}

/// A proxy integration forwarding to a function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrationDefinition {
    pub function_arn: String,
    pub forwarded_prefix: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDefinition {
    pub route_key: String,
    pub integration_id: String,
    pub authorization_type: String,
    pub authorizer_id: Option<String>,
}

#[async_trait]
pub trait ApiGatewayApi: Send + Sync {
    async fn get_apis(&self) -> ProviderResult<Vec<ApiSummary>>;

    async fn get_routes(&self, api_id: &str) -> ProviderResult<Vec<RouteSummary>>;

    async fn get_integrations(&self, api_id: &str) -> ProviderResult<Vec<IntegrationSummary>>;

    async fn get_authorizers(&self, api_id: &str) -> ProviderResult<Vec<AuthorizerSummary>>;

    /// Returns the new integration id.
    async fn create_integration(
        &self,
        api_id: &str,
        integration: &IntegrationDefinition,
    ) -> ProviderResult<String>;

    /// Returns the new route id.
    async fn create_route(&self, api_id: &str, route: &RouteDefinition) -> ProviderResult<String>;

    async fn delete_route(&self, api_id: &str, route_id: &str) -> ProviderResult<()>;

    async fn delete_integration(&self, api_id: &str, integration_id: &str) -> ProviderResult<()>;
}
