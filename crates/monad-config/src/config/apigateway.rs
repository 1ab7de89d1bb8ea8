//! HTTP API route configuration.
//!
//! Each route carries its own auth. Auths are `none`, `aws_iam`, or the id or
//! name of an authorizer on the resolved API. One auth applies to every route.

use monad_core::ValidationErrors;
use monad_core::provider::ApiGatewayApi;
use monad_core::provider::apigateway::AuthorizerSummary;

use crate::config::lambda::function_arn;
use crate::settings::{Settings, keys};
use crate::{Basis, ConfigResult};

pub const PROXY: &str = "{proxy+}";
pub const AUTH_NONE: &str = "NONE";
pub const AUTH_IAM: &str = "AWS_IAM";
pub const DEFAULT_AUTH: &str = "aws_iam";
pub const PRINCIPAL: &str = "apigateway.amazonaws.com";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiGatewayConfig {
    pub region: String,
    pub account_id: String,
    /// `None` when no API is configured.
    pub api_id: Option<String>,
    pub routes: Vec<String>,
    pub auths: Vec<String>,
    pub auth_types: Vec<String>,
    /// Empty for built-in auth types.
    pub authorizer_ids: Vec<String>,
    pub forwarded_prefixes: Vec<String>,
    /// Prefix of every permission statement id; `-{apiId}-{i}` is appended.
    pub permission_statement_id: String,
    pub function_name: String,
    pub function_arn: String,
}

impl ApiGatewayConfig {
    pub async fn resolve(
        basis: &Basis,
        settings: &Settings,
        apigateway: &dyn ApiGatewayApi,
    ) -> ConfigResult<Self> {
        let region = settings.get_or(keys::API_REGION, basis.region()).to_string();
        let mut errors = ValidationErrors::new();

        let api_id = match settings.get(keys::API) {
            Some(api) => {
                let apis = apigateway.get_apis().await?;
                match apis.iter().find(|a| a.id == api || a.name == api) {
                    Some(found) => Some(found.id.clone()),
                    None => {
                        errors.push(format!("api {} not found", api));
                        None
                    }
                }
            }
            None => None,
        };

        let mut routes = settings.list(keys::ROUTE);
        if routes.is_empty() {
            routes.push(default_route(basis));
        }

        let mut auths = settings.list(keys::AUTH);
        if auths.is_empty() {
            auths.push(DEFAULT_AUTH.to_string());
        }
        if auths.len() == 1 && routes.len() > 1 {
            auths = vec![auths[0].clone(); routes.len()];
        }

        let authorizers = match &api_id {
            Some(id) if auths.iter().any(|a| !is_builtin(a)) => {
                apigateway.get_authorizers(id).await?
            }
            _ => Vec::new(),
        };

        let mut auth_types = Vec::with_capacity(auths.len());
        let mut authorizer_ids = Vec::with_capacity(auths.len());
        for auth in &auths {
            match resolve_auth(auth, &authorizers) {
                Some((auth_type, authorizer_id)) => {
                    auth_types.push(auth_type);
                    authorizer_ids.push(authorizer_id);
                }
                None => {
                    if api_id.is_some() {
                        errors.push(format!("authorizer {} not found", auth));
                    } else if settings.get(keys::API).is_none() {
                        errors.push(format!("authorizer {} requires {}", auth, keys::API));
                    }
                }
            }
        }

        let forwarded_prefixes = routes.iter().map(|r| forwarded_prefix(r)).collect();
        let config = Self {
            function_arn: function_arn(
                settings.get_or(keys::LAMBDA_REGION, basis.region()),
                basis.account_id(),
                basis.name(),
            ),
            function_name: basis.name().to_string(),
            permission_statement_id: format!("apigatewayv2-{}", basis.name()),
            account_id: basis.account_id().to_string(),
            region,
            api_id,
            routes,
            auths,
            auth_types,
            authorizer_ids,
            forwarded_prefixes,
        };

        if errors.is_empty() {
            if let Err(e) = config.validate() {
                errors.extend(e);
            }
        }
        errors.into_result()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let n = self.routes.len();
        if self.auths.len() != n || self.auth_types.len() != n || self.authorizer_ids.len() != n
        {
            errors.push(format!(
                "{} routes need as many auths, got {}",
                n,
                self.auths.len()
            ));
        }
        for route in &self.routes {
            if !route.contains(PROXY) || !route.ends_with(PROXY) {
                errors.push(format!("route {} must end with {}", route, PROXY));
            }
        }
        errors.into_result()
    }

    /// Unique permission statement id of route `index` on `api_id`.
    pub fn statement_id(&self, api_id: &str, index: usize) -> String {
        format!("{}-{}-{}", self.permission_statement_id, api_id, index)
    }

    /// Invoke permission source ARN of route `index` on `api_id`.
    pub fn source_arn(&self, api_id: &str, index: usize) -> String {
        let path = self
            .routes
            .get(index)
            .map(|r| route_path(r))
            .unwrap_or_default();
        format!(
            "arn:aws:execute-api:{}:{}:{}/*/*{}",
            self.region, self.account_id, api_id, path
        )
    }

    pub fn authorizer_id(&self, index: usize) -> Option<String> {
        self.authorizer_ids
            .get(index)
            .filter(|id| !id.is_empty())
            .cloned()
    }
}

/// `ANY /{repo}/{branch}/{service}/{proxy+}`.
pub fn default_route(basis: &Basis) -> String {
    format!("ANY /{}/{}", basis.path(), PROXY)
}

/// The route path without its method.
pub fn route_path(route: &str) -> &str {
    match route.split_once(' ') {
        Some((_, path)) => path.trim(),
        None => route.trim(),
    }
}

/// The route path without its method and trailing `/{proxy+}`.
pub fn forwarded_prefix(route: &str) -> String {
    let path = route_path(route);
    path.strip_suffix(PROXY)
        .unwrap_or(path)
        .trim_end_matches('/')
        .to_string()
}

fn is_builtin(auth: &str) -> bool {
    auth.eq_ignore_ascii_case("none") || auth.eq_ignore_ascii_case("aws_iam")
}

/// Auth type and authorizer id.
fn resolve_auth(auth: &str, authorizers: &[AuthorizerSummary]) -> Option<(String, String)> {
    if auth.eq_ignore_ascii_case("none") {
        return Some((AUTH_NONE.to_string(), String::new()));
    }
    if auth.eq_ignore_ascii_case("aws_iam") {
        return Some((AUTH_IAM.to_string(), String::new()));
    }

    let authorizer = authorizers.iter().find(|a| a.id == auth || a.name == auth)?;
    let auth_type = match authorizer.authorizer_type.as_str() {
        "REQUEST" => "CUSTOM",
        other => other,
    };
    Some((auth_type.to_string(), authorizer.id.clone()))
}
