//! In-memory cloud used by the reconciler tests.
//!
//! Implements every provider trait over one shared inventory, mimics the
//! provider error codes the reconcilers triage on, and records each call.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use monad_config::settings::keys;
use monad_config::{Basis, Config, GitContext, Schema, Settings};
use monad_core::error::codes;
use monad_core::provider::apigateway::{
    ApiSummary, AuthorizerSummary, IntegrationDefinition, IntegrationSummary, RouteDefinition,
    RouteSummary,
};
use monad_core::provider::ecr::AuthorizationToken;
use monad_core::provider::eventbridge::{RuleDefinition, RuleSummary, RuleTarget};
use monad_core::provider::iam::PolicyVersion;
use monad_core::provider::lambda::{FunctionDefinition, FunctionSummary, Permission};
use monad_core::provider::logs::LogEventPage;
use monad_core::provider::*;
use monad_core::{
    Architecture, ImageConfig, ImageRef, ProviderError, ProviderResult, Tags,
};
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex};

pub const ACCOUNT: &str = "123456789012";
pub const REGION: &str = "us-east-1";
const IAM_LIMIT: usize = 5;

#[derive(Debug, Clone)]
pub struct Function {
    pub definition: FunctionDefinition,
    pub role_arn: String,
    pub image_uri: String,
    pub retries: Option<i32>,
    pub tags: Tags,
}

#[derive(Debug, Clone)]
pub struct Rule {
    pub arn: String,
    pub definition: RuleDefinition,
    pub targets: Vec<RuleTarget>,
    pub tags: Tags,
}

#[derive(Debug, Default)]
pub struct Inventory {
    pub policies: BTreeMap<String, Vec<PolicyVersion>>,
    pub policy_tags: BTreeMap<String, Tags>,
    pub roles: BTreeMap<String, String>,
    pub role_tags: BTreeMap<String, Tags>,
    pub attached: BTreeSet<(String, String)>,
    pub boundaries: BTreeMap<String, String>,
    pub log_groups: BTreeMap<String, i32>,
    pub log_group_tags: BTreeMap<String, Tags>,
    pub functions: BTreeMap<String, Function>,
    pub permissions: BTreeMap<String, Vec<Permission>>,
    pub apis: Vec<ApiSummary>,
    pub authorizers: Vec<AuthorizerSummary>,
    pub routes: BTreeMap<String, Vec<RouteSummary>>,
    pub integrations: BTreeMap<String, Vec<IntegrationSummary>>,
    pub buses: Vec<String>,
    pub rules: BTreeMap<(String, String), Rule>,
    pub repositories: BTreeSet<String>,
    pub untagged: Vec<String>,
    pub image: ImageConfig,
    next_id: u32,
}

impl Inventory {
    fn id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}{}", prefix, self.next_id)
    }
}

#[derive(Default)]
pub struct FakeCloud {
    pub state: Mutex<Inventory>,
    calls: Mutex<Vec<String>>,
    failures: Mutex<HashMap<String, VecDeque<ProviderError>>>,
}

fn err(code: &str, message: impl Into<String>) -> ProviderError {
    ProviderError::new(code, message)
}

impl FakeCloud {
    pub fn new() -> Arc<Self> {
        let cloud = Self::default();
        {
            let mut state = cloud.state.lock().unwrap();
            state.buses = vec!["default".into()];
            state.image = ImageConfig {
                architecture: "arm64".into(),
                os: "linux".into(),
                labels: BTreeMap::new(),
            };
            state.apis = vec![ApiSummary {
                id: "api1".into(),
                name: "public".into(),
            }];
        }
        Arc::new(cloud)
    }

    pub fn clients(self: &Arc<Self>) -> Clients {
        Clients {
            iam: self.clone(),
            logs: self.clone(),
            lambda: self.clone(),
            apigateway: self.clone(),
            eventbridge: self.clone(),
            ecr: self.clone(),
            ec2: self.clone(),
            identity: self.clone(),
            registry: self.clone(),
        }
    }

    /// Fail the next `times` calls to `op` with `code`.
    pub fn fail(&self, op: &str, code: &str, times: usize) {
        let mut failures = self.failures.lock().unwrap();
        let queue = failures.entry(op.to_string()).or_default();
        for _ in 0..times {
            queue.push_back(err(code, format!("injected {}", code)));
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls whose name starts with `prefix`.
    pub fn calls_to(&self, prefix: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.starts_with(prefix))
            .collect()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn call(&self, op: &str, subject: &str) -> ProviderResult<()> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{} {}", op, subject));
        match self.failures.lock().unwrap().get_mut(op) {
            Some(queue) => queue.pop_front().map_or(Ok(()), Err),
            None => Ok(()),
        }
    }

    fn policy_name(arn: &str) -> &str {
        arn.rsplit('/').next().unwrap_or(arn)
    }
}

#[async_trait]
impl IamApi for FakeCloud {
    async fn create_policy(&self, name: &str, _document: &str, tags: &Tags) -> ProviderResult<()> {
        self.call("iam.create_policy", name)?;
        let arn = format!("arn:aws:iam::{}:policy/{}", ACCOUNT, name);
        let mut state = self.state.lock().unwrap();
        if state.policies.contains_key(&arn) {
            return Err(err(codes::ENTITY_ALREADY_EXISTS, name));
        }
        state.policies.insert(
            arn.clone(),
            vec![PolicyVersion {
                version_id: "v1".into(),
                is_default: true,
            }],
        );
        state.policy_tags.insert(arn, tags.clone());
        Ok(())
    }

    async fn list_policy_versions(&self, policy_arn: &str) -> ProviderResult<Vec<PolicyVersion>> {
        self.call("iam.list_policy_versions", Self::policy_name(policy_arn))?;
        let state = self.state.lock().unwrap();
        state
            .policies
            .get(policy_arn)
            .cloned()
            .ok_or_else(|| err(codes::NO_SUCH_ENTITY, policy_arn))
    }

    async fn create_policy_version(&self, policy_arn: &str, _document: &str) -> ProviderResult<()> {
        self.call("iam.create_policy_version", Self::policy_name(policy_arn))?;
        let mut state = self.state.lock().unwrap();
        let versions = state
            .policies
            .get_mut(policy_arn)
            .ok_or_else(|| err(codes::NO_SUCH_ENTITY, policy_arn))?;
        if versions.len() >= IAM_LIMIT {
            return Err(err("LimitExceeded", "too many policy versions"));
        }
        let next = versions
            .iter()
            .filter_map(|v| v.version_id.trim_start_matches('v').parse::<u32>().ok())
            .max()
            .unwrap_or(0)
            + 1;
        for version in versions.iter_mut() {
            version.is_default = false;
        }
        versions.push(PolicyVersion {
            version_id: format!("v{}", next),
            is_default: true,
        });
        Ok(())
    }

    async fn delete_policy_version(&self, policy_arn: &str, version_id: &str) -> ProviderResult<()> {
        self.call("iam.delete_policy_version", version_id)?;
        let mut state = self.state.lock().unwrap();
        let versions = state
            .policies
            .get_mut(policy_arn)
            .ok_or_else(|| err(codes::NO_SUCH_ENTITY, policy_arn))?;
        match versions.iter().position(|v| v.version_id == version_id) {
            Some(i) if versions[i].is_default => {
                Err(err("DeleteConflict", "cannot delete the default version"))
            }
            Some(i) => {
                versions.remove(i);
                Ok(())
            }
            None => Err(err(codes::NO_SUCH_ENTITY, version_id)),
        }
    }

    async fn delete_policy(&self, policy_arn: &str) -> ProviderResult<()> {
        self.call("iam.delete_policy", Self::policy_name(policy_arn))?;
        let mut state = self.state.lock().unwrap();
        if state.attached.iter().any(|(_, arn)| arn == policy_arn) {
            return Err(err("DeleteConflict", "policy is attached"));
        }
        match state.policies.get(policy_arn) {
            None => Err(err(codes::NO_SUCH_ENTITY, policy_arn)),
            Some(versions) if versions.len() > 1 => {
                Err(err("DeleteConflict", "policy has non-default versions"))
            }
            Some(_) => {
                state.policies.remove(policy_arn);
                Ok(())
            }
        }
    }

    async fn tag_policy(&self, policy_arn: &str, tags: &Tags) -> ProviderResult<()> {
        self.call("iam.tag_policy", Self::policy_name(policy_arn))?;
        let mut state = self.state.lock().unwrap();
        state.policy_tags.insert(policy_arn.to_string(), tags.clone());
        Ok(())
    }

    async fn create_role(
        &self,
        name: &str,
        assume_role_document: &str,
        tags: &Tags,
    ) -> ProviderResult<()> {
        self.call("iam.create_role", name)?;
        let mut state = self.state.lock().unwrap();
        if state.roles.contains_key(name) {
            return Err(err(codes::ENTITY_ALREADY_EXISTS, name));
        }
        state
            .roles
            .insert(name.to_string(), assume_role_document.to_string());
        state.role_tags.insert(name.to_string(), tags.clone());
        Ok(())
    }

    async fn update_assume_role_policy(&self, name: &str, document: &str) -> ProviderResult<()> {
        self.call("iam.update_assume_role_policy", name)?;
        let mut state = self.state.lock().unwrap();
        match state.roles.get_mut(name) {
            Some(current) => {
                *current = document.to_string();
                Ok(())
            }
            None => Err(err(codes::NO_SUCH_ENTITY, name)),
        }
    }

    async fn tag_role(&self, name: &str, tags: &Tags) -> ProviderResult<()> {
        self.call("iam.tag_role", name)?;
        let mut state = self.state.lock().unwrap();
        if !state.roles.contains_key(name) {
            return Err(err(codes::NO_SUCH_ENTITY, name));
        }
        state
            .role_tags
            .entry(name.to_string())
            .or_default()
            .extend(tags.clone());
        Ok(())
    }

    async fn delete_role(&self, name: &str) -> ProviderResult<()> {
        self.call("iam.delete_role", name)?;
        let mut state = self.state.lock().unwrap();
        if state.attached.iter().any(|(role, _)| role == name) {
            return Err(err("DeleteConflict", "role has attached policies"));
        }
        state
            .roles
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| err(codes::NO_SUCH_ENTITY, name))
    }

    async fn attach_role_policy(&self, role: &str, policy_arn: &str) -> ProviderResult<()> {
        self.call("iam.attach_role_policy", role)?;
        let mut state = self.state.lock().unwrap();
        if !state.roles.contains_key(role) {
            return Err(err(codes::NO_SUCH_ENTITY, role));
        }
        state
            .attached
            .insert((role.to_string(), policy_arn.to_string()));
        Ok(())
    }

    async fn detach_role_policy(&self, role: &str, policy_arn: &str) -> ProviderResult<()> {
        self.call("iam.detach_role_policy", role)?;
        let mut state = self.state.lock().unwrap();
        if state
            .attached
            .remove(&(role.to_string(), policy_arn.to_string()))
        {
            Ok(())
        } else {
            Err(err(codes::NO_SUCH_ENTITY, role))
        }
    }

    async fn put_role_permissions_boundary(
        &self,
        role: &str,
        policy_arn: &str,
    ) -> ProviderResult<()> {
        self.call("iam.put_role_permissions_boundary", role)?;
        let mut state = self.state.lock().unwrap();
        state
            .boundaries
            .insert(role.to_string(), policy_arn.to_string());
        Ok(())
    }

    async fn delete_role_permissions_boundary(&self, role: &str) -> ProviderResult<()> {
        self.call("iam.delete_role_permissions_boundary", role)?;
        let mut state = self.state.lock().unwrap();
        state
            .boundaries
            .remove(role)
            .map(|_| ())
            .ok_or_else(|| err(codes::NO_SUCH_ENTITY, role))
    }
}

#[async_trait]
impl LogsApi for FakeCloud {
    async fn create_log_group(&self, name: &str, tags: &Tags) -> ProviderResult<()> {
        self.call("logs.create_log_group", name)?;
        let mut state = self.state.lock().unwrap();
        if state.log_groups.contains_key(name) {
            return Err(err(codes::RESOURCE_ALREADY_EXISTS, name));
        }
        state.log_groups.insert(name.to_string(), 0);
        state.log_group_tags.insert(name.to_string(), tags.clone());
        Ok(())
    }

    async fn tag_log_group(&self, arn: &str, tags: &Tags) -> ProviderResult<()> {
        self.call("logs.tag_log_group", arn)?;
        let name = arn.rsplit_once(":log-group:").map(|(_, n)| n).unwrap_or(arn);
        let mut state = self.state.lock().unwrap();
        state.log_group_tags.insert(name.to_string(), tags.clone());
        Ok(())
    }

    async fn put_retention_policy(&self, name: &str, days: i32) -> ProviderResult<()> {
        self.call("logs.put_retention_policy", name)?;
        let mut state = self.state.lock().unwrap();
        match state.log_groups.get_mut(name) {
            Some(retention) => {
                *retention = days;
                Ok(())
            }
            None => Err(err(codes::RESOURCE_NOT_FOUND, name)),
        }
    }

    async fn delete_log_group(&self, name: &str) -> ProviderResult<()> {
        self.call("logs.delete_log_group", name)?;
        let mut state = self.state.lock().unwrap();
        state
            .log_groups
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| err(codes::RESOURCE_NOT_FOUND, name))
    }

    async fn filter_log_events(
        &self,
        name: &str,
        _start_time: i64,
        _next_token: Option<String>,
    ) -> ProviderResult<LogEventPage> {
        self.call("logs.filter_log_events", name)?;
        Ok(LogEventPage::default())
    }
}

#[async_trait]
impl LambdaApi for FakeCloud {
    async fn create_function(&self, function: &FunctionDefinition) -> ProviderResult<()> {
        self.call("lambda.create_function", &function.name)?;
        let mut state = self.state.lock().unwrap();
        if state.functions.contains_key(&function.name) {
            return Err(err(codes::RESOURCE_CONFLICT, &function.name));
        }
        state.functions.insert(
            function.name.clone(),
            Function {
                definition: function.clone(),
                role_arn: function.role_arn.clone(),
                image_uri: function.image_uri.clone(),
                retries: None,
                tags: function.tags.clone(),
            },
        );
        Ok(())
    }

    async fn update_function_configuration(
        &self,
        function: &FunctionDefinition,
    ) -> ProviderResult<()> {
        self.call("lambda.update_function_configuration", &function.name)?;
        let mut state = self.state.lock().unwrap();
        let existing = state
            .functions
            .get_mut(&function.name)
            .ok_or_else(|| err(codes::RESOURCE_NOT_FOUND, &function.name))?;
        existing.definition = function.clone();
        existing.role_arn = function.role_arn.clone();
        Ok(())
    }

    async fn update_function_role(&self, name: &str, role_arn: &str) -> ProviderResult<()> {
        self.call("lambda.update_function_role", name)?;
        let mut state = self.state.lock().unwrap();
        let existing = state
            .functions
            .get_mut(name)
            .ok_or_else(|| err(codes::RESOURCE_NOT_FOUND, name))?;
        existing.role_arn = role_arn.to_string();
        Ok(())
    }

    async fn update_function_code(
        &self,
        name: &str,
        image_uri: &str,
        _architecture: Architecture,
    ) -> ProviderResult<()> {
        self.call("lambda.update_function_code", name)?;
        let mut state = self.state.lock().unwrap();
        let existing = state
            .functions
            .get_mut(name)
            .ok_or_else(|| err(codes::RESOURCE_NOT_FOUND, name))?;
        existing.image_uri = image_uri.to_string();
        Ok(())
    }

    async fn put_function_event_invoke_config(
        &self,
        name: &str,
        maximum_retry_attempts: i32,
    ) -> ProviderResult<()> {
        self.call("lambda.put_function_event_invoke_config", name)?;
        let mut state = self.state.lock().unwrap();
        let existing = state
            .functions
            .get_mut(name)
            .ok_or_else(|| err(codes::RESOURCE_NOT_FOUND, name))?;
        existing.retries = Some(maximum_retry_attempts);
        Ok(())
    }

    async fn tag_function(&self, arn: &str, tags: &Tags) -> ProviderResult<()> {
        self.call("lambda.tag_function", arn)?;
        let name = arn.rsplit(':').next().unwrap_or(arn);
        let mut state = self.state.lock().unwrap();
        if let Some(function) = state.functions.get_mut(name) {
            function.tags = tags.clone();
        }
        Ok(())
    }

    async fn delete_function(&self, name: &str) -> ProviderResult<()> {
        self.call("lambda.delete_function", name)?;
        let mut state = self.state.lock().unwrap();
        state.permissions.remove(name);
        state
            .functions
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| err(codes::RESOURCE_NOT_FOUND, name))
    }

    async fn add_permission(&self, permission: &Permission) -> ProviderResult<()> {
        self.call("lambda.add_permission", &permission.statement_id)?;
        let mut state = self.state.lock().unwrap();
        if !state.functions.contains_key(&permission.function_name) {
            return Err(err(codes::RESOURCE_NOT_FOUND, &permission.function_name));
        }
        let statements = state
            .permissions
            .entry(permission.function_name.clone())
            .or_default();
        if statements
            .iter()
            .any(|p| p.statement_id == permission.statement_id)
        {
            return Err(err(codes::RESOURCE_CONFLICT, &permission.statement_id));
        }
        statements.push(permission.clone());
        Ok(())
    }

    async fn remove_permission(&self, function_name: &str, statement_id: &str) -> ProviderResult<()> {
        self.call("lambda.remove_permission", statement_id)?;
        let mut state = self.state.lock().unwrap();
        let statements = state
            .permissions
            .get_mut(function_name)
            .ok_or_else(|| err(codes::RESOURCE_NOT_FOUND, function_name))?;
        match statements.iter().position(|p| p.statement_id == statement_id) {
            Some(i) => {
                statements.remove(i);
                Ok(())
            }
            None => Err(err(codes::RESOURCE_NOT_FOUND, statement_id)),
        }
    }

    async fn get_policy(&self, function_name: &str) -> ProviderResult<Option<String>> {
        self.call("lambda.get_policy", function_name)?;
        let state = self.state.lock().unwrap();
        let statements = match state.permissions.get(function_name) {
            Some(statements) if !statements.is_empty() => statements,
            _ => return Ok(None),
        };
        let statements: Vec<_> = statements
            .iter()
            .map(|p| {
                serde_json::json!({
                    "Sid": p.statement_id,
                    "Effect": "Allow",
                    "Principal": {"Service": p.principal},
                    "Action": "lambda:InvokeFunction",
                    "Resource": format!("arn:aws:lambda:{}:{}:function:{}", REGION, ACCOUNT, function_name),
                    "Condition": {"ArnLike": {"AWS:SourceArn": p.source_arn}},
                })
            })
            .collect();
        Ok(Some(
            serde_json::json!({"Version": "2012-10-17", "Id": "default", "Statement": statements})
                .to_string(),
        ))
    }

    async fn list_functions(&self) -> ProviderResult<Vec<FunctionSummary>> {
        self.call("lambda.list_functions", "")?;
        let state = self.state.lock().unwrap();
        Ok(state
            .functions
            .iter()
            .map(|(name, f)| FunctionSummary {
                name: name.clone(),
                arn: format!("arn:aws:lambda:{}:{}:function:{}", REGION, ACCOUNT, name),
                tags: f.tags.clone(),
            })
            .collect())
    }
}

#[async_trait]
impl ApiGatewayApi for FakeCloud {
    async fn get_apis(&self) -> ProviderResult<Vec<ApiSummary>> {
        self.call("apigateway.get_apis", "")?;
        Ok(self.state.lock().unwrap().apis.clone())
    }

    async fn get_routes(&self, api_id: &str) -> ProviderResult<Vec<RouteSummary>> {
        self.call("apigateway.get_routes", api_id)?;
        let state = self.state.lock().unwrap();
        Ok(state.routes.get(api_id).cloned().unwrap_or_default())
    }

    async fn get_integrations(&self, api_id: &str) -> ProviderResult<Vec<IntegrationSummary>> {
        self.call("apigateway.get_integrations", api_id)?;
        let state = self.state.lock().unwrap();
        Ok(state.integrations.get(api_id).cloned().unwrap_or_default())
    }

    async fn get_authorizers(&self, api_id: &str) -> ProviderResult<Vec<AuthorizerSummary>> {
        self.call("apigateway.get_authorizers", api_id)?;
        Ok(self.state.lock().unwrap().authorizers.clone())
    }

    async fn create_integration(
        &self,
        api_id: &str,
        integration: &IntegrationDefinition,
    ) -> ProviderResult<String> {
        self.call("apigateway.create_integration", api_id)?;
        let mut state = self.state.lock().unwrap();
        let id = state.id("int-");
        state
            .integrations
            .entry(api_id.to_string())
            .or_default()
            .push(IntegrationSummary {
                id: id.clone(),
                uri: integration.function_arn.clone(),
            });
        Ok(id)
    }

    async fn create_route(&self, api_id: &str, route: &RouteDefinition) -> ProviderResult<String> {
        self.call("apigateway.create_route", &route.route_key)?;
        let mut state = self.state.lock().unwrap();
        if state
            .routes
            .get(api_id)
            .is_some_and(|routes| routes.iter().any(|r| r.route_key == route.route_key))
        {
            return Err(err("ConflictException", &route.route_key));
        }
        let id = state.id("route-");
        state
            .routes
            .entry(api_id.to_string())
            .or_default()
            .push(RouteSummary {
                id: id.clone(),
                route_key: route.route_key.clone(),
                target: Some(format!("integrations/{}", route.integration_id)),
            });
        Ok(id)
    }

    async fn delete_route(&self, api_id: &str, route_id: &str) -> ProviderResult<()> {
        self.call("apigateway.delete_route", route_id)?;
        let mut state = self.state.lock().unwrap();
        let routes = state.routes.entry(api_id.to_string()).or_default();
        match routes.iter().position(|r| r.id == route_id) {
            Some(i) => {
                routes.remove(i);
                Ok(())
            }
            None => Err(err(codes::NOT_FOUND, route_id)),
        }
    }

    async fn delete_integration(&self, api_id: &str, integration_id: &str) -> ProviderResult<()> {
        self.call("apigateway.delete_integration", integration_id)?;
        let mut state = self.state.lock().unwrap();
        let integrations = state.integrations.entry(api_id.to_string()).or_default();
        match integrations.iter().position(|i| i.id == integration_id) {
            Some(i) => {
                integrations.remove(i);
                Ok(())
            }
            None => Err(err(codes::NOT_FOUND, integration_id)),
        }
    }
}

#[async_trait]
impl EventBridgeApi for FakeCloud {
    async fn list_event_buses(&self) -> ProviderResult<Vec<String>> {
        self.call("events.list_event_buses", "")?;
        Ok(self.state.lock().unwrap().buses.clone())
    }

    async fn list_rule_names_by_target(
        &self,
        bus: &str,
        target_arn: &str,
    ) -> ProviderResult<Vec<String>> {
        self.call("events.list_rule_names_by_target", bus)?;
        let state = self.state.lock().unwrap();
        Ok(state
            .rules
            .iter()
            .filter(|((b, _), rule)| b == bus && rule.targets.iter().any(|t| t.arn == target_arn))
            .map(|((_, name), _)| name.clone())
            .collect())
    }

    async fn list_rules(&self, bus: &str, name_prefix: &str) -> ProviderResult<Vec<RuleSummary>> {
        self.call("events.list_rules", name_prefix)?;
        let state = self.state.lock().unwrap();
        Ok(state
            .rules
            .iter()
            .filter(|((b, name), _)| b == bus && name.starts_with(name_prefix))
            .map(|((_, name), rule)| RuleSummary {
                name: name.clone(),
                arn: rule.arn.clone(),
            })
            .collect())
    }

    async fn put_rule(&self, rule: &RuleDefinition) -> ProviderResult<String> {
        self.call("events.put_rule", &rule.name)?;
        let arn = if rule.bus == "default" {
            format!("arn:aws:events:{}:{}:rule/{}", REGION, ACCOUNT, rule.name)
        } else {
            format!(
                "arn:aws:events:{}:{}:rule/{}/{}",
                REGION, ACCOUNT, rule.bus, rule.name
            )
        };
        let mut state = self.state.lock().unwrap();
        let entry = state
            .rules
            .entry((rule.bus.clone(), rule.name.clone()))
            .or_insert_with(|| Rule {
                arn: arn.clone(),
                definition: rule.clone(),
                targets: Vec::new(),
                tags: Tags::new(),
            });
        entry.definition = rule.clone();
        Ok(arn)
    }

    async fn put_targets(
        &self,
        bus: &str,
        rule: &str,
        targets: &[RuleTarget],
    ) -> ProviderResult<()> {
        self.call("events.put_targets", rule)?;
        let mut state = self.state.lock().unwrap();
        let existing = state
            .rules
            .get_mut(&(bus.to_string(), rule.to_string()))
            .ok_or_else(|| err(codes::RESOURCE_NOT_FOUND, rule))?;
        for target in targets {
            existing.targets.retain(|t| t.id != target.id);
            existing.targets.push(target.clone());
        }
        Ok(())
    }

    async fn list_targets_by_rule(
        &self,
        bus: &str,
        rule: &str,
    ) -> ProviderResult<Vec<RuleTarget>> {
        self.call("events.list_targets_by_rule", rule)?;
        let state = self.state.lock().unwrap();
        state
            .rules
            .get(&(bus.to_string(), rule.to_string()))
            .map(|r| r.targets.clone())
            .ok_or_else(|| err(codes::RESOURCE_NOT_FOUND, rule))
    }

    async fn remove_targets(&self, bus: &str, rule: &str, ids: &[String]) -> ProviderResult<()> {
        self.call("events.remove_targets", rule)?;
        let mut state = self.state.lock().unwrap();
        let existing = state
            .rules
            .get_mut(&(bus.to_string(), rule.to_string()))
            .ok_or_else(|| err(codes::RESOURCE_NOT_FOUND, rule))?;
        existing.targets.retain(|t| !ids.contains(&t.id));
        Ok(())
    }

    async fn delete_rule(&self, bus: &str, name: &str) -> ProviderResult<()> {
        self.call("events.delete_rule", name)?;
        let mut state = self.state.lock().unwrap();
        let key = (bus.to_string(), name.to_string());
        match state.rules.get(&key) {
            None => Err(err(codes::RESOURCE_NOT_FOUND, name)),
            Some(rule) if !rule.targets.is_empty() => {
                Err(err("ValidationException", "rule still has targets"))
            }
            Some(_) => {
                state.rules.remove(&key);
                Ok(())
            }
        }
    }

    async fn tag_rule(&self, arn: &str, tags: &Tags) -> ProviderResult<()> {
        self.call("events.tag_rule", arn)?;
        let mut state = self.state.lock().unwrap();
        if let Some(rule) = state.rules.values_mut().find(|r| r.arn == arn) {
            rule.tags = tags.clone();
        }
        Ok(())
    }
}

#[async_trait]
impl EcrApi for FakeCloud {
    async fn create_repository(
        &self,
        _registry_id: &str,
        name: &str,
        _tags: &Tags,
    ) -> ProviderResult<()> {
        self.call("ecr.create_repository", name)?;
        let mut state = self.state.lock().unwrap();
        if !state.repositories.insert(name.to_string()) {
            return Err(err(codes::REPOSITORY_ALREADY_EXISTS, name));
        }
        Ok(())
    }

    async fn delete_repository(&self, _registry_id: &str, name: &str) -> ProviderResult<()> {
        self.call("ecr.delete_repository", name)?;
        let mut state = self.state.lock().unwrap();
        if !state.repositories.remove(name) {
            return Err(err(codes::REPOSITORY_NOT_FOUND, name));
        }
        Ok(())
    }

    async fn authorization_token(&self, registry_id: &str) -> ProviderResult<AuthorizationToken> {
        self.call("ecr.authorization_token", registry_id)?;
        Ok(AuthorizationToken {
            token: STANDARD.encode("AWS:s3cr3t"),
            proxy_endpoint: format!("https://{}.dkr.ecr.{}.amazonaws.com", registry_id, REGION),
        })
    }

    async fn untag_image(&self, _registry_id: &str, name: &str, tag: &str) -> ProviderResult<()> {
        self.call("ecr.untag_image", tag)?;
        let mut state = self.state.lock().unwrap();
        if !state.repositories.contains(name) {
            return Err(err(codes::REPOSITORY_NOT_FOUND, name));
        }
        state.untagged.push(format!("{}:{}", name, tag));
        Ok(())
    }
}

#[async_trait]
impl Ec2Api for FakeCloud {
    async fn security_group_ids_by_name(&self, names: &[String]) -> ProviderResult<Vec<String>> {
        self.call("ec2.describe_security_groups", &names.join(","))?;
        Ok(names.iter().map(|n| format!("sg-{}", n)).collect())
    }

    async fn subnet_ids_by_name(&self, names: &[String]) -> ProviderResult<Vec<String>> {
        self.call("ec2.describe_subnets", &names.join(","))?;
        Ok(names.iter().map(|n| format!("subnet-{}", n)).collect())
    }
}

#[async_trait]
impl IdentityApi for FakeCloud {
    async fn caller_identity(&self) -> ProviderResult<Caller> {
        self.call("sts.get_caller_identity", "")?;
        Ok(caller())
    }
}

#[async_trait]
impl ImageRegistry for FakeCloud {
    async fn image_config(&self, image: &ImageRef) -> ProviderResult<ImageConfig> {
        self.call("registry.image_config", &image.to_string())?;
        Ok(self.state.lock().unwrap().image.clone())
    }
}

pub fn caller() -> Caller {
    Caller {
        account_id: ACCOUNT.into(),
        region: REGION.into(),
        arn: format!("arn:aws:iam::{}:user/ci", ACCOUNT),
        user_id: "AIDAEXAMPLE".into(),
    }
}

pub fn settings(extra: &[(&str, &str)]) -> Settings {
    let mut settings = Settings::from_pairs([
        (keys::OWNER, "acme"),
        (keys::REPO, "svc"),
        (keys::BRANCH, "main"),
        (keys::SHA, "abc123"),
        (keys::SERVICE, "api"),
    ]);
    for (key, value) in extra {
        settings.set(key, *value);
    }
    settings
}

/// Resolve a full config for the templates in `dir` against `cloud`.
pub async fn config(cloud: &Arc<FakeCloud>, dir: &Path, extra: &[(&str, &str)]) -> Config {
    let settings = settings(extra);
    let git = GitContext::resolve(&settings, dir);
    let basis = Basis::from_parts(&settings, git.clone(), caller(), dir).unwrap();
    let schema = Schema::encode(&git, &basis.service, dir).unwrap();
    Config::resolve(&basis, &schema, &settings, &cloud.clients())
        .await
        .unwrap()
}
