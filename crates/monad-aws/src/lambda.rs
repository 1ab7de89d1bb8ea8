//! Lambda functions and their resource policies.

use async_trait::async_trait;
use aws_sdk_lambda::Client;
use aws_sdk_lambda::types::{
    Architecture as SdkArchitecture, Environment, EphemeralStorage, FunctionCode, LogFormat,
    LoggingConfig, PackageType, TracingConfig, TracingMode, VpcConfig,
};
use monad_core::error::codes;
use monad_core::provider::LambdaApi;
use monad_core::provider::lambda::{
    FunctionDefinition, FunctionSummary, NetworkConfig, Permission,
};
use monad_core::{Architecture, ProviderResult, ProviderResultExt, Tags};
use std::collections::HashMap;

use crate::error::{OrEmpty, SdkResultExt, build_error};

pub struct Lambda {
    client: Client,
}

impl Lambda {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

fn architecture(arch: Architecture) -> SdkArchitecture {
    match arch {
        Architecture::X86_64 => SdkArchitecture::X8664,
        Architecture::Arm64 => SdkArchitecture::Arm64,
    }
}

fn tag_map(tags: &Tags) -> HashMap<String, String> {
    tags.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
}

/// The VPC block of a request.
///
/// Create omits an empty config. Update always sends both lists, so empty
/// lists detach a previous attachment.
pub(crate) fn vpc_config(network: &NetworkConfig, always: bool) -> Option<VpcConfig> {
    if network.is_empty() && !always {
        return None;
    }
    Some(
        VpcConfig::builder()
            .set_subnet_ids(Some(network.subnet_ids.clone()))
            .set_security_group_ids(Some(network.security_group_ids.clone()))
            .build(),
    )
}

fn environment(function: &FunctionDefinition) -> Environment {
    Environment::builder()
        .set_variables(Some(
            function
                .environment
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        ))
        .build()
}

fn logging(function: &FunctionDefinition) -> LoggingConfig {
    LoggingConfig::builder()
        .log_format(LogFormat::Text)
        .log_group(&function.log_group)
        .build()
}

fn tracing_config() -> TracingConfig {
    TracingConfig::builder()
        .mode(TracingMode::PassThrough)
        .build()
}

#[async_trait]
impl LambdaApi for Lambda {
    async fn create_function(&self, function: &FunctionDefinition) -> ProviderResult<()> {
        let storage = EphemeralStorage::builder()
            .size(function.ephemeral_storage)
            .build()
            .map_err(build_error)?;

        self.client
            .create_function()
            .function_name(&function.name)
            .role(&function.role_arn)
            .package_type(PackageType::Image)
            .code(FunctionCode::builder().image_uri(&function.image_uri).build())
            .architectures(architecture(function.architecture))
            .memory_size(function.memory_size)
            .timeout(function.timeout)
            .ephemeral_storage(storage)
            .environment(environment(function))
            .set_vpc_config(vpc_config(&function.network, false))
            .tracing_config(tracing_config())
            .logging_config(logging(function))
            .set_tags(Some(tag_map(&function.tags)))
            .send()
            .await
            .provider()?;
        Ok(())
    }

    async fn update_function_configuration(
        &self,
        function: &FunctionDefinition,
    ) -> ProviderResult<()> {
        let storage = EphemeralStorage::builder()
            .size(function.ephemeral_storage)
            .build()
            .map_err(build_error)?;

        self.client
            .update_function_configuration()
            .function_name(&function.name)
            .role(&function.role_arn)
            .memory_size(function.memory_size)
            .timeout(function.timeout)
            .ephemeral_storage(storage)
            .environment(environment(function))
            .set_vpc_config(vpc_config(&function.network, true))
            .tracing_config(tracing_config())
            .logging_config(logging(function))
            .send()
            .await
            .provider()?;
        Ok(())
    }

    async fn update_function_role(&self, name: &str, role_arn: &str) -> ProviderResult<()> {
        self.client
            .update_function_configuration()
            .function_name(name)
            .role(role_arn)
            .send()
            .await
            .provider()?;
        Ok(())
    }

    async fn update_function_code(
        &self,
        name: &str,
        image_uri: &str,
        arch: Architecture,
    ) -> ProviderResult<()> {
        self.client
            .update_function_code()
            .function_name(name)
            .image_uri(image_uri)
            .architectures(architecture(arch))
            .send()
            .await
            .provider()?;
        Ok(())
    }

    async fn put_function_event_invoke_config(
        &self,
        name: &str,
        maximum_retry_attempts: i32,
    ) -> ProviderResult<()> {
        self.client
            .put_function_event_invoke_config()
            .function_name(name)
            .maximum_retry_attempts(maximum_retry_attempts)
            .send()
            .await
            .provider()?;
        Ok(())
    }

    async fn tag_function(&self, arn: &str, tags: &Tags) -> ProviderResult<()> {
        self.client
            .tag_resource()
            .resource(arn)
            .set_tags(Some(tag_map(tags)))
            .send()
            .await
            .provider()?;
        Ok(())
    }

    async fn delete_function(&self, name: &str) -> ProviderResult<()> {
        self.client
            .delete_function()
            .function_name(name)
            .send()
            .await
            .provider()?;
        Ok(())
    }

    async fn add_permission(&self, permission: &Permission) -> ProviderResult<()> {
        self.client
            .add_permission()
            .function_name(&permission.function_name)
            .statement_id(&permission.statement_id)
            .action("lambda:InvokeFunction")
            .principal(&permission.principal)
            .source_arn(&permission.source_arn)
            .send()
            .await
            .provider()?;
        Ok(())
    }

    async fn remove_permission(
        &self,
        function_name: &str,
        statement_id: &str,
    ) -> ProviderResult<()> {
        self.client
            .remove_permission()
            .function_name(function_name)
            .statement_id(statement_id)
            .send()
            .await
            .provider()?;
        Ok(())
    }

    async fn get_policy(&self, function_name: &str) -> ProviderResult<Option<String>> {
        let out = self
            .client
            .get_policy()
            .function_name(function_name)
            .send()
            .await
            .provider()
            .swallow(&[codes::RESOURCE_NOT_FOUND])?;
        Ok(out.and_then(|o| o.policy().map(str::to_string)))
    }

    async fn list_functions(&self) -> ProviderResult<Vec<FunctionSummary>> {
        let mut functions = Vec::new();
        let mut marker = None;
        loop {
            let out = self
                .client
                .list_functions()
                .set_marker(marker)
                .send()
                .await
                .provider()?;

            for f in out.functions() {
                let arn = f.function_arn().or_empty();
                let tags = self
                    .client
                    .list_tags()
                    .resource(&arn)
                    .send()
                    .await
                    .provider()?
                    .tags()
                    .map(|t| t.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
                    .unwrap_or_default();
                functions.push(FunctionSummary {
                    name: f.function_name().or_empty(),
                    arn,
                    tags,
                });
            }

            marker = out.next_marker().map(str::to_string);
            if marker.is_none() {
                break;
            }
        }
        Ok(functions)
    }
}
