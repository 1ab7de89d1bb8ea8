//! EventBridge rules and targets.

use async_trait::async_trait;
use aws_sdk_eventbridge::Client;
use aws_sdk_eventbridge::types::{RuleState, Tag, Target};
use monad_core::provider::EventBridgeApi;
use monad_core::provider::eventbridge::{RuleDefinition, RuleExpression, RuleSummary, RuleTarget};
use monad_core::{ProviderError, ProviderResult, Tags};

use crate::error::{OrEmpty, SdkResultExt, build_error};

pub struct EventBridge {
    client: Client,
}

impl EventBridge {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EventBridgeApi for EventBridge {
    async fn list_event_buses(&self) -> ProviderResult<Vec<String>> {
        let mut buses = Vec::new();
        let mut token = None;
        loop {
            let out = self
                .client
                .list_event_buses()
                .set_next_token(token)
                .send()
                .await
                .provider()?;
            buses.extend(out.event_buses().iter().map(|b| b.name().or_empty()));
            token = out.next_token().map(str::to_string);
            if token.is_none() {
                return Ok(buses);
            }
        }
    }

    async fn list_rule_names_by_target(
        &self,
        bus: &str,
        target_arn: &str,
    ) -> ProviderResult<Vec<String>> {
        let mut names = Vec::new();
        let mut token = None;
        loop {
            let out = self
                .client
                .list_rule_names_by_target()
                .event_bus_name(bus)
                .target_arn(target_arn)
                .set_next_token(token)
                .send()
                .await
                .provider()?;
            names.extend(out.rule_names().iter().cloned());
            token = out.next_token().map(str::to_string);
            if token.is_none() {
                return Ok(names);
            }
        }
    }

    async fn list_rules(&self, bus: &str, name_prefix: &str) -> ProviderResult<Vec<RuleSummary>> {
        let mut rules = Vec::new();
        let mut token = None;
        loop {
            let out = self
                .client
                .list_rules()
                .event_bus_name(bus)
                .name_prefix(name_prefix)
                .set_next_token(token)
                .send()
                .await
                .provider()?;
            rules.extend(out.rules().iter().map(|r| RuleSummary {
                name: r.name().or_empty(),
                arn: r.arn().or_empty(),
            }));
            token = out.next_token().map(str::to_string);
            if token.is_none() {
                return Ok(rules);
            }
        }
    }

    async fn put_rule(&self, rule: &RuleDefinition) -> ProviderResult<String> {
        let request = self
            .client
            .put_rule()
            .name(&rule.name)
            .event_bus_name(&rule.bus)
            .state(RuleState::Enabled);
        let request = match &rule.expression {
            RuleExpression::Schedule(expression) => request.schedule_expression(expression),
            RuleExpression::Pattern(pattern) => request.event_pattern(pattern),
        };
        let out = request.send().await.provider()?;
        Ok(out.rule_arn().or_empty())
    }

    async fn put_targets(
        &self,
        bus: &str,
        rule: &str,
        targets: &[RuleTarget],
    ) -> ProviderResult<()> {
        let targets = targets
            .iter()
            .map(|t| {
                Target::builder()
                    .id(&t.id)
                    .arn(&t.arn)
                    .build()
                    .map_err(build_error)
            })
            .collect::<ProviderResult<Vec<_>>>()?;

        let out = self
            .client
            .put_targets()
            .event_bus_name(bus)
            .rule(rule)
            .set_targets(Some(targets))
            .send()
            .await
            .provider()?;

        if let Some(failed) = out.failed_entries().first() {
            return Err(ProviderError::new(
                failed.error_code().or_empty(),
                failed.error_message().or_empty(),
            ));
        }
        Ok(())
    }

    async fn list_targets_by_rule(
        &self,
        bus: &str,
        rule: &str,
    ) -> ProviderResult<Vec<RuleTarget>> {
        let mut targets = Vec::new();
        let mut token = None;
        loop {
            let out = self
                .client
                .list_targets_by_rule()
                .event_bus_name(bus)
                .rule(rule)
                .set_next_token(token)
                .send()
                .await
                .provider()?;
            targets.extend(out.targets().iter().map(|t| RuleTarget {
                id: t.id().or_empty(),
                arn: t.arn().or_empty(),
            }));
            token = out.next_token().map(str::to_string);
            if token.is_none() {
                return Ok(targets);
            }
        }
    }

    async fn remove_targets(&self, bus: &str, rule: &str, ids: &[String]) -> ProviderResult<()> {
        self.client
            .remove_targets()
            .event_bus_name(bus)
            .rule(rule)
            .set_ids(Some(ids.to_vec()))
            .send()
            .await
            .provider()?;
        Ok(())
    }

    async fn delete_rule(&self, bus: &str, name: &str) -> ProviderResult<()> {
        self.client
            .delete_rule()
            .event_bus_name(bus)
            .name(name)
            .send()
            .await
            .provider()?;
        Ok(())
    }

    async fn tag_rule(&self, arn: &str, tags: &Tags) -> ProviderResult<()> {
        let tags = tags
            .iter()
            .map(|(k, v)| Tag::builder().key(k).value(v).build().map_err(build_error))
            .collect::<ProviderResult<Vec<_>>>()?;
        self.client
            .tag_resource()
            .resource_arn(arn)
            .set_tags(Some(tags))
            .send()
            .await
            .provider()?;
        Ok(())
    }
}
