//! Event rules targeting the function.
//!
//! A rule is "associated" with the function when one of its targets is the
//! function. Mount puts every defined rule and deletes associated rules that
//! are no longer defined.

use async_trait::async_trait;
use monad_config::Config;
use monad_config::config::EventBridgeConfig;
use monad_config::config::eventbridge::{PRINCIPAL, statement_id};
use monad_core::error::codes;
use monad_core::provider::eventbridge::RuleTarget;
use monad_core::provider::lambda::Permission;
use monad_core::provider::{EventBridgeApi, LambdaApi};
use monad_core::{ProviderResult, Result, Step};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::info;

use crate::tolerate;

pub struct EventBridgeStep {
    eventbridge: Arc<dyn EventBridgeApi>,
    lambda: Arc<dyn LambdaApi>,
    config: EventBridgeConfig,
}

impl EventBridgeStep {
    pub fn new(
        eventbridge: Arc<dyn EventBridgeApi>,
        lambda: Arc<dyn LambdaApi>,
        config: &Config,
    ) -> Self {
        Self {
            eventbridge,
            lambda,
            config: config.eventbridge.clone(),
        }
    }

    /// `(bus, rule)` pairs of every rule on any bus that targets the function.
    async fn associated(&self) -> ProviderResult<Vec<(String, String)>> {
        let mut rules = Vec::new();
        for bus in self.eventbridge.list_event_buses().await? {
            let names = self
                .eventbridge
                .list_rule_names_by_target(&bus, &self.config.function_arn)
                .await?;
            for name in names {
                let exists = self
                    .eventbridge
                    .list_rules(&bus, &name)
                    .await?
                    .iter()
                    .any(|r| r.name == name);
                if exists {
                    rules.push((bus.clone(), name));
                }
            }
        }
        Ok(rules)
    }

    /// Permission, then targets, then the rule.
    async fn delete_rule(&self, bus: &str, name: &str) -> ProviderResult<()> {
        let gone = &[codes::RESOURCE_NOT_FOUND];
        let sid = statement_id(bus, name);
        tolerate(
            self.lambda
                .remove_permission(&self.config.function_name, &sid)
                .await,
            gone,
            "permission",
            &sid,
        )?;

        let targets = tolerate(
            self.eventbridge.list_targets_by_rule(bus, name).await,
            gone,
            "rule",
            name,
        )?
        .unwrap_or_default();
        if !targets.is_empty() {
            let ids: Vec<String> = targets.into_iter().map(|t| t.id).collect();
            tolerate(
                self.eventbridge.remove_targets(bus, name, &ids).await,
                gone,
                "rule",
                name,
            )?;
        }

        tolerate(self.eventbridge.delete_rule(bus, name).await, gone, "rule", name)?;
        info!(action = "delete", kind = "rule", name = %name, bus = %bus);
        Ok(())
    }
}

#[async_trait]
impl Step for EventBridgeStep {
    fn name(&self) -> &'static str {
        "eventbridge"
    }

    async fn mount(&self) -> Result<()> {
        let c = &self.config;
        let target = RuleTarget {
            id: c.function_name.clone(),
            arn: c.function_arn.clone(),
        };

        for (rule, definition) in c.rules.iter().zip(c.definitions()) {
            let arn = self.eventbridge.put_rule(&definition).await?;
            self.eventbridge
                .put_targets(&c.bus_name, &rule.name, std::slice::from_ref(&target))
                .await?;
            tolerate(
                self.lambda
                    .add_permission(&Permission {
                        function_name: c.function_name.clone(),
                        statement_id: rule.permission_statement_id.clone(),
                        principal: PRINCIPAL.to_string(),
                        source_arn: arn.clone(),
                    })
                    .await,
                &[codes::RESOURCE_CONFLICT],
                "permission",
                &rule.permission_statement_id,
            )?;
            self.eventbridge.tag_rule(&arn, &c.tags).await?;
            info!(action = "put", kind = "rule", name = %rule.name, bus = %c.bus_name);
        }

        let defined: BTreeSet<(&str, &str)> = c
            .rules
            .iter()
            .map(|r| (c.bus_name.as_str(), r.name.as_str()))
            .collect();
        for (bus, name) in self.associated().await? {
            if !defined.contains(&(bus.as_str(), name.as_str())) {
                self.delete_rule(&bus, &name).await?;
            }
        }
        Ok(())
    }

    async fn unmount(&self) -> Result<()> {
        for (bus, name) in self.associated().await? {
            self.delete_rule(&bus, &name).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{self, FakeCloud};
    use crate::lambda::LambdaStep;
    use crate::retry::RetryPolicy;
    use monad_core::provider::eventbridge::RuleExpression;
    use std::path::Path;

    async fn setup(cloud: &Arc<FakeCloud>, dir: &Path) -> (EventBridgeStep, Config) {
        let config = fake::config(cloud, dir, &[]).await;
        LambdaStep::new(cloud.clone(), cloud.clone(), &config)
            .with_retry(RetryPolicy::immediate(1))
            .mount()
            .await
            .unwrap();
        (EventBridgeStep::new(cloud.clone(), cloud.clone(), &config), config)
    }

    fn write_rule(dir: &Path, file: &str, content: &str) {
        let bus = dir.join("bus");
        std::fs::create_dir_all(&bus).unwrap();
        std::fs::write(bus.join(file), content).unwrap();
    }

    #[tokio::test]
    async fn test_mount_puts_rules_targets_and_permissions() {
        let cloud = FakeCloud::new();
        let dir = tempfile::tempdir().unwrap();
        write_rule(dir.path(), "nightly.txt", "rate(1 day)");
        write_rule(
            dir.path(),
            "uploads.json.tmpl",
            r#"{"source": ["aws.s3"], "detail": {"bucket": ["{{.Git.Repo}}"]}}"#,
        );
        let (step, config) = setup(&cloud, dir.path()).await;

        step.mount().await.unwrap();

        let state = cloud.state.lock().unwrap();
        assert_eq!(state.rules.len(), 2);
        let nightly = &state.rules[&("default".to_string(), "svc-main-api-nightly".to_string())];
        assert_eq!(
            nightly.definition.expression,
            RuleExpression::Schedule("rate(1 day)".into())
        );
        assert_eq!(nightly.targets[0].arn, config.eventbridge.function_arn);
        assert_eq!(nightly.tags["Service"], "api");

        let uploads = &state.rules[&("default".to_string(), "svc-main-api-uploads".to_string())];
        assert!(uploads.definition.expression.as_str().contains(r#""bucket":["svc"]"#));

        let sids: Vec<_> = state.permissions[&config.lambda.function_name]
            .iter()
            .map(|p| p.statement_id.clone())
            .collect();
        assert_eq!(
            sids,
            vec![
                "eventbridge-default-svc-main-api-nightly",
                "eventbridge-default-svc-main-api-uploads"
            ]
        );
    }

    #[tokio::test]
    async fn test_remount_is_idempotent() {
        let cloud = FakeCloud::new();
        let dir = tempfile::tempdir().unwrap();
        write_rule(dir.path(), "nightly.txt", "rate(1 day)");
        let (step, config) = setup(&cloud, dir.path()).await;

        step.mount().await.unwrap();
        step.mount().await.unwrap();

        let state = cloud.state.lock().unwrap();
        assert_eq!(state.rules.len(), 1);
        assert_eq!(state.rules.values().next().unwrap().targets.len(), 1);
        assert_eq!(state.permissions[&config.lambda.function_name].len(), 1);
    }

    #[tokio::test]
    async fn test_drift_prunes_undefined_rules() {
        let cloud = FakeCloud::new();
        let dir = tempfile::tempdir().unwrap();
        write_rule(dir.path(), "nightly.txt", "rate(1 day)");
        write_rule(dir.path(), "hourly.txt", "rate(1 hour)");
        let (step, _) = setup(&cloud, dir.path()).await;
        step.mount().await.unwrap();
        assert_eq!(cloud.state.lock().unwrap().rules.len(), 2);

        std::fs::remove_file(dir.path().join("bus/hourly.txt")).unwrap();
        let (step, config) = setup(&cloud, dir.path()).await;
        step.mount().await.unwrap();

        let state = cloud.state.lock().unwrap();
        let names: Vec<_> = state.rules.keys().map(|(_, name)| name.clone()).collect();
        assert_eq!(names, vec!["svc-main-api-nightly"]);
        assert_eq!(state.permissions[&config.lambda.function_name].len(), 1);
    }

    #[tokio::test]
    async fn test_drift_prunes_foreign_rule_targeting_function() {
        let cloud = FakeCloud::new();
        let dir = tempfile::tempdir().unwrap();
        write_rule(dir.path(), "nightly.txt", "rate(1 day)");
        let (step, config) = setup(&cloud, dir.path()).await;
        step.mount().await.unwrap();

        let function = &config.eventbridge.function_name;
        let legacy_sid = statement_id("default", "legacy-rule");
        {
            let mut state = cloud.state.lock().unwrap();
            state.rules.insert(
                ("default".into(), "legacy-rule".into()),
                fake::Rule {
                    arn: "arn:aws:events:us-east-1:123456789012:rule/legacy-rule".into(),
                    definition: monad_core::provider::eventbridge::RuleDefinition {
                        bus: "default".into(),
                        name: "legacy-rule".into(),
                        expression: RuleExpression::Schedule("rate(1 hour)".into()),
                    },
                    targets: vec![RuleTarget {
                        id: function.clone(),
                        arn: config.eventbridge.function_arn.clone(),
                    }],
                    tags: Default::default(),
                },
            );
            state.permissions.get_mut(function).unwrap().push(Permission {
                function_name: function.clone(),
                statement_id: legacy_sid.clone(),
                principal: PRINCIPAL.to_string(),
                source_arn: "arn:aws:events:us-east-1:123456789012:rule/legacy-rule".into(),
            });
        }

        cloud.clear_calls();
        step.mount().await.unwrap();

        let position = |call: &str| cloud.calls().iter().position(|c| c == call).unwrap();
        assert!(
            position(&format!("lambda.remove_permission {}", legacy_sid))
                < position("events.remove_targets legacy-rule")
        );
        assert!(
            position("events.remove_targets legacy-rule")
                < position("events.delete_rule legacy-rule")
        );

        let state = cloud.state.lock().unwrap();
        let names: Vec<_> = state.rules.keys().map(|(_, name)| name.clone()).collect();
        assert_eq!(names, vec!["svc-main-api-nightly"]);
        let sids: Vec<_> = state.permissions[function]
            .iter()
            .map(|p| p.statement_id.clone())
            .collect();
        assert_eq!(sids, vec!["eventbridge-default-svc-main-api-nightly"]);
    }

    #[tokio::test]
    async fn test_unmount_deletes_associated_only() {
        let cloud = FakeCloud::new();
        let dir = tempfile::tempdir().unwrap();
        write_rule(dir.path(), "nightly.txt", "rate(1 day)");
        let (step, _) = setup(&cloud, dir.path()).await;
        step.mount().await.unwrap();
        {
            let mut state = cloud.state.lock().unwrap();
            state.rules.insert(
                ("default".into(), "someone-else".into()),
                fake::Rule {
                    arn: "arn:aws:events:us-east-1:123456789012:rule/someone-else".into(),
                    definition: monad_core::provider::eventbridge::RuleDefinition {
                        bus: "default".into(),
                        name: "someone-else".into(),
                        expression: RuleExpression::Schedule("rate(5 minutes)".into()),
                    },
                    targets: vec![RuleTarget {
                        id: "other".into(),
                        arn: "arn:aws:lambda:us-east-1:123456789012:function:other".into(),
                    }],
                    tags: Default::default(),
                },
            );
        }

        step.unmount().await.unwrap();
        step.unmount().await.unwrap();

        let state = cloud.state.lock().unwrap();
        assert_eq!(state.rules.len(), 1);
        assert!(state.rules.keys().all(|(_, name)| name == "someone-else"));
    }
}
