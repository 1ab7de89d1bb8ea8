//! Event buses and rules.

use async_trait::async_trait;

use crate::{ProviderResult, Tags};

/// What triggers a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleExpression {
    /// `cron(...)` or `rate(...)`.
    Schedule(String),
    /// A JSON event pattern.
    Pattern(String),
}

impl RuleExpression {
    /// Classify a rule document by its prefix.
    pub fn classify(document: &str) -> Self {
        let trimmed = document.trim();
        if trimmed.starts_with("cron(") || trimmed.starts_with("rate(") {
            Self::Schedule(trimmed.to_string())
        } else {
            Self::Pattern(trimmed.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Schedule(s) | Self::Pattern(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleDefinition {
    pub bus: String,
    pub name: String,
    pub expression: RuleExpression,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSummary {
    pub name: String,
    pub arn: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleTarget {
    pub id: String,
    pub arn: String,
}

#[async_trait]
pub trait EventBridgeApi: Send + Sync {
    async fn list_event_buses(&self) -> ProviderResult<Vec<String>>;

    async fn list_rule_names_by_target(
        &self,
        bus: &str,
        target_arn: &str,
    ) -> ProviderResult<Vec<String>>;

    async fn list_rules(&self, bus: &str, name_prefix: &str) -> ProviderResult<Vec<RuleSummary>>;

    /// Create or replace a rule; returns its ARN.
    async fn put_rule(&self, rule: &RuleDefinition) -> ProviderResult<String>;

    async fn put_targets(&self, bus: &str, rule: &str, targets: &[RuleTarget])
    -> ProviderResult<()>;

    async fn list_targets_by_rule(&self, bus: &str, rule: &str)
    -> ProviderResult<Vec<RuleTarget>>;

    async fn remove_targets(&self, bus: &str, rule: &str, ids: &[String]) -> ProviderResult<()>;

    async fn delete_rule(&self, bus: &str, name: &str) -> ProviderResult<()>;

    async fn tag_rule(&self, arn: &str, tags: &Tags) -> ProviderResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_schedule() {
        assert_eq!(
            RuleExpression::classify("rate(5 minutes)"),
            RuleExpression::Schedule("rate(5 minutes)".into())
        );
        assert_eq!(
            RuleExpression::classify("cron(0 12 * * ? *)"),
            RuleExpression::Schedule("cron(0 12 * * ? *)".into())
        );
    }

    #[test]
    fn test_classify_pattern() {
        let doc = r#"{"source":["aws.s3"]}"#;
        assert_eq!(
            RuleExpression::classify(doc),
            RuleExpression::Pattern(doc.into())
        );
        assert!(matches!(
            RuleExpression::classify("ratelimit"),
            RuleExpression::Pattern(_)
        ));
    }
}
