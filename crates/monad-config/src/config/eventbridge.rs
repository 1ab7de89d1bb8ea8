//! Event bus rule configuration.

use monad_core::provider::EventBridgeApi;
use monad_core::provider::eventbridge::{RuleDefinition, RuleExpression};
use monad_core::{Tags, ValidationErrors};
use std::collections::BTreeMap;

use crate::config::lambda::function_arn;
use crate::settings::{Settings, keys};
use crate::{Basis, ConfigResult, Schema};

pub const DEFAULT_BUS: &str = "default";
pub const PRINCIPAL: &str = "events.amazonaws.com";

/// One rule targeting the function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleConfig {
    pub name: String,
    pub expression: RuleExpression,
    pub permission_statement_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventBridgeConfig {
    pub region: String,
    pub account_id: String,
    pub bus_name: String,
    pub rules: Vec<RuleConfig>,
    pub function_name: String,
    pub function_arn: String,
    pub tags: Tags,
}

impl EventBridgeConfig {
    /// Rules come from the schema's bus documents, or from a single
    /// `MONAD_BUS_RULE` document named after the service.
    pub async fn resolve(
        basis: &Basis,
        schema: &Schema,
        settings: &Settings,
        eventbridge: &dyn EventBridgeApi,
    ) -> ConfigResult<Self> {
        let region = settings.get_or(keys::BUS_REGION, basis.region()).to_string();
        let bus_name = settings.get_or(keys::BUS_NAME, DEFAULT_BUS).to_string();

        let documents = match settings.file_or_inline(keys::BUS_RULE)? {
            Some(source) => BTreeMap::from([(
                basis.name().to_string(),
                basis.render(keys::BUS_RULE, &source)?,
            )]),
            None => schema
                .event_bridge_documents(&basis.template_data())?
                .into_iter()
                .map(|(file, document)| (format!("{}-{}", basis.name(), file), document))
                .collect(),
        };

        let rules = documents
            .into_iter()
            .map(|(name, document)| RuleConfig {
                permission_statement_id: statement_id(&bus_name, &name),
                expression: RuleExpression::classify(&document),
                name,
            })
            .collect();

        let mut errors = ValidationErrors::new();
        let buses = eventbridge.list_event_buses().await?;
        if !buses.iter().any(|b| *b == bus_name) {
            errors.push(format!("event bus {} not found", bus_name));
        }

        let config = Self {
            function_arn: function_arn(
                settings.get_or(keys::LAMBDA_REGION, basis.region()),
                basis.account_id(),
                basis.name(),
            ),
            function_name: basis.name().to_string(),
            account_id: basis.account_id().to_string(),
            region,
            bus_name,
            rules,
            tags: basis.tags().clone(),
        };
        if let Err(e) = config.validate() {
            errors.extend(e);
        }
        errors.into_result()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require("bus name", &self.bus_name);
        for rule in &self.rules {
            if let RuleExpression::Pattern(pattern) = &rule.expression {
                if serde_json::from_str::<serde_json::Value>(pattern).is_err() {
                    errors.push(format!("rule {} is neither a schedule nor JSON", rule.name));
                }
            }
        }
        errors.into_result()
    }

    pub fn definitions(&self) -> Vec<RuleDefinition> {
        self.rules
            .iter()
            .map(|rule| RuleDefinition {
                bus: self.bus_name.clone(),
                name: rule.name.clone(),
                expression: rule.expression.clone(),
            })
            .collect()
    }
}

/// `eventbridge-{bus}-{rule}`, restricted to the characters statement ids allow.
pub fn statement_id(bus: &str, rule: &str) -> String {
    format!("eventbridge-{}-{}", bus, rule)
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
