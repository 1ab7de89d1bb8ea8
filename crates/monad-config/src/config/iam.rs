//! Role, policy and boundary configuration.

use monad_core::{Tags, ValidationErrors};

use crate::schema::compact_json;
use crate::settings::{Settings, keys};
use crate::{Basis, ConfigError, ConfigResult, Schema};

pub const ENI_ROLE_NAME: &str = "AWSLambdaVPCAccessExecutionRole";
pub const ENI_ROLE_POLICY_ARN: &str =
    "arn:aws:iam::aws:policy/service-role/AWSLambdaVPCAccessExecutionRole";

pub fn role_arn(account_id: &str, name: &str) -> String {
    format!("arn:aws:iam::{}:role/{}", account_id, name)
}

pub fn policy_arn(account_id: &str, name: &str) -> String {
    format!("arn:aws:iam::{}:policy/{}", account_id, name)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IamConfig {
    pub policy_name: String,
    pub policy_arn: String,
    pub policy_document: String,
    pub role_name: String,
    pub role_arn: String,
    pub role_document: String,
    pub eni_role_name: String,
    pub eni_role_arn: String,
    pub eni_role_document: String,
    pub eni_role_policy_arn: String,
    /// Empty when no boundary is configured.
    pub boundary_policy_name: String,
    pub boundary_policy_arn: String,
    pub tags: Tags,
}

impl IamConfig {
    pub fn resolve(basis: &Basis, schema: &Schema, settings: &Settings) -> ConfigResult<Self> {
        let data = basis.template_data();

        let policy_document = match settings.file_or_inline(keys::POLICY)? {
            Some(source) => basis.render(keys::POLICY, &source)?,
            None => schema.policy_document(&data)?,
        };
        let role_document = match settings.file_or_inline(keys::ROLE)? {
            Some(source) => basis.render(keys::ROLE, &source)?,
            None => schema.role_document(&data)?,
        };
        let eni_role_document = basis.render("eni-role", basis.role_template())?;

        let (boundary_policy_name, boundary_policy_arn) = match settings.get(keys::BOUNDARY_POLICY)
        {
            Some(boundary) => match boundary.split_once(":policy/") {
                Some((_, name)) => (name.to_string(), boundary.to_string()),
                None => (
                    boundary.to_string(),
                    policy_arn(basis.account_id(), boundary),
                ),
            },
            None => (String::new(), String::new()),
        };

        let config = Self {
            policy_name: basis.name().to_string(),
            policy_arn: policy_arn(basis.account_id(), basis.name()),
            policy_document: compact_document(keys::POLICY, &policy_document)?,
            role_name: basis.name().to_string(),
            role_arn: role_arn(basis.account_id(), basis.name()),
            role_document: compact_document(keys::ROLE, &role_document)?,
            eni_role_name: ENI_ROLE_NAME.to_string(),
            eni_role_arn: role_arn(basis.account_id(), ENI_ROLE_NAME),
            eni_role_document: compact_document("eni-role", &eni_role_document)?,
            eni_role_policy_arn: ENI_ROLE_POLICY_ARN.to_string(),
            boundary_policy_name,
            boundary_policy_arn,
            tags: basis.tags().clone(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn has_boundary(&self) -> bool {
        !self.boundary_policy_arn.is_empty()
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require("policy name", &self.policy_name);
        errors.require("policy document", &self.policy_document);
        errors.require("role name", &self.role_name);
        errors.require("role document", &self.role_document);
        errors.require("eni role document", &self.eni_role_document);
        if self.has_boundary() {
            errors.require("boundary policy name", &self.boundary_policy_name);
        }
        errors.into_result()
    }
}

fn compact_document(field: &str, document: &str) -> ConfigResult<String> {
    compact_json(document).map_err(|e| ConfigError::InvalidValue {
        field: field.to_string(),
        message: format!("rendered document is not valid JSON: {}", e),
    })
}
