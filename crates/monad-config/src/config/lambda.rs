//! Function configuration.

use monad_core::{ImageRef, Tags, ValidationErrors};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use crate::settings::{Settings, keys};
use crate::{Basis, ConfigError, ConfigResult, Schema};

pub const DEFAULT_MEMORY: i32 = 128;
pub const DEFAULT_TIMEOUT: i32 = 3;
pub const DEFAULT_STORAGE: i32 = 512;
pub const DEFAULT_RETRIES: i32 = 0;

const MEMORY_RANGE: RangeInclusive<i32> = 128..=10240;
const TIMEOUT_RANGE: RangeInclusive<i32> = 1..=900;
const STORAGE_RANGE: RangeInclusive<i32> = 512..=10240;
const RETRIES_RANGE: RangeInclusive<i32> = 0..=2;

pub fn function_arn(region: &str, account_id: &str, name: &str) -> String {
    format!("arn:aws:lambda:{}:{}:function:{}", region, account_id, name)
}

/// The rendered `resources.json` document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ResourceDocument {
    pub memory: Option<i32>,
    pub timeout: Option<i32>,
    pub storage: Option<i32>,
    pub retries: Option<i32>,
    pub env: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LambdaConfig {
    pub function_name: String,
    pub function_arn: String,
    pub region: String,
    pub image_uri: String,
    pub image: ImageRef,
    pub memory_size: i32,
    pub timeout: i32,
    pub ephemeral_storage: i32,
    pub retries: i32,
    pub env: BTreeMap<String, String>,
    pub tags: Tags,
}

impl LambdaConfig {
    pub fn resolve(basis: &Basis, schema: &Schema, settings: &Settings) -> ConfigResult<Self> {
        let region = settings
            .get_or(keys::LAMBDA_REGION, basis.region())
            .to_string();

        let data = basis.template_data();
        let document: ResourceDocument =
            serde_json::from_str(&schema.resource_document(&data)?).map_err(|e| {
                ConfigError::InvalidValue {
                    field: "resources".to_string(),
                    message: e.to_string(),
                }
            })?;

        let env_source = settings
            .file_or_inline(keys::ENV)?
            .unwrap_or_else(|| basis.env_template().to_string());
        let mut env = document.env;
        env.extend(parse_env(&basis.render(keys::ENV, &env_source)?)?);

        let image_uri = basis.image_uri();
        let image = ImageRef::parse(&image_uri).map_err(|e| ConfigError::InvalidValue {
            field: keys::IMAGE.to_string(),
            message: e.to_string(),
        })?;

        let config = Self {
            function_name: basis.name().to_string(),
            function_arn: function_arn(&region, basis.account_id(), basis.name()),
            region,
            image_uri,
            image,
            memory_size: sized(settings, keys::MEMORY, document.memory, DEFAULT_MEMORY)?,
            timeout: sized(settings, keys::TIMEOUT, document.timeout, DEFAULT_TIMEOUT)?,
            ephemeral_storage: sized(settings, keys::STORAGE, document.storage, DEFAULT_STORAGE)?,
            retries: sized(settings, keys::RETRIES, document.retries, DEFAULT_RETRIES)?,
            env,
            tags: basis.tags().clone(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require("function name", &self.function_name);
        errors.require("function region", &self.region);
        errors.require("image uri", &self.image_uri);
        check_range(&mut errors, "memory", self.memory_size, MEMORY_RANGE);
        check_range(&mut errors, "timeout", self.timeout, TIMEOUT_RANGE);
        check_range(&mut errors, "storage", self.ephemeral_storage, STORAGE_RANGE);
        check_range(&mut errors, "retries", self.retries, RETRIES_RANGE);
        errors.into_result()
    }
}

/// Environment variable, then resources document, then default.
fn sized(
    settings: &Settings,
    key: &str,
    document: Option<i32>,
    default: i32,
) -> ConfigResult<i32> {
    Ok(settings.parse::<i32>(key)?.or(document).unwrap_or(default))
}

fn check_range(errors: &mut ValidationErrors, field: &str, value: i32, range: RangeInclusive<i32>) {
    if !range.contains(&value) {
        errors.push(format!(
            "{} {} must be between {} and {}",
            field,
            value,
            range.start(),
            range.end()
        ));
    }
}

/// Parse `.env` content into key/value pairs.
pub fn parse_env(content: &str) -> ConfigResult<BTreeMap<String, String>> {
    dotenvy::from_read_iter(content.as_bytes())
        .map(|item| {
            item.map_err(|e| ConfigError::InvalidValue {
                field: keys::ENV.to_string(),
                message: e.to_string(),
            })
        })
        .collect()
}
