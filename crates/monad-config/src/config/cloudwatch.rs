//! Log group configuration.

use monad_core::{Tags, ValidationErrors};

use crate::settings::{Settings, keys};
use crate::{Basis, ConfigResult};

pub const DEFAULT_RETENTION: i32 = 14;

/// Retention periods the log service accepts, in days.
pub const RETENTION_DAYS: &[i32] = &[
    1, 3, 5, 7, 14, 30, 60, 90, 120, 150, 180, 365, 400, 545, 731, 1827, 3653,
];

pub fn log_group_name(path: &str) -> String {
    format!("/aws/lambda/{}", path)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudWatchConfig {
    pub name: String,
    pub arn: String,
    pub region: String,
    pub retention: i32,
    pub tags: Tags,
}

impl CloudWatchConfig {
    pub fn resolve(basis: &Basis, settings: &Settings) -> ConfigResult<Self> {
        let region = settings.get_or(keys::LOG_REGION, basis.region()).to_string();
        let name = log_group_name(basis.path());
        let config = Self {
            arn: format!(
                "arn:aws:logs:{}:{}:log-group:{}",
                region,
                basis.account_id(),
                name
            ),
            name,
            region,
            retention: settings
                .parse::<i32>(keys::LOG_RETENTION)?
                .unwrap_or(DEFAULT_RETENTION),
            tags: basis.tags().clone(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require("log group name", &self.name);
        errors.require("log region", &self.region);
        if !RETENTION_DAYS.contains(&self.retention) {
            errors.push(format!(
                "log retention {} must be one of {:?}",
                self.retention, RETENTION_DAYS
            ));
        }
        errors.into_result()
    }
}
