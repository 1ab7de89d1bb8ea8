//! Network attachment configuration.

use monad_core::ValidationErrors;
use monad_core::provider::Ec2Api;
use monad_core::provider::lambda::NetworkConfig;
use tracing::debug;

use crate::ConfigResult;
use crate::settings::{Settings, keys};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VpcConfig {
    pub security_group_ids: Vec<String>,
    pub subnet_ids: Vec<String>,
}

impl VpcConfig {
    /// Ids pass through verbatim; names are looked up.
    pub async fn resolve(settings: &Settings, ec2: &dyn Ec2Api) -> ConfigResult<Self> {
        let groups = settings.list(keys::SECURITY_GROUPS);
        let subnets = settings.list(keys::SUBNETS);

        let (mut security_group_ids, group_names) = split_ids(groups, "sg-");
        if !group_names.is_empty() {
            debug!(names = ?group_names, "Resolving security groups");
            security_group_ids.extend(ec2.security_group_ids_by_name(&group_names).await?);
        }

        let (mut subnet_ids, subnet_names) = split_ids(subnets, "subnet-");
        if !subnet_names.is_empty() {
            debug!(names = ?subnet_names, "Resolving subnets");
            subnet_ids.extend(ec2.subnet_ids_by_name(&subnet_names).await?);
        }

        let config = Self {
            security_group_ids,
            subnet_ids,
        };

        let mut errors = ValidationErrors::new();
        if !group_names.is_empty() && config.security_group_ids.is_empty() {
            errors.push(format!("no security groups named {}", group_names.join(", ")));
        }
        if !subnet_names.is_empty() && config.subnet_ids.is_empty() {
            errors.push(format!("no subnets named {}", subnet_names.join(", ")));
        }
        if let Err(e) = config.validate() {
            errors.extend(e);
        }
        errors.into_result()?;
        Ok(config)
    }

    pub fn is_empty(&self) -> bool {
        self.security_group_ids.is_empty() && self.subnet_ids.is_empty()
    }

    /// Security groups and subnets are both set or both empty.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.security_group_ids.is_empty() != self.subnet_ids.is_empty() {
            errors.push("security groups and subnets must be set together");
        }
        errors.into_result()
    }

    pub fn network(&self) -> NetworkConfig {
        NetworkConfig {
            subnet_ids: self.subnet_ids.clone(),
            security_group_ids: self.security_group_ids.clone(),
        }
    }
}

fn split_ids(values: Vec<String>, id_prefix: &str) -> (Vec<String>, Vec<String>) {
    values.into_iter().partition(|v| v.starts_with(id_prefix))
}
