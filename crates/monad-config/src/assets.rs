//! Default templates shipped with the binary.
//!
//! Used whenever a service does not provide its own.

pub const POLICY: &str = include_str!("../assets/policy.json.tmpl");
pub const ROLE: &str = include_str!("../assets/role.json.tmpl");
pub const RESOURCES: &str = include_str!("../assets/resources.json.tmpl");
pub const RULE: &str = include_str!("../assets/rule.json.tmpl");
pub const ENV: &str = include_str!("../assets/env.tmpl");

/// File names looked up in a service directory.
pub mod files {
    pub const POLICY: &str = "policy.json.tmpl";
    pub const ROLE: &str = "role.json.tmpl";
    pub const RESOURCES: &str = "resources.json.tmpl";
    pub const BUS_DIR: &str = "bus";
}
