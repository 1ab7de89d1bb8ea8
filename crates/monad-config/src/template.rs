//! Template rendering for policy, role, resource, rule and env templates.
//!
//! Templates see:
//! - `Account.Id`, `Account.Region`
//! - `Git.Repo`, `Git.Owner`, `Git.Branch`, `Git.Sha`
//! - `Service.Name`
//! - `Resource.Name`, `Resource.Path`, `Resource.NamePrefix`, `Resource.PathPrefix`
//!
//! Field references may be written `{{ Git.Sha }}` or Go-style `{{.Git.Sha}}`.
//! Referencing an unknown field is an error, never an empty string.

use minijinja::{AutoEscape, Environment, UndefinedBehavior};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::sync::LazyLock;

use crate::ConfigResult;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TemplateData {
    pub account: AccountData,
    pub git: GitData,
    pub service: ServiceData,
    pub resource: ResourceData,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AccountData {
    pub id: String,
    pub region: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GitData {
    pub repo: String,
    pub owner: String,
    pub branch: String,
    pub sha: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceData {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResourceData {
    pub name: String,
    pub path: String,
    pub name_prefix: String,
    pub path_prefix: String,
}

impl TemplateData {
    /// Flattened `(key, value)` rows, e.g. `("Git.Sha", "abc123")`.
    pub fn rows(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("Account.Id", self.account.id.as_str()),
            ("Account.Region", self.account.region.as_str()),
            ("Git.Repo", self.git.repo.as_str()),
            ("Git.Owner", self.git.owner.as_str()),
            ("Git.Branch", self.git.branch.as_str()),
            ("Git.Sha", self.git.sha.as_str()),
            ("Service.Name", self.service.name.as_str()),
            ("Resource.Name", self.resource.name.as_str()),
            ("Resource.Path", self.resource.path.as_str()),
            ("Resource.NamePrefix", self.resource.name_prefix.as_str()),
            ("Resource.PathPrefix", self.resource.path_prefix.as_str()),
        ]
    }
}

// Regex for matching {{ ... }} actions
static ACTION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{\{(.*?)\}\}").unwrap());

// Regex for matching Go-style `.Field` references inside an action
static FIELD_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^|[\s(|,!-])\.([A-Za-z_])").unwrap());

/// Rewrite Go-style field references (`{{.Git.Sha}}`) into plain expressions.
pub fn normalize(source: &str) -> Cow<'_, str> {
    ACTION_REGEX.replace_all(source, |caps: &Captures| {
        format!("{{{{{}}}}}", FIELD_REGEX.replace_all(&caps[1], "${1}${2}"))
    })
}

/// Render `source` against `data`. `name` only appears in error messages.
pub fn render(name: &str, source: &str, data: &TemplateData) -> ConfigResult<String> {
    let source = normalize(source);
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env.set_auto_escape_callback(|_| AutoEscape::None);
    env.set_keep_trailing_newline(true);
    Ok(env.render_named_str(name, &source, data)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data() -> TemplateData {
        TemplateData {
            account: AccountData {
                id: "123456789012".into(),
                region: "us-east-1".into(),
            },
            git: GitData {
                repo: "svc".into(),
                owner: "acme".into(),
                branch: "feature/x".into(),
                sha: "abc123".into(),
            },
            service: ServiceData { name: "api".into() },
            resource: ResourceData {
                name: "svc-feature-x-api".into(),
                path: "svc/feature/x/api".into(),
                name_prefix: "svc-feature-x".into(),
                path_prefix: "svc/feature/x".into(),
            },
        }
    }

    #[test]
    fn test_go_style_reference() {
        let out = render("t", r#"{"sha": "{{.Git.Sha}}"}"#, &data()).unwrap();
        assert_eq!(out, r#"{"sha": "abc123"}"#);
    }

    #[test]
    fn test_plain_reference() {
        let out = render("t", "/aws/lambda/{{ Resource.Path }}", &data()).unwrap();
        assert_eq!(out, "/aws/lambda/svc/feature/x/api");
    }

    #[test]
    fn test_trim_markers() {
        let out = render("t", "a {{- .Service.Name -}} b", &data()).unwrap();
        assert_eq!(out, "aapib");
    }

    #[test]
    fn test_missing_key_is_error() {
        let err = render("policy.json.tmpl", "{{.Git.Shaa}}", &data()).unwrap_err();
        assert!(err.to_string().contains("template error"));
    }

    #[test]
    fn test_literal_dots_untouched() {
        let out = render("t", "v1.2 {{ Account.Region }}.amazonaws.com", &data()).unwrap();
        assert_eq!(out, "v1.2 us-east-1.amazonaws.com");
    }

    #[test]
    fn test_keeps_trailing_newline() {
        let out = render("t", "A={{.Git.Owner}}\n", &data()).unwrap();
        assert_eq!(out, "A=acme\n");
    }

    #[test]
    fn test_rows() {
        let data = data();
        let rows = data.rows();
        assert_eq!(rows.len(), 11);
        assert!(rows.contains(&("Resource.NamePrefix", "svc-feature-x")));
    }
}
