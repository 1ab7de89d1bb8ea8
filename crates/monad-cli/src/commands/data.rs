//! Template data and image label inspection.

use anyhow::{Context as _, Result};
use monad_aws::LocalImages;
use monad_config::settings::keys;
use monad_config::{Schema, Settings};
use monad_core::provider::ImageRegistry;
use monad_core::{ImageConfig, ImageRef};
use std::path::Path;

use super::Context;

/// `key  value` lines with keys padded to a common width.
pub fn format_table(rows: &[(&str, &str)]) -> String {
    let width = rows.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
    rows.iter()
        .map(|(k, v)| format!("{:width$}  {}\n", k, v, width = width))
        .collect()
}

/// Human summary of an image and its decoded labels.
pub fn describe(image: &ImageRef, config: &ImageConfig, schema: &Schema) -> String {
    let git = &schema.git;
    let rules = if schema.bus.is_empty() {
        "-".to_string()
    } else {
        schema.bus.keys().cloned().collect::<Vec<_>>().join(", ")
    };
    let dirty = if git.dirty { "yes" } else { "no" };
    let platform = format!("{}/{}", config.os, config.architecture);
    let repository = format!("{}/{}", git.owner, git.repo);

    let image = image.to_string();
    format_table(&[
        ("Image", image.as_str()),
        ("Platform", platform.as_str()),
        ("Schema", schema.version.as_str()),
        ("Service", schema.service.as_str()),
        ("Repository", repository.as_str()),
        ("Branch", git.branch.as_str()),
        ("Sha", git.sha.as_str()),
        ("Dirty", dirty),
        ("Origin", git.origin.as_str()),
        ("Rules", rules.as_str()),
    ])
}

pub async fn render(ctx: &Context, file: &Path) -> Result<()> {
    let basis = ctx.basis().await?;
    let source = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read template: {}", file.display()))?;
    print!("{}", basis.render(&file.display().to_string(), &source)?);
    Ok(())
}

pub async fn table(ctx: &Context) -> Result<()> {
    let basis = ctx.basis().await?;
    print!("{}", format_table(&basis.template_data().rows()));
    Ok(())
}

pub async fn labels(ctx: &Context, build_args: bool) -> Result<()> {
    let basis = ctx.basis().await?;
    let schema = Schema::encode(&basis.git, &basis.service, &basis.dir)?;
    if build_args {
        println!("{}", schema.docker_label_args().join(" "));
    } else {
        for (key, value) in schema.labels() {
            println!("{}={}", key, value);
        }
    }
    Ok(())
}

pub async fn env(ctx: &Context) -> Result<()> {
    let basis = ctx.basis().await?;
    let source = match ctx.settings.file_or_inline(keys::ENV)? {
        Some(source) => source,
        None => basis.env_template().to_string(),
    };
    print!("{}", basis.render("env", &source)?);
    Ok(())
}

/// Decode the labels of a local image.
///
/// A reference without a registry host is resolved against the service's
/// registry; no reference means the service image.
pub async fn image(settings: Settings, uri: Option<String>) -> Result<()> {
    let image = match uri.as_deref().map(ImageRef::parse) {
        Some(Ok(image)) => image,
        _ => {
            let basis = Context::load(settings).await.basis().await?;
            let uri = match uri {
                Some(uri) => format!("{}/{}", basis.registry.host(), uri),
                None => basis.image_uri(),
            };
            ImageRef::parse(&uri)?
        }
    };

    let config = LocalImages::new()?.image_config(&image).await?;
    let schema = Schema::decode(&config.labels)?;
    print!("{}", describe(&image, &config, &schema));
    Ok(())
}
