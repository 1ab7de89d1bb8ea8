//! Registry commands.

use anyhow::Result;
use monad_config::config::EcrConfig;
use monad_core::Step;
use monad_step::EcrStep;

use super::Context;

async fn step(ctx: &Context) -> Result<EcrStep> {
    let basis = ctx.basis().await?;
    let config = EcrConfig::resolve(&basis)?;
    Ok(EcrStep::with_config(ctx.clients.ecr.clone(), config))
}

pub async fn login(ctx: &Context) -> Result<()> {
    let credentials = step(ctx).await?.login().await?;
    monad_aws::docker::login(&credentials).await?;
    println!("Logged in to {}", credentials.endpoint);
    Ok(())
}

pub async fn untag(ctx: &Context, tag: Option<String>) -> Result<()> {
    step(ctx).await?.untag(tag.as_deref()).await?;
    Ok(())
}

pub async fn create(ctx: &Context) -> Result<()> {
    step(ctx).await?.mount().await?;
    Ok(())
}

pub async fn delete(ctx: &Context) -> Result<()> {
    step(ctx).await?.unmount().await?;
    Ok(())
}
