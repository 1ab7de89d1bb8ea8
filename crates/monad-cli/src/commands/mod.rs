//! CLI command implementations.

pub mod data;
pub mod ecr;
pub mod init;
pub mod list;
pub mod logs;

use anyhow::{Result, bail};
use monad_aws::Regions;
use monad_config::settings::keys;
use monad_config::{Basis, Config, Schema, Settings};
use monad_core::Clients;
use monad_step::Saga;
use tracing::info;

/// Settings plus provider clients for one invocation.
pub struct Context {
    pub settings: Settings,
    pub clients: Clients,
}

impl Context {
    pub async fn load(settings: Settings) -> Self {
        let shared = monad_aws::load_config().await;
        let clients = monad_aws::clients(&shared, &regions(&settings));
        Self { settings, clients }
    }

    pub async fn basis(&self) -> Result<Basis> {
        Ok(Basis::resolve(&self.settings, self.clients.identity.as_ref()).await?)
    }

    /// Basis, the schema of the service directory and the full config.
    pub async fn resolve(&self) -> Result<(Basis, Schema, Config)> {
        let basis = self.basis().await?;
        let schema = Schema::encode(&basis.git, &basis.service, &basis.dir)?;
        let config = Config::resolve(&basis, &schema, &self.settings, &self.clients).await?;
        Ok((basis, schema, config))
    }
}

pub fn regions(settings: &Settings) -> Regions {
    let region = |key| settings.get(key).map(str::to_string);
    Regions {
        lambda: region(keys::LAMBDA_REGION),
        logs: region(keys::LOG_REGION),
        apigateway: region(keys::API_REGION),
        eventbridge: region(keys::BUS_REGION),
        registry: region(keys::REGISTRY_REGION),
    }
}

/// Resolves on ctrl-c or SIGTERM with the signal's name.
pub async fn shutdown_signal() -> std::io::Result<&'static str> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        let mut terminate = signal(SignalKind::terminate())?;
        tokio::select! {
            r = tokio::signal::ctrl_c() => r.map(|_| "interrupt"),
            _ = terminate.recv() => Ok("terminate"),
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.map(|_| "interrupt")
    }
}

pub async fn deploy(ctx: &Context) -> Result<()> {
    let (basis, _, config) = ctx.resolve().await?;
    let saga = Saga::standard(&ctx.clients, &config);
    tokio::select! {
        r = saga.mount() => r?,
        signal = shutdown_signal() => bail!("deploy of {} stopped by {}", basis.name(), signal?),
    }
    info!(name = %basis.name(), "Deployed");
    println!("deployed {}", basis.name());
    Ok(())
}

pub async fn destroy(ctx: &Context) -> Result<()> {
    let (basis, _, config) = ctx.resolve().await?;
    let saga = Saga::standard(&ctx.clients, &config);
    tokio::select! {
        r = saga.unmount() => r?,
        signal = shutdown_signal() => bail!("destroy of {} stopped by {}", basis.name(), signal?),
    }
    info!(name = %basis.name(), "Destroyed");
    println!("destroyed {}", basis.name());
    Ok(())
}
