//! monad event handler server

use monad_api::{AppState, SagaHandler, routes};
use monad_aws::Regions;
use monad_config::Settings;
use monad_config::settings::keys;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_BIND: &str = "0.0.0.0:8080";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let settings = Settings::from_env();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if settings.get(keys::LOG_FORMAT) == Some("json") {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let regions = Regions {
        lambda: settings.get(keys::LAMBDA_REGION).map(str::to_string),
        logs: settings.get(keys::LOG_REGION).map(str::to_string),
        apigateway: settings.get(keys::API_REGION).map(str::to_string),
        eventbridge: settings.get(keys::BUS_REGION).map(str::to_string),
        registry: settings.get(keys::REGISTRY_REGION).map(str::to_string),
    };
    let shared = monad_aws::load_config().await;
    let clients = monad_aws::clients(&shared, &regions);

    let bind = settings.get_or(keys::BIND, DEFAULT_BIND).to_string();
    let state = AppState::new(Arc::new(SagaHandler::new(clients, settings)));
    let app = routes::router(state).layer(TraceLayer::new_for_http());

    info!("Starting server on {}", bind);
    let listener = TcpListener::bind(&bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
