use std::net::SocketAddr;
use std::sync::Arc;

use safenav::api::{self, AppState};
use safenav::config::Config;
use safenav::incident::IncidentStore;
use safenav::provider::MapboxProvider;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("safenav=debug".parse()?),
        )
        .init();

    let config = Config::from_env();

    // 1. Load incident data once; read-only from here on
    let store = Arc::new(IncidentStore::load(&config.incidents_path));

    // 2. Routing provider
    if config.mapbox_access_token.is_empty() {
        tracing::warn!("MAPBOX_ACCESS_TOKEN is not set, routing requests will be rejected by the provider");
    }
    let provider = Arc::new(MapboxProvider::new(&config)?);

    let shared_state = Arc::new(AppState { store, provider });

    // 3. Router (permissive CORS so the map clients can call it directly)
    let app = api::router(shared_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    tracing::info!("API server listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
