//! civdrone server - advice, route planning and subject tracking for civilian drone operators

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use civdrone_server::{api, config::Config, state::AppState};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("civdrone_server=debug".parse()?))
        .init();

    tracing::info!("Starting civdrone server...");

    let config = Config::from_env()?;
    let port = config.server_port;
    let state = Arc::new(AppState::new(&config)?);
    tracing::info!(
        ai_enabled = state.advisor().is_ai_enabled(),
        advisor_timeout_s = config.advisor_timeout.as_secs_f64(),
        "advisor ready"
    );

    let app = api::routes()
        .with_state(state.clone())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        );

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(client) = state.advisor().service() {
        client.shutdown();
    }
    tracing::info!("civdrone server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
