use std::net::SocketAddr;

use esports_arena_api::{build_router, config::Config, error, routes, store, AppState};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    let config = Config::from_env();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    if config.is_development() {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    }

    error::expose_error_detail(config.is_development());

    let store = store::open(&config).await?;
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let state = AppState::new(store, config);

    if let Err(e) = routes::auth::bootstrap_admin(&state).await {
        tracing::warn!(error = %e, "could not bootstrap admin account");
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, env = %state.config.node_env, "Esports Arena API listening");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
