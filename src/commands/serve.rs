//! Serve command - Starts the HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;

use crate::api::{create_router, AppState, HttpSettings};
use crate::cli::ServeArgs;
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::infra::{Cache, Database, Probes};
use crate::services::Services;

/// Execute the serve command
pub async fn execute(args: ServeArgs, config: Config) -> AppResult<()> {
    tracing::info!(
        app = %config.app_name,
        environment = %config.environment,
        "Starting server..."
    );

    // Both stores are required; a failed connection aborts startup
    let database = Database::connect(&config).await?;
    let cache = Cache::connect(&config).await?;

    let services = Services::connect(&config, &database, cache.clone()).await?;

    let app_state = AppState::from_container(
        &services,
        Arc::new(cache.clone()),
        Arc::new(Probes::new(database, cache)),
        HttpSettings::from_config(&config),
    );

    let app = create_router(app_state);

    let host = args.host.unwrap_or_else(|| config.server_host.clone());
    let port = args.port.unwrap_or(config.server_port);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind to {}: {}", addr, e)))?;

    tracing::info!("Server running on http://{}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
