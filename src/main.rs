use std::sync::Arc;

use fleet_safety_api::api;
use fleet_safety_api::config::{Config, LogFormat};
use fleet_safety_api::dates::LocalCalendar;
use fleet_safety_api::db::{pool, schema};
use fleet_safety_api::error::AppError;
use fleet_safety_api::state::AppState;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = Config::from_env()?;

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .with_target(false);
    match config.log_format {
        LogFormat::Json => subscriber.json().init(),
        LogFormat::Compact => subscriber.compact().init(),
    }

    let pool = pool::connect(&config.database).await?;
    schema::ensure_schema(&pool).await?;
    tracing::info!(
        database = %config.database.url,
        timezone = %config.timezone,
        "database ready"
    );

    let state = AppState::new(
        pool.clone(),
        LocalCalendar::new(config.timezone),
        config.request_timeout,
    );
    let app = api::rest::router(Arc::new(state));

    let bind_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|err| AppError::Internal(format!("failed to bind {bind_addr}: {err}")))?;

    tracing::info!(http_port = config.http_port, "http server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::Internal(format!("server error: {err}")))?;

    pool.close().await;
    tracing::info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
