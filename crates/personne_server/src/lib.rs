//! HTTP adapters for the personne record service.
//!
//! # Responsibility
//! - Wire configuration, logging and the store into one axum application.
//! - Serve the REST routes and the GraphQL endpoint side by side.

pub mod config;
pub mod error;
pub mod graphql;
pub mod rest;
pub mod state;

use crate::config::{ConfigError, ServerConfig};
use crate::state::AppState;
use axum::routing::post;
use axum::Router;
use log::{error, info};
use personne_core::db::{open_db, open_db_in_memory, DbError};
use thiserror::Error;

/// Startup and serving failures.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("logging setup failed: {0}")]
    Logging(String),
    #[error("database setup failed: {0}")]
    Database(#[from] DbError),
    #[error("http server failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Builds the full application router.
pub fn app(state: AppState) -> Router {
    rest::routes()
        .route("/graphql", post(graphql::graphql_handler))
        .with_state(state)
}

/// Opens the configured store and wraps it into request state.
pub fn build_state(config: &ServerConfig) -> Result<AppState, ServerError> {
    let conn = match config.database_file() {
        Some(path) => open_db(path)?,
        None => open_db_in_memory()?,
    };
    Ok(AppState::new(conn, config.admin.reset_token.clone()))
}

/// Serves until ctrl-c.
pub async fn serve(config: ServerConfig) -> Result<(), ServerError> {
    let addr = config.bind_addr()?;
    let state = build_state(&config)?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(
        "event=server_start module=server status=ok addr={} reset_enabled={}",
        listener.local_addr()?,
        config.admin.reset_token.is_some()
    );

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("event=server_stop module=server status=ok");
    Ok(())
}

async fn shutdown_signal() {
    wait_for_shutdown(tokio::signal::ctrl_c()).await;
}

/// Resolves once `signal` fires.
///
/// When the signal handler cannot be installed the server keeps running
/// instead of shutting down straight after start.
async fn wait_for_shutdown<F>(signal: F)
where
    F: std::future::Future<Output = std::io::Result<()>>,
{
    if let Err(err) = signal.await {
        error!(
            "event=server_signal module=server status=error error_code=signal_unavailable error={err}"
        );
        std::future::pending::<()>().await;
    }
}
