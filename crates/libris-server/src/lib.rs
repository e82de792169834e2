//! Libris Server
//!
//! JSON-over-HTTP front end for the library record keeper: catalog, readers,
//! and the borrow/return workflow, with staff authentication by bearer token.

#![warn(missing_docs)]

pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod session;

use config::ServerConfig;
use handlers::{create_router, AppState};
use libris_gatekeeper::Gatekeeper;
use libris_store::{SqliteStore, StoreError};
use session::SessionManager;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Server error
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Database could not be opened
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Server binding error
    #[error("Failed to bind server: {0}")]
    Bind(#[from] std::io::Error),

    /// Server error
    #[error("Server error: {0}")]
    Server(String),
}

/// Install the global tracing subscriber
///
/// `RUST_LOG` wins over `default_filter` when set. Calling this twice is
/// harmless; the second install is ignored.
pub fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Open the store and assemble handler state from configuration
pub fn build_state(config: &ServerConfig) -> Result<AppState, ServerError> {
    let store = SqliteStore::new(&config.database_path, config.lending.policy())?
        .with_busy_timeout(config.busy_timeout())?;

    if config.staff.is_empty() {
        warn!("No staff accounts configured; protected endpoints are unreachable");
    }

    Ok(AppState::new(
        store,
        Gatekeeper::new(config.validation.clone()),
        SessionManager::new(&config.jwt_secret, config.token_expiry_secs),
        config.staff.clone(),
    ))
}

/// Start the HTTP server
///
/// Opens the database, builds the router, and serves until Ctrl-C.
pub async fn start_server(config: ServerConfig) -> Result<(), ServerError> {
    init_tracing(&config.log_filter);

    info!("Starting Libris server");
    info!("Bind address: {}", config.bind_addr());
    info!("Database: {}", config.database_path);
    info!("Loan limit per reader: {}", config.lending.max_active_loans);
    info!("Staff accounts: {}", config.staff.len());

    let state = build_state(&config)?;
    let app = create_router(state);

    let listener = TcpListener::bind(&config.bind_addr()).await?;
    info!("Libris listening on {}", config.bind_addr());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ServerError::Server(e.to_string()))?;

    info!("Libris server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_state_from_test_config() {
        let config = ServerConfig::default_test_config();
        let state = build_state(&config).unwrap();
        assert_eq!(state.staff.len(), 1);
        assert_eq!(state.store.lock().unwrap().policy().max_active_loans, 3);
    }

    #[test]
    fn test_build_state_honours_loan_limit() {
        let mut config = ServerConfig::default_test_config();
        config.lending.max_active_loans = 7;

        let state = build_state(&config).unwrap();
        assert_eq!(state.store.lock().unwrap().policy().max_active_loans, 7);
    }
}
