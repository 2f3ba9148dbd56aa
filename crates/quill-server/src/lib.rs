//! Quill Server
//!
//! HTTP surface for the blog: login guard, article and comment handlers,
//! session issuing. Pages are rendered as JSON envelopes naming their
//! template (see [`render`]).

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod guard;
pub mod handlers;
pub mod render;
pub mod session;

use config::ServerConfig;
use handlers::{create_router, AppState};
use quill_store::{SqliteStore, StoreError};
use session::SessionManager;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Server error
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Store could not be opened
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
/// `RUST_LOG` wins over `default_level`. Safe to call more than once.
pub fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Open the store and wire the application state from configuration
pub fn build_state(config: &ServerConfig) -> Result<AppState, ServerError> {
    let store = SqliteStore::new(&config.database_path)?;
    let sessions = SessionManager::new(&config.jwt_secret, config.token_expiry_secs)
        .with_users(&config.users);

    Ok(AppState::new(store, sessions, config.login_url.clone()))
}

/// Start the HTTP server
///
/// Initializes tracing, opens the store, and serves until Ctrl-C.
pub async fn start_server(config: ServerConfig) -> Result<(), ServerError> {
    init_tracing(&config.log_level);

    info!("Starting Quill server");
    info!("Bind address: {}", config.bind_addr());
    info!("Database: {}", config.database_path);
    info!("Token expiry: {} seconds", config.token_expiry_secs);
    info!("Configured users: {}", config.users.len());

    let state = build_state(&config)?;
    let app = create_router(state);

    let listener = TcpListener::bind(&config.bind_addr()).await?;
    info!("Quill listening on {}", config.bind_addr());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ServerError::Server(e.to_string()))?;

    info!("Quill server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // no signal handler available; run until the process is killed
        std::future::pending::<()>().await;
    }
}
