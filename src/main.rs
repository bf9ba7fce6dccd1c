//! User Registry
//!
//! Console application for creating, reading, updating and deleting user
//! records. Connection settings come from the environment (or a `.env` file).

use std::sync::Arc;
use tokio::io::BufReader;
use tracing::{error, info};
use user_registry::database::SessionProvider;
use user_registry::{AppConfig, AppError, AppResult, AppState};

#[tokio::main(flavor = "current_thread")]
async fn main() -> AppResult<()> {
    // Load environment variables first
    dotenv::dotenv().ok();

    // Load configuration
    let config = AppConfig::from_env().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        AppError::Config(e)
    })?;

    // Logs go to stderr so they do not interleave with the menu
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("user_registry={},sqlx=warn", config.log_level).into()
            }),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("User registry starting");
    info!("Database dialect: {}", config.database.dialect);
    info!("Schema mode: {}", config.database.schema_mode);

    let provider = SessionProvider::connect(&config.database).await.map_err(|e| {
        error!("Failed to initialize database session provider: {}", e);
        AppError::Initialization(e)
    })?;

    let state = AppState::new(Arc::new(provider));
    let (provider, mut console) =
        state.into_console(BufReader::new(tokio::io::stdin()), tokio::io::stdout());

    let outcome = console.run().await;
    if let Err(e) = &outcome {
        error!("Console loop terminated: {}", e);
    }

    provider.shutdown().await;
    info!("User registry shutdown complete");
    outcome
}
