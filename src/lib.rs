//! User Registry Library
//!
//! This module exposes the registry components for use by the binary and tests.

pub mod config;
pub mod console;
pub mod database;
pub mod error;
pub mod models;
pub mod repositories;
pub mod services;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{AppError, AppResult};

use console::ConsoleController;
use database::SessionProvider;
use repositories::UserRepository;
use services::UserService;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncWrite};

/// Application state wiring the session provider to the service layer
pub struct AppState {
    pub provider: Arc<SessionProvider>,
    pub user_service: UserService,
}

impl AppState {
    /// Create a new AppState over an initialized provider
    pub fn new(provider: Arc<SessionProvider>) -> Self {
        let user_repo = Arc::new(UserRepository::new(provider.clone()));

        Self {
            provider,
            user_service: UserService::new(user_repo),
        }
    }

    /// Hand the service to a console controller over the given streams
    pub fn into_console<R, W>(
        self,
        input: R,
        output: W,
    ) -> (Arc<SessionProvider>, ConsoleController<R, W>)
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let console = ConsoleController::new(self.user_service, input, output);
        (self.provider, console)
    }
}
