use crate::config::{DatabaseConfig, Dialect, SchemaMode};
use crate::database::schema;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{PgPool, SqlitePool};
use std::str::FromStr;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;
use tracing::{error, info, warn};

/// Errors that can occur when working with the database
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Failed to create database pool: {0}")]
    PoolCreation(sqlx::Error),

    #[error("Schema management failed: {0}")]
    Schema(sqlx::Error),

    #[error("Session provider is not initialized")]
    NotInitialized,

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Connection pool for one of the supported dialects
#[derive(Clone, Debug)]
pub enum DbPool {
    Postgres(PgPool),
    Sqlite(SqlitePool),
}

impl DbPool {
    pub fn dialect(&self) -> Dialect {
        match self {
            DbPool::Postgres(_) => Dialect::Postgres,
            DbPool::Sqlite(_) => Dialect::Sqlite,
        }
    }

    /// Close every connection; clones of this pool are closed too
    pub async fn close(&self) {
        match self {
            DbPool::Postgres(pool) => pool.close().await,
            DbPool::Sqlite(pool) => pool.close().await,
        }
    }
}

struct ProviderState {
    pool: DbPool,
    schema_mode: SchemaMode,
}

/// Owns the process-wide connection pool.
///
/// Construct one per process, share it behind an `Arc`, and hand it to the
/// repositories. `init` is first-call-wins; `shutdown` releases the pool and
/// allows a later `init`.
#[derive(Default)]
pub struct SessionProvider {
    state: RwLock<Option<ProviderState>>,
}

impl SessionProvider {
    /// Create an uninitialized provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a provider and initialize it in one step
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let provider = Self::new();
        provider.init(config).await?;
        Ok(provider)
    }

    /// Build the pool and apply the schema mode.
    ///
    /// Calling this on an initialized provider logs a warning and does nothing.
    pub async fn init(&self, config: &DatabaseConfig) -> Result<(), DatabaseError> {
        if self.is_initialized() {
            warn!("Session provider already initialized, ignoring init");
            return Ok(());
        }

        info!(
            "Initializing session provider (dialect: {}, schema mode: {})",
            config.dialect, config.schema_mode
        );

        let pool = create_pool(config).await.map_err(|e| {
            error!("Session provider initialization failed: {}", e);
            e
        })?;

        let applied = schema::apply_on_init(&pool, config.schema_mode, config.unique_email).await;
        if let Err(e) = applied {
            error!("Session provider initialization failed: {}", e);
            pool.close().await;
            return Err(DatabaseError::Schema(e));
        }

        let discarded = {
            let mut state = self.write_state();
            if state.is_some() {
                Some(pool)
            } else {
                *state = Some(ProviderState {
                    pool,
                    schema_mode: config.schema_mode,
                });
                None
            }
        };

        if let Some(pool) = discarded {
            warn!("Session provider was initialized concurrently, discarding new pool");
            pool.close().await;
            return Ok(());
        }

        info!("Session provider initialized");
        Ok(())
    }

    /// Get a handle to the shared pool
    pub fn pool(&self) -> Result<DbPool, DatabaseError> {
        self.read_state()
            .as_ref()
            .map(|state| state.pool.clone())
            .ok_or(DatabaseError::NotInitialized)
    }

    pub fn is_initialized(&self) -> bool {
        self.read_state().is_some()
    }

    /// Release the pool and return to the uninitialized state.
    ///
    /// A no-op when nothing is initialized.
    pub async fn shutdown(&self) {
        let Some(state) = self.write_state().take() else {
            return;
        };

        if let Err(e) = schema::apply_on_shutdown(&state.pool, state.schema_mode).await {
            warn!("Failed to drop schema on shutdown: {}", e);
        }

        state.pool.close().await;
        info!("Session provider shut down");
    }

    fn read_state(&self) -> RwLockReadGuard<'_, Option<ProviderState>> {
        self.state
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, Option<ProviderState>> {
        self.state
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Create a connection pool for the configured dialect
///
/// # Arguments
/// * `config` - Database configuration
///
/// # Returns
/// * `Ok(DbPool)` - Successfully created and tested connection pool
/// * `Err(DatabaseError)` - Error creating the pool
pub async fn create_pool(config: &DatabaseConfig) -> Result<DbPool, DatabaseError> {
    config.validate().map_err(DatabaseError::Config)?;

    let pool = match config.dialect {
        Dialect::Postgres => DbPool::Postgres(create_pg_pool(config).await?),
        Dialect::Sqlite => DbPool::Sqlite(create_sqlite_pool(config).await?),
    };

    Ok(pool)
}

async fn create_pg_pool(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
    let mut options = PgConnectOptions::from_str(&config.url)
        .map_err(DatabaseError::PoolCreation)?;
    if let Some(username) = &config.username {
        options = options.username(username);
    }
    if let Some(password) = &config.password {
        options = options.password(password);
    }

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout())
        .connect_with(options)
        .await
        .map_err(DatabaseError::PoolCreation)?;

    // Test the connection
    sqlx::query("SELECT 1")
        .execute(&pool)
        .await
        .map_err(DatabaseError::PoolCreation)?;

    Ok(pool)
}

async fn create_sqlite_pool(config: &DatabaseConfig) -> Result<SqlitePool, DatabaseError> {
    if config.username.is_some() || config.password.is_some() {
        warn!("SQLite does not use credentials, ignoring DATABASE_USERNAME/DATABASE_PASSWORD");
    }

    let options = SqliteConnectOptions::from_str(&config.url)
        .map_err(DatabaseError::PoolCreation)?
        .create_if_missing(true);

    // Every in-memory connection is its own database, so keep exactly one alive.
    let pool_options = if config.is_in_memory() {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(config.max_connections)
    };

    let pool = pool_options
        .acquire_timeout(config.acquire_timeout())
        .connect_with(options)
        .await
        .map_err(DatabaseError::PoolCreation)?;

    // Test the connection
    sqlx::query("SELECT 1")
        .execute(&pool)
        .await
        .map_err(DatabaseError::PoolCreation)?;

    Ok(pool)
}
