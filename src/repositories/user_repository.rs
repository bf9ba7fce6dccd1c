use crate::database::{DbPool, SessionProvider};
use crate::error::RepositoryError;
use crate::models::{NewUser, User};
use async_trait::async_trait;
use sqlx::{Database, Result as SqlxResult, Transaction};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

const INSERT_USER: &str = r#"
    INSERT INTO users (name, email, age, created_at)
    VALUES ($1, $2, $3, $4)
    RETURNING id, name, email, age, created_at
"#;

const SELECT_USER_BY_ID: &str = r#"
    SELECT id, name, email, age, created_at
    FROM users
    WHERE id = $1
"#;

const SELECT_ALL_USERS: &str = r#"
    SELECT id, name, email, age, created_at
    FROM users
    ORDER BY id
"#;

const UPDATE_USER: &str = r#"
    UPDATE users
    SET name = $2, email = $3, age = $4
    WHERE id = $1
    RETURNING id, name, email, age, created_at
"#;

const DELETE_USER: &str = r#"
    DELETE FROM users
    WHERE id = $1
"#;

/// Run the same body against whichever pool variant is live.
///
/// The body is expanded once per arm, so it type-checks against each
/// dialect's concrete pool without generic bounds.
macro_rules! with_pool {
    ($pool:expr, |$p:ident| $body:expr) => {
        match $pool {
            DbPool::Postgres($p) => $body,
            DbPool::Sqlite($p) => $body,
        }
    };
}

/// Data access for user records.
///
/// Writes run in their own transaction; reads use a plain pooled connection.
/// Returned users are detached copies.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new user and return it with its store-assigned id
    async fn create(&self, user: &NewUser) -> Result<User, RepositoryError>;

    /// Look up a user; `None` for an absent id or no match
    async fn find_by_id(&self, id: Option<i64>) -> Result<Option<User>, RepositoryError>;

    /// All users in identifier order
    async fn find_all(&self) -> Result<Vec<User>, RepositoryError>;

    /// Overwrite name, email and age of an existing user
    async fn update(&self, user: &User) -> Result<User, RepositoryError>;

    /// Remove an existing user
    async fn delete(&self, user: &User) -> Result<(), RepositoryError>;
}

/// Repository for user data access
pub struct UserRepository {
    provider: Arc<SessionProvider>,
}

impl UserRepository {
    /// Create a new UserRepository
    pub fn new(provider: Arc<SessionProvider>) -> Self {
        Self { provider }
    }

    fn pool(&self) -> Result<DbPool, RepositoryError> {
        self.provider.pool().map_err(|e| {
            error!("Cannot open session: {}", e);
            RepositoryError::Session(e)
        })
    }
}

fn require_identifier(user: &User, operation: &str) -> Result<(), RepositoryError> {
    if user.has_identifier() {
        Ok(())
    } else {
        Err(RepositoryError::InvalidInput(format!(
            "cannot {} a user without a store-assigned id",
            operation
        )))
    }
}

/// Commit on success, roll back on failure
async fn finish<DB: Database, T>(tx: Transaction<'_, DB>, outcome: SqlxResult<T>) -> SqlxResult<T> {
    match outcome {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback_err) = tx.rollback().await {
                warn!("Rollback failed: {}", rollback_err);
            }
            Err(e)
        }
    }
}

async fn insert_user(pool: &DbPool, user: &NewUser) -> SqlxResult<User> {
    with_pool!(pool, |pool| {
        let mut tx = pool.begin().await?;
        let outcome = sqlx::query_as::<_, User>(INSERT_USER)
            .bind(&user.name)
            .bind(&user.email)
            .bind(user.age)
            .bind(user.created_at)
            .fetch_one(&mut *tx)
            .await;
        finish(tx, outcome).await
    })
}

async fn select_user(pool: &DbPool, id: i64) -> SqlxResult<Option<User>> {
    with_pool!(pool, |pool| {
        let mut conn = pool.acquire().await?;
        sqlx::query_as::<_, User>(SELECT_USER_BY_ID)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
    })
}

async fn select_all_users(pool: &DbPool) -> SqlxResult<Vec<User>> {
    with_pool!(pool, |pool| {
        let mut conn = pool.acquire().await?;
        sqlx::query_as::<_, User>(SELECT_ALL_USERS)
            .fetch_all(&mut *conn)
            .await
    })
}

async fn update_user(pool: &DbPool, user: &User) -> SqlxResult<User> {
    with_pool!(pool, |pool| {
        let mut tx = pool.begin().await?;
        let outcome = sqlx::query_as::<_, User>(UPDATE_USER)
            .bind(user.id)
            .bind(&user.name)
            .bind(&user.email)
            .bind(user.age)
            .fetch_optional(&mut *tx)
            .await
            .and_then(|row| row.ok_or(sqlx::Error::RowNotFound));
        finish(tx, outcome).await
    })
}

async fn delete_user(pool: &DbPool, id: i64) -> SqlxResult<()> {
    with_pool!(pool, |pool| {
        let mut tx = pool.begin().await?;
        let outcome = sqlx::query(DELETE_USER)
            .bind(id)
            .execute(&mut *tx)
            .await
            .and_then(|done| {
                if done.rows_affected() > 0 {
                    Ok(())
                } else {
                    Err(sqlx::Error::RowNotFound)
                }
            });
        finish(tx, outcome).await
    })
}

#[async_trait]
impl UserStore for UserRepository {
    async fn create(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let pool = self.pool()?;
        match insert_user(&pool, user).await {
            Ok(created) => {
                info!("User saved: {}", created);
                Ok(created)
            }
            Err(e) => {
                error!("Failed to save user (email: {}): {}", user.email, e);
                Err(e.into())
            }
        }
    }

    async fn find_by_id(&self, id: Option<i64>) -> Result<Option<User>, RepositoryError> {
        let Some(id) = id else {
            debug!("find_by_id called without an id");
            return Ok(None);
        };

        let pool = self.pool()?;
        select_user(&pool, id).await.map_err(|e| {
            error!("Failed to find user by id {}: {}", id, e);
            e.into()
        })
    }

    async fn find_all(&self) -> Result<Vec<User>, RepositoryError> {
        let pool = self.pool()?;
        select_all_users(&pool).await.map_err(|e| {
            error!("Failed to list users: {}", e);
            e.into()
        })
    }

    async fn update(&self, user: &User) -> Result<User, RepositoryError> {
        require_identifier(user, "update")?;

        let pool = self.pool()?;
        match update_user(&pool, user).await {
            Ok(updated) => {
                info!("User updated: {}", updated);
                Ok(updated)
            }
            Err(sqlx::Error::RowNotFound) => {
                error!("Failed to update user {}: no such row", user.id);
                Err(RepositoryError::NotFound(format!("user {}", user.id)))
            }
            Err(e) => {
                error!("Failed to update user {}: {}", user.id, e);
                Err(e.into())
            }
        }
    }

    async fn delete(&self, user: &User) -> Result<(), RepositoryError> {
        require_identifier(user, "delete")?;

        let pool = self.pool()?;
        match delete_user(&pool, user.id).await {
            Ok(()) => {
                info!("User deleted: {}", user);
                Ok(())
            }
            Err(sqlx::Error::RowNotFound) => {
                error!("Failed to delete user {}: no such row", user.id);
                Err(RepositoryError::NotFound(format!("user {}", user.id)))
            }
            Err(e) => {
                error!("Failed to delete user {}: {}", user.id, e);
                Err(e.into())
            }
        }
    }
}
