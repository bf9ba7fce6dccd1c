#![allow(dead_code)]

use std::sync::Arc;
use user_registry::config::{DatabaseConfig, Dialect, SchemaMode};
use user_registry::database::{DbPool, SessionProvider};
use user_registry::models::{NewUser, User};
use user_registry::repositories::{UserRepository, UserStore};
use user_registry::services::UserService;

/// Test database wired through the real provider and repository
pub struct TestDatabase {
    pub provider: Arc<SessionProvider>,
    pub user_repo: Arc<UserRepository>,
}

impl TestDatabase {
    /// Fresh private in-memory SQLite database with the users table created
    pub async fn new() -> Self {
        Self::from_config(&DatabaseConfig::in_memory()).await
    }

    /// In-memory database whose email column has no unique constraint
    pub async fn without_unique_email() -> Self {
        let config = DatabaseConfig {
            unique_email: false,
            ..DatabaseConfig::in_memory()
        };
        Self::from_config(&config).await
    }

    pub async fn from_config(config: &DatabaseConfig) -> Self {
        let provider = SessionProvider::connect(config)
            .await
            .expect("Failed to initialize test session provider");
        Self::from_provider(Arc::new(provider))
    }

    pub fn from_provider(provider: Arc<SessionProvider>) -> Self {
        Self {
            user_repo: Arc::new(UserRepository::new(provider.clone())),
            provider,
        }
    }

    /// Postgres database from `TEST_DATABASE_URL`, or `None` when unset
    pub async fn postgres() -> Option<Self> {
        let url = std::env::var("TEST_DATABASE_URL").ok()?;
        let config = DatabaseConfig {
            url,
            dialect: Dialect::Postgres,
            schema_mode: SchemaMode::CreateDrop,
            max_connections: 2,
            acquire_timeout_secs: 10,
            ..DatabaseConfig::default()
        };
        Some(Self::from_config(&config).await)
    }

    pub fn service(&self) -> UserService {
        UserService::new(self.user_repo.clone())
    }

    /// Number of rows in the users table, read outside the repository
    pub async fn count_users(&self) -> i64 {
        let sql = "SELECT COUNT(*) FROM users";
        let pool = self.provider.pool().expect("Provider not initialized");
        let count = match pool {
            DbPool::Postgres(pool) => sqlx::query_scalar::<_, i64>(sql).fetch_one(&pool).await,
            DbPool::Sqlite(pool) => sqlx::query_scalar::<_, i64>(sql).fetch_one(&pool).await,
        };
        count.expect("Failed to count users")
    }

    /// Remove all rows
    pub async fn cleanup(&self) {
        let sql = "DELETE FROM users";
        let pool = self.provider.pool().expect("Provider not initialized");
        let result = match pool {
            DbPool::Postgres(pool) => sqlx::query(sql).execute(&pool).await.map(|_| ()),
            DbPool::Sqlite(pool) => sqlx::query(sql).execute(&pool).await.map(|_| ()),
        };
        result.expect("Failed to cleanup test data");
    }

    pub async fn shutdown(&self) {
        self.provider.shutdown().await;
    }
}

/// Helper function to create a test user through the repository
pub async fn create_test_user(db: &TestDatabase, name: &str, email: &str, age: i32) -> User {
    db.user_repo
        .create(&NewUser::new(name, email, age))
        .await
        .expect("Failed to create test user")
}

/// Assert that two users are equal field by field
pub fn assert_users_equal(user1: &User, user2: &User) {
    assert_eq!(user1.id, user2.id);
    assert_eq!(user1.name, user2.name);
    assert_eq!(user1.email, user2.email);
    assert_eq!(user1.age, user2.age);
    assert_eq!(user1.created_at, user2.created_at);
}
