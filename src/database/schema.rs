//! DDL for the `users` table, per dialect and schema mode.

use crate::config::{Dialect, SchemaMode};
use crate::database::DbPool;
use tracing::info;

const DROP_USERS: &str = "DROP TABLE IF EXISTS users";

/// `CREATE TABLE IF NOT EXISTS` statement for the dialect
pub fn create_users_sql(dialect: Dialect, unique_email: bool) -> String {
    let id_column = match dialect {
        Dialect::Postgres => "id BIGSERIAL PRIMARY KEY",
        Dialect::Sqlite => "id INTEGER PRIMARY KEY AUTOINCREMENT",
    };
    let email_column = if unique_email {
        "email TEXT NOT NULL UNIQUE"
    } else {
        "email TEXT NOT NULL"
    };

    format!(
        "CREATE TABLE IF NOT EXISTS users (\
         {}, \
         name TEXT NOT NULL, \
         {}, \
         age INTEGER NOT NULL, \
         created_at TIMESTAMP NOT NULL)",
        id_column, email_column
    )
}

async fn execute(pool: &DbPool, sql: &str) -> sqlx::Result<()> {
    match pool {
        DbPool::Postgres(pool) => sqlx::query(sql).execute(pool).await.map(|_| ()),
        DbPool::Sqlite(pool) => sqlx::query(sql).execute(pool).await.map(|_| ()),
    }
}

/// Apply the init half of a schema mode
pub async fn apply_on_init(
    pool: &DbPool,
    mode: SchemaMode,
    unique_email: bool,
) -> sqlx::Result<()> {
    let create = create_users_sql(pool.dialect(), unique_email);
    match mode {
        SchemaMode::None => {}
        SchemaMode::Update => {
            execute(pool, &create).await?;
            info!("Ensured users table exists");
        }
        SchemaMode::Create | SchemaMode::CreateDrop => {
            execute(pool, DROP_USERS).await?;
            execute(pool, &create).await?;
            info!("Recreated users table");
        }
    }
    Ok(())
}

/// Apply the shutdown half of a schema mode
pub async fn apply_on_shutdown(pool: &DbPool, mode: SchemaMode) -> sqlx::Result<()> {
    if mode == SchemaMode::CreateDrop {
        execute(pool, DROP_USERS).await?;
        info!("Dropped users table");
    }
    Ok(())
}
