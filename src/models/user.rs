use chrono::{NaiveDateTime, SubsecRound};
use sqlx::FromRow;
use std::fmt;

/// User record as stored in the `users` table
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub age: i32,
    pub created_at: NaiveDateTime,
}

/// A user that has not been persisted yet and so carries no identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub age: i32,
    pub created_at: NaiveDateTime,
}

impl NewUser {
    /// Create a new user stamped with the current instant.
    ///
    /// The timestamp is truncated to microseconds, the finest precision
    /// PostgreSQL keeps for `TIMESTAMP` columns.
    pub fn new(name: impl Into<String>, email: impl Into<String>, age: i32) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            age,
            created_at: chrono::Utc::now().naive_utc().trunc_subsecs(6),
        }
    }
}

impl User {
    /// Whether the identifier was assigned by the store
    pub fn has_identifier(&self) -> bool {
        self.id > 0
    }

    /// Overwrite the mutable fields, leaving `id` and `created_at` alone
    pub fn apply_changes(&mut self, name: &str, email: &str, age: i32) {
        self.name = name.to_string();
        self.email = email.to_string();
        self.age = age;
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "User{{id={}, name='{}', email='{}', age={}, createdAt={}}}",
            self.id,
            self.name,
            self.email,
            self.age,
            self.created_at.format("%Y-%m-%d %H:%M:%S")
        )
    }
}
