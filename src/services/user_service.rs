use crate::error::{option_to_result, AppError, AppResult};
use crate::models::{NewUser, User};
use crate::repositories::UserStore;
use std::sync::Arc;
use tracing::info;

/// Service for managing users
pub struct UserService {
    store: Arc<dyn UserStore>,
}

fn require_field(value: &str, field: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    Ok(())
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    /// Create a user stamped with the current time
    pub async fn create_user(&self, name: &str, email: &str, age: i32) -> AppResult<User> {
        require_field(name, "name")?;
        require_field(email, "email")?;

        let user = self.store.create(&NewUser::new(name, email, age)).await?;

        info!("Created user {}", user.id);
        Ok(user)
    }

    /// Fetch a user, failing with `NotFound` when there is no match
    pub async fn get_user_by_id(&self, id: Option<i64>) -> AppResult<User> {
        let id = id.ok_or_else(|| AppError::Validation("id is required".to_string()))?;

        let found = self.store.find_by_id(Some(id)).await?;
        let user = option_to_result(found, &format!("user {}", id))?;

        info!("Found user {}", user.id);
        Ok(user)
    }

    /// Load the current user, apply the new field values and store the result
    pub async fn update_user(
        &self,
        id: Option<i64>,
        name: &str,
        email: &str,
        age: i32,
    ) -> AppResult<User> {
        let mut user = self.get_user_by_id(id).await?;
        require_field(name, "name")?;
        require_field(email, "email")?;

        user.apply_changes(name, email, age);
        let updated = self.store.update(&user).await?;

        info!("Updated user {}", updated.id);
        Ok(updated)
    }

    /// Delete a user by id and return the removed record
    pub async fn delete_user_by_id(&self, id: Option<i64>) -> AppResult<User> {
        let user = self.get_user_by_id(id).await?;
        self.store.delete(&user).await?;

        info!("Deleted user {}", user.id);
        Ok(user)
    }

    pub async fn get_all_users(&self) -> AppResult<Vec<User>> {
        let users = self.store.find_all().await?;
        info!("Fetched {} users", users.len());
        Ok(users)
    }
}
