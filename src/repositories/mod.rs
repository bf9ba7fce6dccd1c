pub mod user_repository;

// Re-export for convenient access
pub use user_repository::{UserRepository, UserStore};

#[cfg(test)]
pub use user_repository::MockUserStore;
