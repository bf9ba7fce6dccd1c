//! Domain models for the user registry.
//!
//! The registry manages a single database-backed entity, [`User`].

pub mod user;

pub use user::{NewUser, User};
