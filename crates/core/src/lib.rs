//! Ambient infrastructure shared by every crate in the workspace: structured
//! errors, layered configuration, the database pool, and the entity id
//! newtypes every other crate builds on.

pub mod config;
pub mod database;
pub mod error;
pub mod types;

pub use config::Config;
pub use database::DatabasePool;
pub use error::{Error, ErrorCode, ErrorContext, Result};
pub use types::*;

#[cfg(test)]
mod tests;

// Re-export commonly used types from dependencies
pub use chrono::{DateTime, Utc};
pub use uuid::Uuid;
