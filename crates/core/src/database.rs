//! Database connection pool management.
//!
//! The control plane uses a single relational schema shared across all
//! organizations (see SPEC_FULL.md §3.1) — there is no per-tenant schema
//! isolation, so unlike a schema-per-tenant deployment this is a thin
//! wrapper around one `sqlx::PgPool`.

use crate::{config::DatabaseConfig, error::Result};
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::info;

#[derive(Clone)]
pub struct DatabasePool {
    pool: PgPool,
}

impl DatabasePool {
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        info!("initializing database pool");

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect(&config.url)
            .await?;

        info!("database pool initialized");

        Ok(Self { pool })
    }

    pub fn get(&self) -> &PgPool {
        &self.pool
    }

    pub async fn check_health(&self) -> Result<()> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }
}
