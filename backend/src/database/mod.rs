//! Module for database connection setup and common utilities.
//!
//! This module is responsible for initializing the database connection pool
//! and applying the embedded migrations.

use crate::config::Config;
use anyhow::{Context, Result};
use sqlx::{SqlitePool, sqlite::SqliteConnectOptions, sqlite::SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;

pub mod models;

#[derive(Clone)]
pub struct Database {
    pub pool: SqlitePool,
}

impl Database {
    /// Initializes the database connection pool and runs migrations.
    pub async fn new(config: &Config) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&config.database_url)
            .context("DATABASE_URL is not a valid SQLite URL")?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
            .connect_with(options)
            .await?;

        let database = Database { pool };
        database.migrate().await?;
        Ok(database)
    }

    /// Applies any pending migrations from `migrations/`.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Closes the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("Database connection pool closed.");
    }
}

/// In-memory database with the schema applied, for tests.
#[cfg(test)]
pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    pool
}
