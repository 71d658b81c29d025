pub mod filters;
mod models;

pub use models::*;

use anyhow::{Context, Result};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous},
    SqlitePool,
};
use std::str::FromStr;
use tracing::info;

use crate::config::Config;

pub type DbPool = SqlitePool;

/// Execute a SQL migration file, properly handling comments
async fn execute_sql(pool: &SqlitePool, sql: &str) -> Result<()> {
    // Strip SQL comment lines (lines starting with --) before splitting so
    // a `;` inside a comment never ends a statement
    let cleaned: String = sql
        .lines()
        .filter(|line| !line.trim().starts_with("--"))
        .collect::<Vec<_>>()
        .join("\n");

    for statement in cleaned.split(';') {
        let trimmed = statement.trim();
        if !trimmed.is_empty() {
            sqlx::query(trimmed).execute(pool).await?;
        }
    }
    Ok(())
}

/// Open the configured database and bring its schema up to date
pub async fn init(config: &Config) -> Result<DbPool> {
    let url = config.database_url();
    if !url.contains(":memory:") {
        std::fs::create_dir_all(&config.server.data_dir).with_context(|| {
            format!(
                "Failed to create data directory {}",
                config.server.data_dir.display()
            )
        })?;
    }

    info!("Initializing database at {}", url);

    let options = SqliteConnectOptions::from_str(&url)
        .with_context(|| format!("Invalid database URL: {}", url))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;

    info!("Database initialized successfully");
    Ok(pool)
}

pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    info!("Running database migrations...");

    // Migration 001: Initial schema
    execute_sql(pool, include_str!("../../migrations/001_initial.sql")).await?;

    Ok(())
}

/// Single-connection in-memory database with the schema applied
#[cfg(test)]
pub async fn test_pool() -> DbPool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .unwrap();
    run_migrations(&pool).await.unwrap();
    pool
}
