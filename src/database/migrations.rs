//! Database Migrations
//!
//! Idempotent schema bootstrap run once at startup.

use anyhow::{Context, Result};
use deadpool_postgres::Pool;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS users (
        id VARCHAR(36) PRIMARY KEY,
        username TEXT NOT NULL UNIQUE,
        password TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS news (
        id VARCHAR(36) PRIMARY KEY,
        title TEXT NOT NULL,
        body TEXT NOT NULL,
        author VARCHAR(36) NOT NULL REFERENCES users(id),
        created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT CURRENT_TIMESTAMP
    );
";

/// Create the users and news tables if they do not exist
pub async fn run_migrations(pool: &Pool) -> Result<()> {
    if needs_migration(pool).await? {
        tracing::info!("🔄 Creating database schema...");
    }

    let client = pool.get().await.context("Failed to get connection for migrations")?;
    client
        .batch_execute(SCHEMA)
        .await
        .context("Unable to create tables")?;

    tracing::info!("Database schema is up to date");
    Ok(())
}

/// Check if database needs migrations
pub async fn needs_migration(pool: &Pool) -> Result<bool> {
    let client = pool.get().await.context("Failed to get connection for migration check")?;

    let result = client
        .query_one(
            "SELECT COUNT(*) FROM information_schema.tables WHERE table_name IN ('users', 'news')",
            &[],
        )
        .await?;

    let count: i64 = result.get(0);
    Ok(count < 2)
}
