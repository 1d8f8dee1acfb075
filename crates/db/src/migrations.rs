use sqlx::migrate::{MigrateError, Migrator};

use crate::DbPool;

pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

pub async fn run_pending(pool: &DbPool) -> Result<(), MigrateError> {
    MIGRATOR.run(pool).await
}

/// Tables the analytics extracts depend on.
pub const ANALYTICS_TABLES: &[&str] =
    &["customers", "products", "inventory", "transactions", "transaction_items"];

/// Names from [`ANALYTICS_TABLES`] that do not exist yet; empty when the
/// schema is fully migrated.
pub async fn missing_tables(pool: &DbPool) -> Result<Vec<String>, sqlx::Error> {
    let existing: Vec<String> =
        sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type = 'table'")
            .fetch_all(pool)
            .await?;
    Ok(ANALYTICS_TABLES
        .iter()
        .filter(|table| !existing.iter().any(|name| name == *table))
        .map(|table| table.to_string())
        .collect())
}
