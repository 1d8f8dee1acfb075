//! SQLite pool construction for the analytics store.

use std::time::Duration;

use sqlx::sqlite::SqlitePoolOptions;
use storelens_core::config::DatabaseConfig;

pub type DbPool = sqlx::SqlitePool;

/// Open a pool sized from the `[database]` config section.
///
/// Every connection enforces foreign keys and WAL journaling, and waits out
/// lock contention for as long as the configured acquire timeout before
/// reporting the database as busy.
pub async fn connect(settings: &DatabaseConfig) -> Result<DbPool, sqlx::Error> {
    let timeout_secs = settings.timeout_secs.max(1);
    let busy_timeout_ms = timeout_secs.saturating_mul(1000);
    SqlitePoolOptions::new()
        .max_connections(settings.max_connections.max(1))
        .acquire_timeout(Duration::from_secs(timeout_secs))
        .after_connect(move |conn, _meta| {
            Box::pin(async move {
                sqlx::query("PRAGMA foreign_keys = ON").execute(&mut *conn).await?;
                sqlx::query("PRAGMA journal_mode = WAL").execute(&mut *conn).await?;
                let busy = format!("PRAGMA busy_timeout = {busy_timeout_ms}");
                sqlx::query(&busy).execute(&mut *conn).await?;
                Ok(())
            })
        })
        .connect(&settings.url)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_settings() -> DatabaseConfig {
        DatabaseConfig { url: "sqlite::memory:".to_string(), max_connections: 1, timeout_secs: 30 }
    }

    #[tokio::test]
    async fn connections_enforce_foreign_keys() {
        let pool = connect(&memory_settings()).await.expect("connect");
        let enabled: i64 =
            sqlx::query_scalar("PRAGMA foreign_keys").fetch_one(&pool).await.expect("pragma");
        assert_eq!(enabled, 1);
    }

    #[tokio::test]
    async fn busy_timeout_follows_the_acquire_timeout() {
        let settings = DatabaseConfig { timeout_secs: 2, ..memory_settings() };
        let pool = connect(&settings).await.expect("connect");
        let busy_ms: i64 =
            sqlx::query_scalar("PRAGMA busy_timeout").fetch_one(&pool).await.expect("pragma");
        assert_eq!(busy_ms, 2000);
    }
}
