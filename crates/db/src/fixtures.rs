//! Deterministic demo dataset for local runs and end-to-end checks.

use sqlx::Executor;
use thiserror::Error;

use crate::connection::DbPool;

const SEED_CUSTOMER_COUNT: i64 = 6;
const SEED_PRODUCT_COUNT: i64 = 8;
const SEED_TRANSACTION_COUNT: i64 = 18;

/// Product ids every analytics demo leans on: espresso beans sell on many
/// distinct days so the forecast pipeline always has enough history.
const SEED_FORECASTABLE_PRODUCT_ID: i64 = 1;
const MIN_FORECASTABLE_SALE_DAYS: i64 = 7;

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}

#[derive(Debug)]
pub struct SeedResult {
    pub customers: i64,
    pub products: i64,
    pub transactions: i64,
}

#[derive(Debug)]
pub struct VerificationResult {
    pub checks: Vec<(&'static str, bool)>,
}

impl VerificationResult {
    pub fn all_passed(&self) -> bool {
        self.checks.iter().all(|(_, passed)| *passed)
    }
}

/// Demo retailer dataset: a small specialty-coffee shop with two stores.
/// Transaction timestamps are relative to load time so every default
/// analysis window contains data.
pub struct SeedDataset;

impl SeedDataset {
    pub const SQL: &str = include_str!("../../../config/fixtures/demo_seed_data.sql");

    /// Load the dataset inside one transaction. Assumes empty tables;
    /// re-seeding an already-seeded database fails on primary keys.
    pub async fn load(pool: &DbPool) -> Result<SeedResult, FixtureError> {
        let mut tx = pool.begin().await?;
        tx.execute(sqlx::query(Self::SQL)).await?;
        tx.commit().await?;

        Ok(SeedResult {
            customers: SEED_CUSTOMER_COUNT,
            products: SEED_PRODUCT_COUNT,
            transactions: SEED_TRANSACTION_COUNT,
        })
    }

    /// Verify the seeded dataset satisfies what the demo pipelines expect.
    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, FixtureError> {
        let mut checks = Vec::new();

        let customers: i64 =
            sqlx::query_scalar("SELECT COUNT(1) FROM customers").fetch_one(pool).await?;
        checks.push(("customers", customers == SEED_CUSTOMER_COUNT));

        let products: i64 =
            sqlx::query_scalar("SELECT COUNT(1) FROM products").fetch_one(pool).await?;
        checks.push(("products", products == SEED_PRODUCT_COUNT));

        let transactions: i64 =
            sqlx::query_scalar("SELECT COUNT(1) FROM transactions").fetch_one(pool).await?;
        checks.push(("transactions", transactions == SEED_TRANSACTION_COUNT));

        let orphan_items: i64 = sqlx::query_scalar(
            "SELECT COUNT(1) FROM transaction_items ti
             LEFT JOIN transactions t ON t.id = ti.transaction_id
             WHERE t.id IS NULL",
        )
        .fetch_one(pool)
        .await?;
        checks.push(("no-orphan-items", orphan_items == 0));

        let inventory_products: i64 = sqlx::query_scalar(
            "SELECT COUNT(DISTINCT product_id) FROM inventory WHERE store_id = 1",
        )
        .fetch_one(pool)
        .await?;
        checks.push(("store-one-inventory", inventory_products == SEED_PRODUCT_COUNT));

        let forecastable_days: i64 = sqlx::query_scalar(
            "SELECT COUNT(DISTINCT date(t.created_at))
             FROM transaction_items ti
             JOIN transactions t ON t.id = ti.transaction_id
             WHERE ti.product_id = ?1",
        )
        .bind(SEED_FORECASTABLE_PRODUCT_ID)
        .fetch_one(pool)
        .await?;
        checks.push(("forecastable-history", forecastable_days >= MIN_FORECASTABLE_SALE_DAYS));

        let anonymous_transactions: i64 = sqlx::query_scalar(
            "SELECT COUNT(1) FROM transactions WHERE customer_id IS NULL",
        )
        .fetch_one(pool)
        .await?;
        checks.push(("walk-in-transactions", anonymous_transactions > 0));

        Ok(VerificationResult { checks })
    }
}

#[cfg(test)]
mod tests {
    use storelens_core::config::DatabaseConfig;

    use super::*;
    use crate::{connect, migrations};

    async fn migrated_pool() -> DbPool {
        let settings = DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            timeout_secs: 30,
        };
        let pool = connect(&settings).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrate");
        pool
    }

    #[tokio::test]
    async fn seed_loads_and_verifies_on_a_fresh_database() {
        let pool = migrated_pool().await;

        let result = SeedDataset::load(&pool).await.expect("load seed");
        assert_eq!(result.customers, 6);
        assert_eq!(result.products, 8);

        let verification = SeedDataset::verify(&pool).await.expect("verify seed");
        assert!(
            verification.all_passed(),
            "failed checks: {:?}",
            verification
                .checks
                .iter()
                .filter(|(_, passed)| !passed)
                .collect::<Vec<_>>()
        );
    }

    #[tokio::test]
    async fn reseeding_a_seeded_database_fails_cleanly() {
        let pool = migrated_pool().await;

        SeedDataset::load(&pool).await.expect("first load");
        assert!(SeedDataset::load(&pool).await.is_err());
    }
}
