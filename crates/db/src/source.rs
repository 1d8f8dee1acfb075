//! SQLite implementation of the analytics data-access contract.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{sqlite::SqliteRow, Row};

use storelens_core::domain::{
    CustomerActivityRow, DailyProductSale, DailySalePoint, InventoryRow, LineItemRow,
};
use storelens_core::source::{AnalyticsSource, SourceError};

use crate::DbPool;

/// Timestamps are stored as UTC text in SQLite's own datetime format so
/// that `datetime('now', ...)` expressions and lexicographic comparisons
/// agree with values written by the application.
const SQL_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct SqlAnalyticsSource {
    pool: DbPool,
}

impl SqlAnalyticsSource {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn db_error(error: sqlx::Error) -> SourceError {
        SourceError::Backend(error.to_string())
    }

    fn format_ts(ts: DateTime<Utc>) -> String {
        ts.format(SQL_DATETIME_FORMAT).to_string()
    }

    fn parse_ts(field: &str, raw: &str) -> Result<DateTime<Utc>, SourceError> {
        NaiveDateTime::parse_from_str(raw, SQL_DATETIME_FORMAT)
            .map(|naive| naive.and_utc())
            .map_err(|_| SourceError::Decode(format!("invalid timestamp in `{field}`: `{raw}`")))
    }

    fn parse_date(field: &str, raw: &str) -> Result<NaiveDate, SourceError> {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map_err(|_| SourceError::Decode(format!("invalid date in `{field}`: `{raw}`")))
    }

    fn parse_decimal(field: &str, raw: &str) -> Result<Decimal, SourceError> {
        Decimal::from_str(raw)
            .map_err(|_| SourceError::Decode(format!("invalid decimal in `{field}`: `{raw}`")))
    }

    fn parse_count(field: &str, raw: i64) -> Result<u32, SourceError> {
        u32::try_from(raw)
            .map_err(|_| SourceError::Decode(format!("negative count in `{field}`: {raw}")))
    }
}

#[async_trait]
impl AnalyticsSource for SqlAnalyticsSource {
    async fn customer_activity(
        &self,
        now: DateTime<Utc>,
        lookback_days: i64,
    ) -> Result<Vec<CustomerActivityRow>, SourceError> {
        let window_start = Self::format_ts(now - Duration::days(lookback_days));
        let window_end = Self::format_ts(now);

        let rows = sqlx::query(
            r#"
            SELECT
                c.id AS customer_id,
                c.name AS name,
                MAX(t.created_at) AS last_purchase,
                COUNT(t.id) AS frequency,
                CAST(IFNULL(SUM(t.total), 0) AS TEXT) AS monetary_text
            FROM customers c
            LEFT JOIN transactions t
                ON t.customer_id = c.id
                AND t.created_at >= ?1
                AND t.created_at <= ?2
            GROUP BY c.id, c.name
            ORDER BY c.id
            "#,
        )
        .bind(&window_start)
        .bind(&window_end)
        .fetch_all(&self.pool)
        .await
        .map_err(Self::db_error)?;

        rows.iter()
            .map(|row: &SqliteRow| {
                let last_purchase: Option<String> =
                    row.try_get("last_purchase").map_err(Self::db_error)?;
                let last_purchase = last_purchase
                    .map(|raw| Self::parse_ts("last_purchase", &raw))
                    .transpose()?;
                let frequency: i64 = row.try_get("frequency").map_err(Self::db_error)?;
                let monetary_text: String =
                    row.try_get("monetary_text").map_err(Self::db_error)?;
                Ok(CustomerActivityRow {
                    customer_id: row.try_get("customer_id").map_err(Self::db_error)?,
                    name: row.try_get("name").map_err(Self::db_error)?,
                    last_purchase,
                    frequency: Self::parse_count("frequency", frequency)?,
                    monetary: Self::parse_decimal("monetary_text", &monetary_text)?,
                })
            })
            .collect()
    }

    async fn inventory(&self, store_id: Option<i64>) -> Result<Vec<InventoryRow>, SourceError> {
        let rows = sqlx::query(
            r#"
            SELECT
                p.id AS product_id,
                p.name AS product_name,
                p.category AS category,
                i.quantity AS quantity,
                CAST(p.unit_cost AS TEXT) AS unit_cost_text,
                CAST(p.unit_price AS TEXT) AS unit_price_text,
                i.reorder_point AS reorder_point,
                i.reorder_quantity AS reorder_quantity,
                i.store_id AS store_id
            FROM inventory i
            JOIN products p ON p.id = i.product_id
            WHERE ?1 IS NULL OR i.store_id = ?1
            ORDER BY i.store_id, p.id
            "#,
        )
        .bind(store_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Self::db_error)?;

        rows.iter()
            .map(|row: &SqliteRow| {
                let unit_cost_text: String =
                    row.try_get("unit_cost_text").map_err(Self::db_error)?;
                let unit_price_text: String =
                    row.try_get("unit_price_text").map_err(Self::db_error)?;
                Ok(InventoryRow {
                    product_id: row.try_get("product_id").map_err(Self::db_error)?,
                    product_name: row.try_get("product_name").map_err(Self::db_error)?,
                    category: row.try_get("category").map_err(Self::db_error)?,
                    quantity: row.try_get("quantity").map_err(Self::db_error)?,
                    unit_cost: Self::parse_decimal("unit_cost_text", &unit_cost_text)?,
                    unit_price: Self::parse_decimal("unit_price_text", &unit_price_text)?,
                    reorder_point: row.try_get("reorder_point").map_err(Self::db_error)?,
                    reorder_quantity: row.try_get("reorder_quantity").map_err(Self::db_error)?,
                    store_id: row.try_get("store_id").map_err(Self::db_error)?,
                })
            })
            .collect()
    }

    async fn line_items(
        &self,
        now: DateTime<Utc>,
        window_days: i64,
    ) -> Result<Vec<LineItemRow>, SourceError> {
        let window_start = Self::format_ts(now - Duration::days(window_days));
        let window_end = Self::format_ts(now);

        let rows = sqlx::query(
            r#"
            SELECT
                ti.transaction_id AS transaction_id,
                t.customer_id AS customer_id,
                ti.product_id AS product_id,
                p.name AS product_name,
                p.category AS category,
                ti.quantity AS quantity,
                CAST(ti.unit_price AS TEXT) AS unit_price_text,
                t.created_at AS sold_at
            FROM transaction_items ti
            JOIN transactions t ON t.id = ti.transaction_id
            JOIN products p ON p.id = ti.product_id
            WHERE t.created_at >= ?1 AND t.created_at <= ?2
            ORDER BY ti.transaction_id, ti.id
            "#,
        )
        .bind(&window_start)
        .bind(&window_end)
        .fetch_all(&self.pool)
        .await
        .map_err(Self::db_error)?;

        rows.iter()
            .map(|row: &SqliteRow| {
                let unit_price_text: String =
                    row.try_get("unit_price_text").map_err(Self::db_error)?;
                let sold_at: String = row.try_get("sold_at").map_err(Self::db_error)?;
                Ok(LineItemRow {
                    transaction_id: row.try_get("transaction_id").map_err(Self::db_error)?,
                    customer_id: row.try_get("customer_id").map_err(Self::db_error)?,
                    product_id: row.try_get("product_id").map_err(Self::db_error)?,
                    product_name: row.try_get("product_name").map_err(Self::db_error)?,
                    category: row.try_get("category").map_err(Self::db_error)?,
                    quantity: row.try_get("quantity").map_err(Self::db_error)?,
                    unit_price: Self::parse_decimal("unit_price_text", &unit_price_text)?,
                    sold_at: Self::parse_ts("sold_at", &sold_at)?,
                })
            })
            .collect()
    }

    async fn daily_sales(
        &self,
        product_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<DailySalePoint>, SourceError> {
        let window_end = Self::format_ts(now);

        let rows = sqlx::query(
            r#"
            SELECT
                date(t.created_at) AS day,
                CAST(SUM(ti.quantity) AS REAL) AS quantity
            FROM transaction_items ti
            JOIN transactions t ON t.id = ti.transaction_id
            WHERE ti.product_id = ?1 AND t.created_at <= ?2
            GROUP BY day
            ORDER BY day
            "#,
        )
        .bind(product_id)
        .bind(&window_end)
        .fetch_all(&self.pool)
        .await
        .map_err(Self::db_error)?;

        rows.iter()
            .map(|row: &SqliteRow| {
                let day: String = row.try_get("day").map_err(Self::db_error)?;
                Ok(DailySalePoint {
                    date: Self::parse_date("day", &day)?,
                    quantity: row.try_get("quantity").map_err(Self::db_error)?,
                })
            })
            .collect()
    }

    async fn daily_sales_by_product(
        &self,
        now: DateTime<Utc>,
        window_days: i64,
    ) -> Result<Vec<DailyProductSale>, SourceError> {
        let window_start = Self::format_ts(now - Duration::days(window_days));
        let window_end = Self::format_ts(now);

        let rows = sqlx::query(
            r#"
            SELECT
                ti.product_id AS product_id,
                date(t.created_at) AS day,
                CAST(SUM(ti.quantity) AS REAL) AS quantity
            FROM transaction_items ti
            JOIN transactions t ON t.id = ti.transaction_id
            WHERE t.created_at >= ?1 AND t.created_at <= ?2
            GROUP BY ti.product_id, day
            ORDER BY ti.product_id, day
            "#,
        )
        .bind(&window_start)
        .bind(&window_end)
        .fetch_all(&self.pool)
        .await
        .map_err(Self::db_error)?;

        rows.iter()
            .map(|row: &SqliteRow| {
                let day: String = row.try_get("day").map_err(Self::db_error)?;
                Ok(DailyProductSale {
                    product_id: row.try_get("product_id").map_err(Self::db_error)?,
                    date: Self::parse_date("day", &day)?,
                    quantity: row.try_get("quantity").map_err(Self::db_error)?,
                })
            })
            .collect()
    }
}
