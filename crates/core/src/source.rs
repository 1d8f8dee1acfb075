//! Contract between the analytics engines and the data-access adapter.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::{
    CustomerActivityRow, DailyProductSale, DailySalePoint, InventoryRow, LineItemRow,
};

/// Upstream data-access failure. Fatal to the pipeline call: no analytics
/// computation can proceed without its extract, so these propagate to the
/// caller instead of degrading into a result-object `error` field.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("data access failure: {0}")]
    Backend(String),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Windowed tabular extracts consumed by the engines.
///
/// A handle is not safely shared across concurrent calls without external
/// pooling; each analytics invocation should acquire its own scoped handle
/// and release it on every exit path.
#[async_trait]
pub trait AnalyticsSource: Send + Sync {
    /// All customers with their purchase activity inside the lookback
    /// window, including customers with zero purchases.
    async fn customer_activity(
        &self,
        now: DateTime<Utc>,
        lookback_days: i64,
    ) -> Result<Vec<CustomerActivityRow>, SourceError>;

    /// Inventory positions joined with product metadata, optionally
    /// filtered to a single store.
    async fn inventory(&self, store_id: Option<i64>) -> Result<Vec<InventoryRow>, SourceError>;

    /// Transaction line items joined to products over a trailing window.
    async fn line_items(
        &self,
        now: DateTime<Utc>,
        window_days: i64,
    ) -> Result<Vec<LineItemRow>, SourceError>;

    /// Per-day sale quantities for one product, from its earliest recorded
    /// sale up to `now`. Days with no sales are absent.
    async fn daily_sales(
        &self,
        product_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<DailySalePoint>, SourceError>;

    /// Per-product daily sale quantities over a trailing window, used for
    /// demand estimation.
    async fn daily_sales_by_product(
        &self,
        now: DateTime<Utc>,
        window_days: i64,
    ) -> Result<Vec<DailyProductSale>, SourceError>;
}
