//! Inventory valuation, ABC classification, and replenishment sizing.
//!
//! ABC classes are assigned by cumulative share of total stock value.
//! Products with demand history additionally get EOQ, safety stock, and
//! reorder-point sizing plus concrete reorder / reduce recommendations.

mod engine;
mod types;

pub use engine::compute;
pub use types::{
    AbcClass, ClassSummary, InventoryReport, OptimizationRow, StockAction, StockRecommendation,
    StockRow,
};

use chrono::{DateTime, Utc};
use tracing::info;

use crate::config::InventoryConfig;
use crate::source::{AnalyticsSource, SourceError};

/// Fetch inventory positions (optionally one store) plus recent demand and
/// analyze them.
pub async fn run(
    source: &dyn AnalyticsSource,
    config: &InventoryConfig,
    store_id: Option<i64>,
    now: DateTime<Utc>,
) -> Result<InventoryReport, SourceError> {
    let inventory = source.inventory(store_id).await?;
    let sales = source.daily_sales_by_product(now, config.demand_window_days).await?;
    let report = compute(&inventory, &sales, config);
    info!(
        event_name = "inventory.completed",
        positions = report.rows.len(),
        low_stock = report.low_stock_count,
        recommendations = report.recommendations.len(),
        degraded = report.error.is_some(),
    );
    Ok(report)
}
