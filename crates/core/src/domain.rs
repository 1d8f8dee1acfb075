//! Tabular extract rows supplied by the data-access adapter.
//!
//! Every analytics pipeline consumes one or more of these row shapes and
//! returns structured result tables. Rows are transient: computed fresh per
//! analysis request, owned by the invocation, never persisted by the engine.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One customer with purchase activity over the lookback window, including
/// customers with zero purchases (the adapter LEFT JOINs transactions).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CustomerActivityRow {
    pub customer_id: i64,
    pub name: String,
    /// `None` for customers who never purchased in the window.
    pub last_purchase: Option<DateTime<Utc>>,
    pub frequency: u32,
    pub monetary: Decimal,
}

/// One inventory position joined with its product metadata.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InventoryRow {
    pub product_id: i64,
    pub product_name: String,
    pub category: String,
    pub quantity: i64,
    pub unit_cost: Decimal,
    pub unit_price: Decimal,
    pub reorder_point: i64,
    pub reorder_quantity: i64,
    pub store_id: i64,
}

/// One transaction line item joined to its product and parent transaction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineItemRow {
    pub transaction_id: i64,
    /// Nullable: walk-in transactions carry no customer.
    pub customer_id: Option<i64>,
    pub product_id: i64,
    pub product_name: String,
    pub category: String,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub sold_at: DateTime<Utc>,
}

/// One observed day of sales for a single product. Days with no sales are
/// absent here; the series builder zero-fills them.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DailySalePoint {
    pub date: NaiveDate,
    pub quantity: f64,
}

/// One observed day of sales for one product, across the whole catalog.
/// Used for demand estimation in inventory optimization.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DailyProductSale {
    pub product_id: i64,
    pub date: NaiveDate,
    pub quantity: f64,
}
