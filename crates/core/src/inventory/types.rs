//! Types for the inventory analysis and optimization engine

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// ABC class by cumulative share of total stock value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AbcClass {
    A,
    B,
    C,
}

/// One valued and classified inventory position.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StockRow {
    pub product_id: i64,
    pub product_name: String,
    pub category: String,
    pub store_id: i64,
    pub quantity: i64,
    pub unit_cost: Decimal,
    pub unit_price: Decimal,
    pub stock_value: Decimal,
    pub potential_revenue: Decimal,
    /// Gross margin percentage; 0 when the price is non-positive.
    pub profit_margin_pct: f64,
    /// Quantity at or below the stored reorder point.
    pub low_stock: bool,
    pub abc_class: AbcClass,
    /// Cumulative share of total stock value, in percent, after sorting by
    /// stock value descending.
    pub cumulative_value_pct: f64,
}

/// Per-class rollup of the ABC classification.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassSummary {
    pub abc_class: AbcClass,
    pub item_count: usize,
    pub total_quantity: i64,
    pub total_value: Decimal,
    pub total_potential_revenue: Decimal,
}

/// EOQ / safety-stock sizing for one product with demand history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OptimizationRow {
    pub product_id: i64,
    pub product_name: String,
    pub avg_daily_demand: f64,
    pub demand_std_dev: f64,
    pub annual_demand: f64,
    /// Economic order quantity; 0 when demand or holding cost is
    /// non-positive.
    pub eoq: f64,
    pub safety_stock: f64,
    pub reorder_point: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockAction {
    Reorder,
    ReduceStock,
}

/// One actionable stock adjustment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StockRecommendation {
    pub product_id: i64,
    pub product_name: String,
    pub action: StockAction,
    pub current_quantity: i64,
    pub recommended_quantity: f64,
}

/// Complete inventory analysis result.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct InventoryReport {
    pub rows: Vec<StockRow>,
    pub class_summary: Vec<ClassSummary>,
    pub optimization: Vec<OptimizationRow>,
    pub recommendations: Vec<StockRecommendation>,
    pub total_stock_value: Decimal,
    pub total_potential_revenue: Decimal,
    pub low_stock_count: usize,
    pub error: Option<String>,
}
