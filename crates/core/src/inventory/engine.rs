//! Valuation, ABC classification, and EOQ sizing.

use std::collections::HashMap;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::debug;

use crate::config::InventoryConfig;
use crate::domain::{DailyProductSale, InventoryRow};
use crate::stats::{inverse_normal_cdf, mean, sample_std_dev};

use super::types::{
    AbcClass, ClassSummary, InventoryReport, OptimizationRow, StockAction, StockRecommendation,
    StockRow,
};

const DAYS_PER_YEAR: f64 = 365.0;

/// Pure inventory analysis over already-fetched extracts.
///
/// Valuation and ABC classification need only the inventory positions;
/// optimization and recommendations additionally need demand history and
/// degrade to empty tables without it.
pub fn compute(
    inventory: &[InventoryRow],
    sales: &[DailyProductSale],
    config: &InventoryConfig,
) -> InventoryReport {
    if inventory.is_empty() {
        return InventoryReport {
            error: Some("no inventory positions found".to_string()),
            ..InventoryReport::default()
        };
    }

    let rows = classify(inventory, config);
    let class_summary = summarize(&rows);
    let demand = demand_stats(sales);
    let optimization = optimize(&rows, &demand, config);
    let recommendations = recommend(&rows, &optimization);

    let total_stock_value: Decimal = rows.iter().map(|r| r.stock_value).sum();
    let total_potential_revenue: Decimal = rows.iter().map(|r| r.potential_revenue).sum();
    let low_stock_count = rows.iter().filter(|r| r.low_stock).count();

    debug!(
        event_name = "inventory.computed",
        positions = rows.len(),
        optimized = optimization.len(),
        recommendations = recommendations.len(),
    );

    InventoryReport {
        rows,
        class_summary,
        optimization,
        recommendations,
        total_stock_value,
        total_potential_revenue,
        low_stock_count,
        error: None,
    }
}

/// Value every position and assign ABC classes by cumulative share of total
/// stock value, descending. Classes partition all rows; the A and B
/// thresholds are inclusive upper bounds.
fn classify(inventory: &[InventoryRow], config: &InventoryConfig) -> Vec<StockRow> {
    let mut rows: Vec<StockRow> = inventory
        .iter()
        .map(|item| {
            let quantity = Decimal::from(item.quantity);
            let stock_value = quantity * item.unit_cost;
            let potential_revenue = quantity * item.unit_price;
            let profit_margin_pct = if item.unit_price > Decimal::ZERO {
                ((item.unit_price - item.unit_cost) / item.unit_price * Decimal::from(100))
                    .to_f64()
                    .unwrap_or(0.0)
            } else {
                0.0
            };
            StockRow {
                product_id: item.product_id,
                product_name: item.product_name.clone(),
                category: item.category.clone(),
                store_id: item.store_id,
                quantity: item.quantity,
                unit_cost: item.unit_cost,
                unit_price: item.unit_price,
                stock_value,
                potential_revenue,
                profit_margin_pct,
                low_stock: item.quantity <= item.reorder_point,
                abc_class: AbcClass::C,
                cumulative_value_pct: 0.0,
            }
        })
        .collect();

    rows.sort_by(|a, b| b.stock_value.cmp(&a.stock_value).then(a.product_id.cmp(&b.product_id)));

    let total: Decimal = rows.iter().map(|r| r.stock_value).sum();
    let total = total.to_f64().unwrap_or(0.0);
    let mut running = 0.0;
    for row in &mut rows {
        running += row.stock_value.to_f64().unwrap_or(0.0);
        // Zero total value: every share is 0, everything lands in class A.
        row.cumulative_value_pct = if total > 0.0 { running / total * 100.0 } else { 0.0 };
        row.abc_class = if row.cumulative_value_pct <= config.abc_a_threshold {
            AbcClass::A
        } else if row.cumulative_value_pct <= config.abc_b_threshold {
            AbcClass::B
        } else {
            AbcClass::C
        };
    }

    rows
}

fn summarize(rows: &[StockRow]) -> Vec<ClassSummary> {
    let mut groups: HashMap<AbcClass, Vec<&StockRow>> = HashMap::new();
    for row in rows {
        groups.entry(row.abc_class).or_default().push(row);
    }

    let mut summary: Vec<ClassSummary> = groups
        .into_iter()
        .map(|(abc_class, members)| ClassSummary {
            abc_class,
            item_count: members.len(),
            total_quantity: members.iter().map(|m| m.quantity).sum(),
            total_value: members.iter().map(|m| m.stock_value).sum(),
            total_potential_revenue: members.iter().map(|m| m.potential_revenue).sum(),
        })
        .collect();
    summary.sort_by_key(|s| s.abc_class);
    summary
}

struct DemandStats {
    avg_daily: f64,
    std_dev: f64,
}

/// Per-product demand statistics over observed sale days. Days with no
/// sales are absent from the extract and do not drag the average down;
/// the estimate describes demand on days the product moves.
fn demand_stats(sales: &[DailyProductSale]) -> HashMap<i64, DemandStats> {
    let mut by_product: HashMap<i64, Vec<f64>> = HashMap::new();
    for sale in sales {
        by_product.entry(sale.product_id).or_default().push(sale.quantity);
    }

    by_product
        .into_iter()
        .map(|(product_id, quantities)| {
            (
                product_id,
                DemandStats {
                    avg_daily: mean(&quantities),
                    std_dev: sample_std_dev(&quantities),
                },
            )
        })
        .collect()
}

fn optimize(
    rows: &[StockRow],
    demand: &HashMap<i64, DemandStats>,
    config: &InventoryConfig,
) -> Vec<OptimizationRow> {
    let z = inverse_normal_cdf(config.service_level);

    let mut optimization: Vec<OptimizationRow> = rows
        .iter()
        .filter_map(|row| {
            let stats = demand.get(&row.product_id)?;
            let annual_demand = stats.avg_daily * DAYS_PER_YEAR;
            let holding_cost = row.unit_cost.to_f64().unwrap_or(0.0) * config.holding_cost_rate;
            let eoq = if annual_demand > 0.0 && holding_cost > 0.0 {
                (2.0 * annual_demand * config.ordering_cost / holding_cost).sqrt()
            } else {
                0.0
            };
            let safety_stock = z * stats.std_dev * config.lead_time_days.sqrt();
            let reorder_point = stats.avg_daily * config.lead_time_days + safety_stock;
            Some(OptimizationRow {
                product_id: row.product_id,
                product_name: row.product_name.clone(),
                avg_daily_demand: stats.avg_daily,
                demand_std_dev: stats.std_dev,
                annual_demand,
                eoq,
                safety_stock,
                reorder_point,
            })
        })
        .collect();
    optimization.sort_by_key(|o| o.product_id);
    optimization
}

fn recommend(rows: &[StockRow], optimization: &[OptimizationRow]) -> Vec<StockRecommendation> {
    let by_product: HashMap<i64, &OptimizationRow> =
        optimization.iter().map(|o| (o.product_id, o)).collect();

    rows.iter()
        .filter_map(|row| {
            let sizing = by_product.get(&row.product_id)?;
            let quantity = row.quantity as f64;
            if quantity <= sizing.reorder_point {
                Some(StockRecommendation {
                    product_id: row.product_id,
                    product_name: row.product_name.clone(),
                    action: StockAction::Reorder,
                    current_quantity: row.quantity,
                    recommended_quantity: sizing.eoq,
                })
            } else if quantity > 2.0 * sizing.reorder_point {
                Some(StockRecommendation {
                    product_id: row.product_id,
                    product_name: row.product_name.clone(),
                    action: StockAction::ReduceStock,
                    current_quantity: row.quantity,
                    recommended_quantity: sizing.reorder_point + sizing.safety_stock,
                })
            } else {
                None
            }
        })
        .collect()
}
