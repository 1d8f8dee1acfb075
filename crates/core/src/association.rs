//! Product association and similarity over recent transactions.
//!
//! Point-in-time aggregation over a trailing line-item window: products
//! bought together in the same transaction, products sharing buyers with
//! the target, and per-category sales rollups. No model is persisted.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::AssociationConfig;
use crate::domain::LineItemRow;
use crate::source::{AnalyticsSource, SourceError};

/// Another product frequently in the same basket as the target.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CoPurchase {
    pub product_id: i64,
    pub product_name: String,
    pub shared_transactions: usize,
}

/// Another product frequently bought by the same customers as the target.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CustomerOverlap {
    pub product_id: i64,
    pub product_name: String,
    pub shared_customers: usize,
}

/// Sales rollup for one product category.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CategoryStats {
    pub category: String,
    pub transaction_count: usize,
    pub product_count: usize,
    pub total_quantity: i64,
    pub total_revenue: Decimal,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct AssociationReport {
    pub product_id: i64,
    pub product_name: Option<String>,
    pub co_purchased: Vec<CoPurchase>,
    pub customer_overlap: Vec<CustomerOverlap>,
    pub categories: Vec<CategoryStats>,
    pub error: Option<String>,
}

/// Fetch the line-item window and compute associations for one product.
pub async fn run(
    source: &dyn AnalyticsSource,
    config: &AssociationConfig,
    product_id: i64,
    now: DateTime<Utc>,
) -> Result<AssociationReport, SourceError> {
    let items = source.line_items(now, config.window_days).await?;
    let report = compute(product_id, &items, config);
    info!(
        event_name = "association.completed",
        product_id,
        co_purchased = report.co_purchased.len(),
        customer_overlap = report.customer_overlap.len(),
        categories = report.categories.len(),
        degraded = report.error.is_some(),
    );
    Ok(report)
}

/// Pure association analysis over an already-fetched line-item window.
/// Category rollups are target-independent and produced even when the
/// target product never appears in the window.
pub fn compute(
    product_id: i64,
    items: &[LineItemRow],
    config: &AssociationConfig,
) -> AssociationReport {
    let categories = category_stats(items);

    let product_name =
        items.iter().find(|i| i.product_id == product_id).map(|i| i.product_name.clone());
    if product_name.is_none() {
        return AssociationReport {
            product_id,
            categories,
            error: Some(format!(
                "product {product_id} has no sales in the analysis window"
            )),
            ..AssociationReport::default()
        };
    }

    AssociationReport {
        product_id,
        product_name,
        co_purchased: co_purchases(product_id, items, config.co_purchase_limit),
        customer_overlap: customer_overlaps(product_id, items, config.customer_overlap_limit),
        categories,
        error: None,
    }
}

fn co_purchases(product_id: i64, items: &[LineItemRow], limit: usize) -> Vec<CoPurchase> {
    let target_transactions: HashSet<i64> = items
        .iter()
        .filter(|i| i.product_id == product_id)
        .map(|i| i.transaction_id)
        .collect();

    let mut shared: HashMap<i64, (String, HashSet<i64>)> = HashMap::new();
    for item in items {
        if item.product_id == product_id || !target_transactions.contains(&item.transaction_id) {
            continue;
        }
        shared
            .entry(item.product_id)
            .or_insert_with(|| (item.product_name.clone(), HashSet::new()))
            .1
            .insert(item.transaction_id);
    }

    let mut ranked: Vec<CoPurchase> = shared
        .into_iter()
        .map(|(id, (name, transactions))| CoPurchase {
            product_id: id,
            product_name: name,
            shared_transactions: transactions.len(),
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.shared_transactions.cmp(&a.shared_transactions).then(a.product_id.cmp(&b.product_id))
    });
    ranked.truncate(limit);
    ranked
}

fn customer_overlaps(product_id: i64, items: &[LineItemRow], limit: usize) -> Vec<CustomerOverlap> {
    // Walk-in purchases carry no customer and cannot contribute overlap.
    let target_customers: HashSet<i64> = items
        .iter()
        .filter(|i| i.product_id == product_id)
        .filter_map(|i| i.customer_id)
        .collect();

    let mut shared: HashMap<i64, (String, HashSet<i64>)> = HashMap::new();
    for item in items {
        let Some(customer_id) = item.customer_id else { continue };
        if item.product_id == product_id || !target_customers.contains(&customer_id) {
            continue;
        }
        shared
            .entry(item.product_id)
            .or_insert_with(|| (item.product_name.clone(), HashSet::new()))
            .1
            .insert(customer_id);
    }

    let mut ranked: Vec<CustomerOverlap> = shared
        .into_iter()
        .map(|(id, (name, customers))| CustomerOverlap {
            product_id: id,
            product_name: name,
            shared_customers: customers.len(),
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.shared_customers.cmp(&a.shared_customers).then(a.product_id.cmp(&b.product_id))
    });
    ranked.truncate(limit);
    ranked
}

fn category_stats(items: &[LineItemRow]) -> Vec<CategoryStats> {
    struct Acc {
        transactions: HashSet<i64>,
        products: HashSet<i64>,
        quantity: i64,
        revenue: Decimal,
    }

    let mut by_category: HashMap<String, Acc> = HashMap::new();
    for item in items {
        let acc = by_category.entry(item.category.clone()).or_insert_with(|| Acc {
            transactions: HashSet::new(),
            products: HashSet::new(),
            quantity: 0,
            revenue: Decimal::ZERO,
        });
        acc.transactions.insert(item.transaction_id);
        acc.products.insert(item.product_id);
        acc.quantity += item.quantity;
        acc.revenue += Decimal::from(item.quantity) * item.unit_price;
    }

    let mut stats: Vec<CategoryStats> = by_category
        .into_iter()
        .map(|(category, acc)| CategoryStats {
            category,
            transaction_count: acc.transactions.len(),
            product_count: acc.products.len(),
            total_quantity: acc.quantity,
            total_revenue: acc.revenue,
        })
        .collect();
    stats.sort_by(|a, b| b.total_revenue.cmp(&a.total_revenue).then(a.category.cmp(&b.category)));
    stats
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    use super::*;

    fn item(
        transaction_id: i64,
        customer_id: Option<i64>,
        product_id: i64,
        category: &str,
        quantity: i64,
        unit_price: Decimal,
    ) -> LineItemRow {
        LineItemRow {
            transaction_id,
            customer_id,
            product_id,
            product_name: format!("Product {product_id}"),
            category: category.to_string(),
            quantity,
            unit_price,
            sold_at: Utc.with_ymd_and_hms(2026, 5, 1, 10, 0, 0).unwrap(),
        }
    }

    fn config() -> AssociationConfig {
        AssociationConfig::default()
    }

    fn basket_sample() -> Vec<LineItemRow> {
        vec![
            // Transaction 1: target 1 with 2 and 3.
            item(1, Some(10), 1, "Coffee", 1, dec!(12)),
            item(1, Some(10), 2, "Coffee", 2, dec!(8)),
            item(1, Some(10), 3, "Bakery", 1, dec!(4)),
            // Transaction 2: target 1 with 2 again.
            item(2, Some(11), 1, "Coffee", 1, dec!(12)),
            item(2, Some(11), 2, "Coffee", 1, dec!(8)),
            // Transaction 3: no target.
            item(3, Some(12), 3, "Bakery", 3, dec!(4)),
            // Transaction 4: walk-in buys the target and 3.
            item(4, None, 1, "Coffee", 1, dec!(12)),
            item(4, None, 3, "Bakery", 1, dec!(4)),
        ]
    }

    #[test]
    fn co_purchase_counts_shared_transactions() {
        let report = compute(1, &basket_sample(), &config());
        assert!(report.error.is_none());
        assert_eq!(report.product_name.as_deref(), Some("Product 1"));
        assert_eq!(report.co_purchased[0].product_id, 2);
        assert_eq!(report.co_purchased[0].shared_transactions, 2);
        let third = report.co_purchased.iter().find(|c| c.product_id == 3).unwrap();
        assert_eq!(third.shared_transactions, 2);
    }

    #[test]
    fn customer_overlap_ignores_walk_ins() {
        let report = compute(1, &basket_sample(), &config());
        // Customers 10 and 11 bought the target; only customer 10 also
        // bought product 3, through transaction 1. The walk-in transaction
        // contributes nothing.
        let overlap_3 = report.customer_overlap.iter().find(|o| o.product_id == 3).unwrap();
        assert_eq!(overlap_3.shared_customers, 1);
        let overlap_2 = report.customer_overlap.iter().find(|o| o.product_id == 2).unwrap();
        assert_eq!(overlap_2.shared_customers, 2);
    }

    #[test]
    fn categories_rank_by_revenue_descending() {
        let report = compute(1, &basket_sample(), &config());
        assert_eq!(report.categories[0].category, "Coffee");
        // Coffee: 12 + 16 + 12 + 8 + 12 = 60; Bakery: 4 + 12 + 4 = 20.
        assert_eq!(report.categories[0].total_revenue, dec!(60));
        assert_eq!(report.categories[1].total_revenue, dec!(20));
        assert_eq!(report.categories[0].transaction_count, 3);
        assert_eq!(report.categories[1].product_count, 1);
    }

    #[test]
    fn unknown_product_degrades_but_keeps_category_stats() {
        let report = compute(999, &basket_sample(), &config());
        assert!(report.error.is_some());
        assert!(report.co_purchased.is_empty());
        assert!(report.customer_overlap.is_empty());
        assert_eq!(report.categories.len(), 2);
    }

    #[test]
    fn result_limits_are_applied() {
        let mut items = Vec::new();
        items.push(item(1, Some(1), 100, "Misc", 1, dec!(5)));
        for other in 0..20 {
            items.push(item(1, Some(1), other, "Misc", 1, dec!(5)));
        }
        let config = AssociationConfig {
            co_purchase_limit: 5,
            customer_overlap_limit: 10,
            ..AssociationConfig::default()
        };
        let report = compute(100, &items, &config);
        assert_eq!(report.co_purchased.len(), 5);
        assert_eq!(report.customer_overlap.len(), 10);
    }

    #[test]
    fn empty_window_reports_an_error() {
        let report = compute(1, &[], &config());
        assert!(report.error.is_some());
        assert!(report.categories.is_empty());
    }
}
