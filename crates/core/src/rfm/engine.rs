//! Quartile scoring and segment assignment.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::debug;

use crate::config::RfmConfig;
use crate::domain::CustomerActivityRow;
use crate::stats::{distinct_count, quantile};

use super::types::{
    MetricSpread, RfmReport, RfmRow, Segment, SegmentCharacteristics, SegmentStrategy,
    SegmentSummary,
};

/// Score assigned to every customer when a metric cannot be binned into
/// quartiles (fewer than four distinct values).
pub const NEUTRAL_SCORE: u8 = 2;

/// How one metric maps onto a 1..=4 score.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Binning {
    /// Quartile cut points at Q1, Q2, Q3 of the observed values.
    Quantile { cuts: [f64; 3] },
    /// Degenerate metric: every customer receives [`NEUTRAL_SCORE`].
    ConstantFallback,
}

impl Binning {
    fn fit(values: &[f64]) -> Self {
        if distinct_count(values) < 4 {
            return Binning::ConstantFallback;
        }
        Binning::Quantile {
            cuts: [
                quantile(values, 0.25),
                quantile(values, 0.50),
                quantile(values, 0.75),
            ],
        }
    }

    /// Ascending score: 1 for the lowest quartile, 4 for the highest.
    fn score(&self, value: f64) -> u8 {
        match self {
            Binning::ConstantFallback => NEUTRAL_SCORE,
            Binning::Quantile { cuts } => {
                1 + cuts.iter().filter(|cut| value > **cut).count() as u8
            }
        }
    }

    /// Descending score: 4 for the lowest quartile. Used for recency, where
    /// fewer days since the last purchase is better.
    fn score_inverted(&self, value: f64) -> u8 {
        match self {
            Binning::ConstantFallback => NEUTRAL_SCORE,
            Binning::Quantile { .. } => 5 - self.score(value),
        }
    }
}

fn assign_segment(strategy: SegmentStrategy, r: u8, f: u8, m: u8) -> Segment {
    match strategy {
        // First match wins; order is significant.
        SegmentStrategy::Precedence => {
            if r == 4 && f == 4 && m == 4 {
                Segment::BestCustomers
            } else if f == 4 && m == 4 {
                Segment::LoyalCustomers
            } else if m == 4 {
                Segment::BigSpenders
            } else if r == 1 {
                Segment::LostCustomers
            } else if r == 4 {
                Segment::RecentCustomers
            } else {
                Segment::AverageCustomers
            }
        }
        SegmentStrategy::Composite => {
            let top_tier = matches!((r, f, m), (4, 4, 4) | (4, 3, 4) | (4, 4, 3) | (4, 3, 3));
            if top_tier {
                Segment::BestCustomers
            } else if f == 4 && m == 4 {
                Segment::LoyalCustomers
            } else if m == 4 {
                Segment::BigSpenders
            } else if r == 1 {
                Segment::LostCustomers
            } else if r == 4 && f >= 2 {
                Segment::RecentCustomers
            } else {
                Segment::AverageCustomers
            }
        }
    }
}

/// Pure segmentation over an already-fetched activity extract.
///
/// Deterministic for a fixed `now`: rows are keyed and ordered by customer
/// id, and quartile cuts depend only on the extract.
pub fn compute(rows: &[CustomerActivityRow], config: &RfmConfig, now: DateTime<Utc>) -> RfmReport {
    // An empty customer base is a valid (empty) segmentation, not an error.
    if rows.is_empty() {
        return RfmReport::default();
    }

    let recency: Vec<f64> = rows
        .iter()
        .map(|row| recency_days(row, now, config.lookback_days) as f64)
        .collect();
    let frequency: Vec<f64> = rows.iter().map(|row| f64::from(row.frequency)).collect();
    let monetary: Vec<f64> = rows
        .iter()
        .map(|row| row.monetary.to_f64().unwrap_or(0.0))
        .collect();

    let recency_bins = Binning::fit(&recency);
    let frequency_bins = Binning::fit(&frequency);
    let monetary_bins = Binning::fit(&monetary);
    debug!(
        event_name = "rfm.binning_fitted",
        customers = rows.len(),
        recency_fallback = matches!(recency_bins, Binning::ConstantFallback),
        frequency_fallback = matches!(frequency_bins, Binning::ConstantFallback),
        monetary_fallback = matches!(monetary_bins, Binning::ConstantFallback),
    );

    let mut scored: Vec<RfmRow> = rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let r = recency_bins.score_inverted(recency[i]);
            let f = frequency_bins.score(frequency[i]);
            let m = monetary_bins.score(monetary[i]);
            RfmRow {
                customer_id: row.customer_id,
                name: row.name.clone(),
                recency_days: recency[i] as i64,
                frequency: row.frequency,
                monetary: row.monetary,
                r_score: r,
                f_score: f,
                m_score: m,
                rfm_score: format!("{r}{f}{m}"),
                segment: assign_segment(config.strategy, r, f, m),
            }
        })
        .collect();
    scored.sort_by_key(|row| row.customer_id);

    let summary = summarize(&scored);
    let characteristics = characterize(&scored);

    RfmReport {
        rows: scored,
        summary,
        characteristics,
        error: None,
    }
}

/// Days since the last purchase, or the full lookback window for customers
/// who never purchased. The sentinel keeps never-buyers in the lowest
/// recency quartile instead of dropping them from the analysis.
fn recency_days(row: &CustomerActivityRow, now: DateTime<Utc>, lookback_days: i64) -> i64 {
    match row.last_purchase {
        Some(last) => (now - last).num_days().clamp(0, lookback_days),
        None => lookback_days,
    }
}

fn summarize(rows: &[RfmRow]) -> Vec<SegmentSummary> {
    let total = rows.len();
    let mut groups: HashMap<Segment, Vec<&RfmRow>> = HashMap::new();
    for row in rows {
        groups.entry(row.segment).or_default().push(row);
    }

    let mut summary: Vec<SegmentSummary> = groups
        .into_iter()
        .map(|(segment, members)| {
            let count = members.len();
            let total_monetary: Decimal = members.iter().map(|m| m.monetary).sum();
            SegmentSummary {
                segment,
                count,
                avg_recency_days: members.iter().map(|m| m.recency_days as f64).sum::<f64>()
                    / count as f64,
                avg_frequency: members.iter().map(|m| f64::from(m.frequency)).sum::<f64>()
                    / count as f64,
                avg_monetary: total_monetary.to_f64().unwrap_or(0.0) / count as f64,
                total_monetary,
                percentage: count as f64 / total as f64 * 100.0,
            }
        })
        .collect();
    summary.sort_by(|a, b| b.count.cmp(&a.count).then(b.total_monetary.cmp(&a.total_monetary)));
    summary
}

fn characterize(rows: &[RfmRow]) -> Vec<SegmentCharacteristics> {
    let mut groups: HashMap<Segment, Vec<&RfmRow>> = HashMap::new();
    for row in rows {
        groups.entry(row.segment).or_default().push(row);
    }

    let mut characteristics: Vec<SegmentCharacteristics> = groups
        .into_iter()
        .map(|(segment, members)| {
            let recency: Vec<f64> = members.iter().map(|m| m.recency_days as f64).collect();
            let frequency: Vec<f64> = members.iter().map(|m| f64::from(m.frequency)).collect();
            let monetary: Vec<f64> = members
                .iter()
                .map(|m| m.monetary.to_f64().unwrap_or(0.0))
                .collect();
            SegmentCharacteristics {
                segment,
                recency: spread(&recency),
                frequency: spread(&frequency),
                monetary: spread(&monetary),
            }
        })
        .collect();
    characteristics.sort_by_key(|c| c.segment.label());
    characteristics
}

fn spread(values: &[f64]) -> MetricSpread {
    MetricSpread {
        min: values.iter().copied().fold(f64::INFINITY, f64::min),
        mean: crate::stats::mean(values),
        max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    }
}
