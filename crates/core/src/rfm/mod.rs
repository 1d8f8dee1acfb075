//! RFM (recency / frequency / monetary) customer segmentation.
//!
//! Scores every customer 1..=4 on each metric via quartile binning, labels
//! a value segment from the score triple, and aggregates per-segment
//! statistics. Degenerate metrics (fewer than four distinct values) fall
//! back to a uniform neutral score rather than failing the run.

mod engine;
mod types;

pub use engine::{compute, NEUTRAL_SCORE};
pub use types::{
    MetricSpread, RfmReport, RfmRow, Segment, SegmentCharacteristics, SegmentStrategy,
    SegmentSummary,
};

use chrono::{DateTime, Utc};
use tracing::info;

use crate::config::RfmConfig;
use crate::source::{AnalyticsSource, SourceError};

/// Fetch the customer-activity extract and segment it.
///
/// Data-access failures propagate as `Err`; every computation-level problem
/// is reported through [`RfmReport::error`] instead.
pub async fn run(
    source: &dyn AnalyticsSource,
    config: &RfmConfig,
    now: DateTime<Utc>,
) -> Result<RfmReport, SourceError> {
    let rows = source.customer_activity(now, config.lookback_days).await?;
    let report = compute(&rows, config, now);
    info!(
        event_name = "rfm.completed",
        customers = report.rows.len(),
        segments = report.summary.len(),
        degraded = report.error.is_some(),
    );
    Ok(report)
}
