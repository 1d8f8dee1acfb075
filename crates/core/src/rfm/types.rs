//! Types for the RFM segmentation engine

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Customer value segment, assigned from quartile scores.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Segment {
    BestCustomers,
    LoyalCustomers,
    BigSpenders,
    LostCustomers,
    RecentCustomers,
    AverageCustomers,
}

impl Segment {
    pub fn label(&self) -> &'static str {
        match self {
            Segment::BestCustomers => "Best Customers",
            Segment::LoyalCustomers => "Loyal Customers",
            Segment::BigSpenders => "Big Spenders",
            Segment::LostCustomers => "Lost Customers",
            Segment::RecentCustomers => "Recent Customers",
            Segment::AverageCustomers => "Average Customers",
        }
    }

    /// Marketing follow-ups suggested for the segment.
    pub fn recommendations(&self) -> &'static [&'static str] {
        match self {
            Segment::BestCustomers => {
                &["Brand ambassador program", "Premium loyalty rewards", "Early access to new products"]
            }
            Segment::LoyalCustomers => &["VIP treatment", "Exclusive offers", "Referral program"],
            Segment::BigSpenders => &["Upselling campaigns", "Bundle promotions"],
            Segment::LostCustomers => {
                &["Re-engagement campaigns", "Special win-back offers", "Personalized communication"]
            }
            Segment::RecentCustomers => &["Onboarding offers", "Cross-selling opportunities"],
            Segment::AverageCustomers => &["Loyalty program incentives", "Targeted promotions"],
        }
    }
}

impl std::fmt::Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Which labeling rule set assigns segments.
///
/// The two rule sets produce different boundaries for the same data and are
/// never assumed equivalent; `Precedence` is canonical.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentStrategy {
    /// Single-metric first-match precedence over (R, F, M).
    #[default]
    Precedence,
    /// Stricter composite-score rule: only {444, 434, 443, 433} are best
    /// customers, and a top recency score alone does not make a customer
    /// recent.
    Composite,
}

/// One scored customer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RfmRow {
    pub customer_id: i64,
    pub name: String,
    /// Days since most recent purchase; the lookback sentinel for
    /// customers with no purchase history.
    pub recency_days: i64,
    pub frequency: u32,
    pub monetary: Decimal,
    pub r_score: u8,
    pub f_score: u8,
    pub m_score: u8,
    /// Composite `RFM` string, e.g. `"434"`.
    pub rfm_score: String,
    pub segment: Segment,
}

/// Aggregate statistics for one segment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SegmentSummary {
    pub segment: Segment,
    pub count: usize,
    pub avg_recency_days: f64,
    pub avg_frequency: f64,
    pub avg_monetary: f64,
    pub total_monetary: Decimal,
    /// Share of the customer base, in percent.
    pub percentage: f64,
}

/// Min/mean/max spread of one metric within a segment.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricSpread {
    pub min: f64,
    pub mean: f64,
    pub max: f64,
}

/// Detailed per-segment characteristics table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SegmentCharacteristics {
    pub segment: Segment,
    pub recency: MetricSpread,
    pub frequency: MetricSpread,
    pub monetary: MetricSpread,
}

/// Complete RFM segmentation result. Always well-formed: an empty extract
/// yields empty tables, and computation problems populate `error`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct RfmReport {
    pub rows: Vec<RfmRow>,
    pub summary: Vec<SegmentSummary>,
    pub characteristics: Vec<SegmentCharacteristics>,
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::Segment;

    const ALL_SEGMENTS: [Segment; 6] = [
        Segment::BestCustomers,
        Segment::LoyalCustomers,
        Segment::BigSpenders,
        Segment::LostCustomers,
        Segment::RecentCustomers,
        Segment::AverageCustomers,
    ];

    #[test]
    fn every_segment_carries_a_label_and_follow_ups() {
        for segment in ALL_SEGMENTS {
            assert!(!segment.label().is_empty());
            assert!(!segment.recommendations().is_empty());
            assert_eq!(segment.to_string(), segment.label());
        }
    }
}
