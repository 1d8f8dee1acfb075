//! Series construction and cleaning ahead of the model fit.

use chrono::{Duration, NaiveDate};

use crate::domain::DailySalePoint;
use crate::errors::ComputationError;
use crate::stats::iqr_fence;

/// Minimum prepared-series length for a model fit.
pub const MIN_HISTORY_DAYS: usize = 7;

/// Fallback window when a product has no recorded sales before `today`.
const DEFAULT_WINDOW_DAYS: i64 = 365;

/// Zero-fill every calendar day from the earliest observed sale (or 365
/// days back when nothing was observed) through `today`, inclusive.
pub fn zero_fill(observed: &[DailySalePoint], today: NaiveDate) -> Vec<DailySalePoint> {
    let start = observed
        .iter()
        .map(|p| p.date)
        .min()
        .unwrap_or_else(|| today - Duration::days(DEFAULT_WINDOW_DAYS));

    let mut series = Vec::new();
    let mut date = start;
    while date <= today {
        let quantity = observed
            .iter()
            .filter(|p| p.date == date)
            .map(|p| p.quantity)
            .sum::<f64>();
        series.push(DailySalePoint { date, quantity });
        date += Duration::days(1);
    }
    series
}

/// Clean the series for a multiplicative fit: replace zero days with 10% of
/// the smallest positive observation (a multiplicative model cannot carry
/// true zeros), then clip outliers to the IQR fence.
pub fn prepare(series: &[DailySalePoint]) -> Result<Vec<DailySalePoint>, ComputationError> {
    if series.len() < MIN_HISTORY_DAYS {
        return Err(ComputationError::InsufficientData(format!(
            "need at least {MIN_HISTORY_DAYS} days of history, got {}",
            series.len()
        )));
    }

    let min_positive = series
        .iter()
        .map(|p| p.quantity)
        .filter(|q| *q > 0.0)
        .fold(f64::INFINITY, f64::min);
    if !min_positive.is_finite() {
        return Err(ComputationError::InsufficientData(
            "series has no positive sales to model".to_string(),
        ));
    }
    let zero_replacement = 0.1 * min_positive;

    let replaced: Vec<f64> = series
        .iter()
        .map(|p| if p.quantity > 0.0 { p.quantity } else { zero_replacement })
        .collect();
    let (low, high) = iqr_fence(&replaced);

    Ok(series
        .iter()
        .zip(replaced)
        .map(|(point, quantity)| DailySalePoint {
            date: point.date,
            quantity: quantity.clamp(low, high),
        })
        .collect())
}

/// Chronological train/test split. The nominal split is 80/20; when that
/// leaves fewer than 14 training days, the last 7 days become the test set
/// whenever more than 7 days exist, otherwise everything trains and the
/// test set is empty. The training set is never empty.
pub fn split(series: &[DailySalePoint]) -> (&[DailySalePoint], &[DailySalePoint]) {
    let n = series.len();
    let mut train_len = (n as f64 * 0.8) as usize;
    if train_len < 14 {
        train_len = if n > 7 { n - 7 } else { n };
    }
    series.split_at(train_len.min(n))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 1).unwrap() + Duration::days(d)
    }

    fn point(d: i64, quantity: f64) -> DailySalePoint {
        DailySalePoint { date: day(d), quantity }
    }

    #[test]
    fn zero_fill_covers_every_calendar_day() {
        let observed = vec![point(0, 3.0), point(4, 5.0)];
        let series = zero_fill(&observed, day(6));
        assert_eq!(series.len(), 7);
        assert_eq!(series[0].quantity, 3.0);
        assert_eq!(series[1].quantity, 0.0);
        assert_eq!(series[4].quantity, 5.0);
        assert_eq!(series[6].quantity, 0.0);
    }

    #[test]
    fn zero_fill_without_observations_spans_a_year() {
        let series = zero_fill(&[], day(0));
        assert_eq!(series.len(), 366);
        assert!(series.iter().all(|p| p.quantity == 0.0));
    }

    #[test]
    fn prepare_replaces_zeros_with_a_tenth_of_the_smallest_positive() {
        let series: Vec<DailySalePoint> =
            (0..10).map(|d| point(d, if d % 2 == 0 { 0.0 } else { 4.0 })).collect();
        let prepared = prepare(&series).unwrap();
        assert!(prepared.iter().all(|p| p.quantity > 0.0));
        assert!((prepared[0].quantity - 0.4).abs() < 1e-12);
        assert_eq!(prepared[1].quantity, 4.0);
    }

    #[test]
    fn prepare_clips_outliers_to_the_iqr_fence() {
        let mut series: Vec<DailySalePoint> = (0..20).map(|d| point(d, 10.0 + (d % 3) as f64)).collect();
        series.push(point(20, 500.0));
        let prepared = prepare(&series).unwrap();
        let max = prepared.iter().map(|p| p.quantity).fold(f64::NEG_INFINITY, f64::max);
        assert!(max < 500.0);
    }

    #[test]
    fn prepare_rejects_short_series() {
        let series: Vec<DailySalePoint> = (0..5).map(|d| point(d, 2.0)).collect();
        assert!(matches!(prepare(&series), Err(ComputationError::InsufficientData(_))));
    }

    #[test]
    fn prepare_rejects_all_zero_series() {
        let series: Vec<DailySalePoint> = (0..10).map(|d| point(d, 0.0)).collect();
        assert!(matches!(prepare(&series), Err(ComputationError::InsufficientData(_))));
    }

    #[test]
    fn split_is_eighty_twenty_for_long_series() {
        let series: Vec<DailySalePoint> = (0..100).map(|d| point(d, 1.0)).collect();
        let (train, test) = split(&series);
        assert_eq!(train.len(), 80);
        assert_eq!(test.len(), 20);
        assert!(train.last().unwrap().date < test[0].date);
    }

    #[test]
    fn short_series_reserves_a_week_for_test() {
        let series: Vec<DailySalePoint> = (0..16).map(|d| point(d, 1.0)).collect();
        let (train, test) = split(&series);
        assert_eq!(train.len(), 9);
        assert_eq!(test.len(), 7);
    }

    #[test]
    fn anything_past_a_week_still_reserves_the_last_week() {
        let series: Vec<DailySalePoint> = (0..8).map(|d| point(d, 1.0)).collect();
        let (train, test) = split(&series);
        assert_eq!(train.len(), 1);
        assert_eq!(test.len(), 7);
        assert_eq!(test[0].date, day(1));
    }

    #[test]
    fn week_long_series_trains_on_everything() {
        let series: Vec<DailySalePoint> = (0..7).map(|d| point(d, 1.0)).collect();
        let (train, test) = split(&series);
        assert_eq!(train.len(), 7);
        assert!(test.is_empty());
    }
}
