//! Daily demand forecasting for a single product.
//!
//! The pipeline zero-fills and cleans the sales series, holds out a test
//! split, fits a multiplicative seasonal-trend model sized to the training
//! length, and predicts the historical window plus the requested horizon.
//! Every failure mode degrades to a result with `error` populated.

mod model;
mod series;
mod types;

pub use model::{ModelConfig, SeasonalTrendModel};
pub use series::MIN_HISTORY_DAYS;
pub use types::{
    AccuracyReport, ForecastPoint, ForecastResult, SeasonalPatterns, TrendDirection,
};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use tracing::info;

use crate::config::ForecastConfig;
use crate::domain::DailySalePoint;
use crate::source::{AnalyticsSource, SourceError};

/// Relative trend change treated as a real direction rather than noise.
const TREND_SIGNIFICANCE: f64 = 0.10;

/// Fetch the product's sales history and forecast `horizon` future days
/// (the configured default when `None`).
pub async fn run(
    source: &dyn AnalyticsSource,
    config: &ForecastConfig,
    product_id: i64,
    horizon: Option<u32>,
    now: DateTime<Utc>,
) -> Result<ForecastResult, SourceError> {
    let horizon = horizon.unwrap_or(config.horizon_days).min(config.max_horizon_days);
    let observed = source.daily_sales(product_id, now).await?;
    let result = compute(product_id, horizon, &observed, now.date_naive());
    info!(
        event_name = "forecast.completed",
        product_id,
        horizon,
        history_days = result.history_days,
        rows = result.forecast.len(),
        degraded = result.error.is_some(),
    );
    Ok(result)
}

/// Pure forecast over an already-fetched sales history.
pub fn compute(
    product_id: i64,
    horizon_days: u32,
    observed: &[DailySalePoint],
    today: NaiveDate,
) -> ForecastResult {
    if observed.is_empty() {
        return ForecastResult::degraded(
            product_id,
            horizon_days,
            format!("no sales history for product {product_id}"),
        );
    }

    let filled = series::zero_fill(observed, today);
    let prepared = match series::prepare(&filled) {
        Ok(prepared) => prepared,
        Err(err) => {
            let mut result = ForecastResult::degraded(product_id, horizon_days, err.to_string());
            result.history_days = filled.len();
            return result;
        }
    };

    let (train, test) = series::split(&prepared);
    let config = ModelConfig::for_training_len(train.len());
    let model = match SeasonalTrendModel::fit(train, config) {
        Ok(model) => model,
        Err(err) => {
            let mut result = ForecastResult::degraded(product_id, horizon_days, err.to_string());
            result.history_days = prepared.len();
            return result;
        }
    };

    // Historical window plus the future horizon; horizon 0 covers exactly
    // the historical window.
    let last = prepared[prepared.len() - 1].date;
    let forecast: Vec<ForecastPoint> = prepared
        .iter()
        .map(|p| p.date)
        .chain((1..=i64::from(horizon_days)).map(|d| last + Duration::days(d)))
        .map(|date| model.predict(date))
        .collect();

    let accuracy = accuracy(&model, test);
    let (trend_direction, recommendations) = trend_advice(&forecast);

    ForecastResult {
        product_id,
        horizon_days,
        history_days: prepared.len(),
        forecast,
        accuracy,
        seasonal: Some(model.seasonal_patterns()),
        trend_direction: Some(trend_direction),
        recommendations,
        error: None,
    }
}

/// Hold-out metrics; everything is `None` below three test days.
fn accuracy(model: &SeasonalTrendModel, test: &[DailySalePoint]) -> AccuracyReport {
    if test.len() < 3 {
        return AccuracyReport { test_days: test.len(), ..AccuracyReport::default() };
    }

    let errors: Vec<f64> =
        test.iter().map(|p| p.quantity - model.predict(p.date).yhat).collect();
    let mae = errors.iter().map(|e| e.abs()).sum::<f64>() / errors.len() as f64;
    let rmse = (errors.iter().map(|e| e * e).sum::<f64>() / errors.len() as f64).sqrt();

    let pct_terms: Vec<f64> = test
        .iter()
        .zip(&errors)
        .filter(|(p, _)| p.quantity != 0.0)
        .map(|(p, e)| (e / p.quantity).abs())
        .collect();
    let mape = if pct_terms.is_empty() {
        None
    } else {
        Some(pct_terms.iter().sum::<f64>() / pct_terms.len() as f64 * 100.0)
    };

    let actual_mean = test.iter().map(|p| p.quantity).sum::<f64>() / test.len() as f64;
    let ss_tot: f64 = test.iter().map(|p| (p.quantity - actual_mean).powi(2)).sum();
    let ss_res: f64 = errors.iter().map(|e| e * e).sum();
    // A flat test window makes R-squared undefined.
    let r_squared = (ss_tot > 1e-12).then(|| 1.0 - ss_res / ss_tot);

    AccuracyReport { mae: Some(mae), mape, rmse: Some(rmse), r_squared, test_days: test.len() }
}

fn trend_advice(forecast: &[ForecastPoint]) -> (TrendDirection, Vec<String>) {
    let first = forecast.first().map(|p| p.trend).unwrap_or(0.0);
    let last = forecast.last().map(|p| p.trend).unwrap_or(0.0);
    if first <= 0.0 {
        return (TrendDirection::Stable, Vec::new());
    }

    let change = (last - first) / first;
    if change > TREND_SIGNIFICANCE {
        (
            TrendDirection::Increasing,
            vec![format!(
                "Demand trend is up {:.0}% across the window; consider increasing stock levels",
                change * 100.0
            )],
        )
    } else if change < -TREND_SIGNIFICANCE {
        (
            TrendDirection::Decreasing,
            vec![format!(
                "Demand trend is down {:.0}% across the window; consider reducing replenishment",
                change.abs() * 100.0
            )],
        )
    } else {
        (TrendDirection::Stable, Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn day(d: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 5).unwrap() + Duration::days(d)
    }

    fn observed(days: i64, value: impl Fn(i64) -> f64) -> Vec<DailySalePoint> {
        (0..days).map(|d| DailySalePoint { date: day(d), quantity: value(d) }).collect()
    }

    #[test]
    fn horizon_zero_covers_exactly_the_historical_window() {
        let sales = observed(60, |d| 10.0 + (d % 7) as f64);
        let result = compute(1, 0, &sales, day(59));
        assert!(result.error.is_none());
        assert_eq!(result.forecast.len(), result.history_days);
        assert_eq!(result.history_days, 60);
    }

    #[test]
    fn forecast_extends_by_the_requested_horizon() {
        let sales = observed(60, |d| 10.0 + (d % 7) as f64);
        let result = compute(1, 30, &sales, day(59));
        assert_eq!(result.forecast.len(), 60 + 30);
        let last_history = result.forecast[59].date;
        assert_eq!(result.forecast[60].date, last_history + Duration::days(1));
    }

    #[test]
    fn sparse_observations_are_zero_filled_to_the_calendar() {
        // Two observations ten days apart: the series spans eleven days.
        let sales = vec![
            DailySalePoint { date: day(0), quantity: 5.0 },
            DailySalePoint { date: day(10), quantity: 8.0 },
        ];
        let result = compute(1, 0, &sales, day(10));
        assert_eq!(result.history_days, 11);
    }

    #[test]
    fn short_history_degrades_with_an_error() {
        let sales = observed(3, |_| 5.0);
        let result = compute(1, 30, &sales, day(2));
        assert!(result.error.is_some());
        assert!(result.forecast.is_empty());
        assert!(result.accuracy.mae.is_none());
    }

    #[test]
    fn empty_history_degrades_with_an_error() {
        let result = compute(42, 30, &[], day(0));
        assert!(result.error.as_deref().unwrap_or_default().contains("42"));
        assert!(result.forecast.is_empty());
    }

    #[test]
    fn accuracy_metrics_need_at_least_three_test_days() {
        // A week of history trains on everything, leaving no test split.
        let sales = observed(7, |_| 5.0);
        let result = compute(1, 0, &sales, day(6));
        assert!(result.error.is_none());
        assert!(result.accuracy.mae.is_none());
        assert!(result.accuracy.mape.is_none());
        assert!(result.accuracy.rmse.is_none());
        assert!(result.accuracy.r_squared.is_none());
        assert_eq!(result.accuracy.test_days, 0);
    }

    #[test]
    fn ten_day_series_holds_out_the_last_week() {
        let sales = observed(10, |d| 4.0 + d as f64);
        let result = compute(1, 0, &sales, day(9));
        assert!(result.error.is_none());
        assert_eq!(result.accuracy.test_days, 7);
        assert!(result.accuracy.mae.is_some());
        assert!(result.accuracy.mape.is_some());
        assert!(result.accuracy.rmse.is_some());
    }

    #[test]
    fn long_series_produces_holdout_metrics() {
        let sales = observed(100, |d| 20.0 + (d % 7) as f64);
        let result = compute(1, 0, &sales, day(99));
        assert!(result.error.is_none());
        assert_eq!(result.accuracy.test_days, 20);
        assert!(result.accuracy.mae.is_some());
        assert!(result.accuracy.mape.is_some());
        assert!(result.accuracy.rmse.is_some());
        // Absolute errors: RMSE dominates MAE.
        assert!(result.accuracy.rmse.unwrap() >= result.accuracy.mae.unwrap());
        assert!(result.accuracy.mape.unwrap() >= 0.0);
    }

    #[test]
    fn rising_demand_yields_an_increase_recommendation() {
        let sales = observed(60, |d| 10.0 + d as f64);
        let result = compute(1, 30, &sales, day(59));
        assert_eq!(result.trend_direction, Some(TrendDirection::Increasing));
        assert!(!result.recommendations.is_empty());
    }

    #[test]
    fn falling_demand_yields_a_reduce_recommendation() {
        let sales = observed(60, |d| (80.0 - d as f64).max(5.0));
        let result = compute(1, 30, &sales, day(59));
        assert_eq!(result.trend_direction, Some(TrendDirection::Decreasing));
        assert!(!result.recommendations.is_empty());
    }

    #[test]
    fn flat_demand_is_stable_with_no_recommendation() {
        let sales = observed(60, |d| 10.0 + (d % 2) as f64);
        let result = compute(1, 30, &sales, day(59));
        assert_eq!(result.trend_direction, Some(TrendDirection::Stable));
        assert!(result.recommendations.is_empty());
    }
}
