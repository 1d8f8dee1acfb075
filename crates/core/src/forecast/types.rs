//! Types for the demand forecasting engine

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One forecast row, covering a historical or future date.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub yhat: f64,
    pub yhat_lower: f64,
    pub yhat_upper: f64,
    /// Trend component alone, without seasonal or holiday effects.
    pub trend: f64,
}

/// Hold-out accuracy. Every metric is `None` when the test split is shorter
/// than three days; MAPE is additionally `None` when every test actual is
/// zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AccuracyReport {
    pub mae: Option<f64>,
    pub mape: Option<f64>,
    pub rmse: Option<f64>,
    pub r_squared: Option<f64>,
    pub test_days: usize,
}

/// Mean multiplicative effect per calendar bucket, extracted from the
/// fitted model. An index of 1.0 means no deviation from trend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SeasonalPatterns {
    /// Monday-first day-of-week effects.
    pub by_day_of_week: [f64; 7],
    /// January-first month-of-year effects.
    pub by_month: [f64; 12],
    /// Day-of-month effects, present only when the monthly component was
    /// fitted.
    pub by_day_of_month: Option<Vec<f64>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
}

/// Complete forecast result. Computation failures at any stage populate
/// `error` and leave `forecast` empty.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub product_id: i64,
    pub horizon_days: u32,
    /// Length of the prepared historical series.
    pub history_days: usize,
    pub forecast: Vec<ForecastPoint>,
    pub accuracy: AccuracyReport,
    pub seasonal: Option<SeasonalPatterns>,
    pub trend_direction: Option<TrendDirection>,
    pub recommendations: Vec<String>,
    pub error: Option<String>,
}

impl ForecastResult {
    pub(crate) fn degraded(product_id: i64, horizon_days: u32, message: String) -> Self {
        Self {
            product_id,
            horizon_days,
            history_days: 0,
            forecast: Vec::new(),
            accuracy: AccuracyReport::default(),
            seasonal: None,
            trend_direction: None,
            recommendations: Vec::new(),
            error: Some(message),
        }
    }
}
