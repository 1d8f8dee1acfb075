//! Multiplicative seasonal-trend model.
//!
//! A least-squares linear trend carries the level; normalized seasonal
//! indices (day-of-week, month-of-year, day-of-month) and a holiday factor
//! scale it multiplicatively. Prediction intervals come from the training
//! residual deviation and widen with distance past the training window.

use chrono::{Datelike, NaiveDate};

use crate::domain::DailySalePoint;
use crate::errors::ComputationError;
use crate::stats::{inverse_normal_cdf, mean, sample_std_dev};

use super::types::{ForecastPoint, SeasonalPatterns};

/// Feature policy derived once from the training length and passed opaquely
/// to the fit. Sub-daily seasonality is always off: the series is daily.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ModelConfig {
    pub weekly: bool,
    pub yearly: bool,
    pub monthly: bool,
    pub holidays: bool,
    pub interval_width: f64,
}

impl ModelConfig {
    pub fn for_training_len(n: usize) -> Self {
        Self {
            weekly: n >= 14,
            yearly: n >= 365,
            monthly: n >= 60,
            holidays: n >= 90,
            interval_width: 0.95,
        }
    }
}

/// Fixed-date retail holidays (month, day). Close enough for a demand
/// factor; movable feasts are deliberately out.
const HOLIDAYS: [(u32, u32); 8] = [
    (1, 1),
    (2, 14),
    (7, 4),
    (10, 31),
    (11, 27),
    (12, 24),
    (12, 25),
    (12, 31),
];

fn is_holiday(date: NaiveDate) -> bool {
    HOLIDAYS.contains(&(date.month(), date.day()))
}

#[derive(Clone, Debug)]
pub struct SeasonalTrendModel {
    config: ModelConfig,
    origin: NaiveDate,
    last_train: NaiveDate,
    intercept: f64,
    slope: f64,
    weekly: [f64; 7],
    yearly: [f64; 12],
    monthly: [f64; 31],
    holiday_factor: f64,
    residual_std: f64,
    z: f64,
}

impl SeasonalTrendModel {
    pub fn fit(train: &[DailySalePoint], config: ModelConfig) -> Result<Self, ComputationError> {
        if train.is_empty() {
            return Err(ComputationError::ModelFit("empty training series".to_string()));
        }

        let origin = train[0].date;
        let last_train = train[train.len() - 1].date;
        let ts: Vec<f64> = train.iter().map(|p| (p.date - origin).num_days() as f64).collect();
        let ys: Vec<f64> = train.iter().map(|p| p.quantity).collect();
        let (intercept, slope) = least_squares(&ts, &ys);

        // Detrended multiplicative ratios; a non-positive trend value falls
        // back to the series mean so ratios stay finite.
        let y_mean = mean(&ys);
        if y_mean <= 0.0 {
            return Err(ComputationError::ModelFit(
                "training series has no positive level".to_string(),
            ));
        }
        let ratios: Vec<f64> = train
            .iter()
            .zip(&ts)
            .map(|(p, t)| {
                let trend = intercept + slope * t;
                let denom = if trend > 0.0 { trend } else { y_mean };
                p.quantity / denom
            })
            .collect();

        let weekly = if config.weekly {
            normalized_indices(train, &ratios, |d| d.weekday().num_days_from_monday() as usize)
        } else {
            [1.0; 7]
        };
        let yearly = if config.yearly {
            normalized_indices(train, &ratios, |d| d.month0() as usize)
        } else {
            [1.0; 12]
        };
        let monthly = if config.monthly {
            normalized_indices(train, &ratios, |d| d.day0() as usize)
        } else {
            [1.0; 31]
        };

        let holiday_factor = if config.holidays {
            let holiday_ratios: Vec<f64> = train
                .iter()
                .zip(&ratios)
                .filter(|(p, _)| is_holiday(p.date))
                .map(|(_, r)| *r)
                .collect();
            if holiday_ratios.is_empty() { 1.0 } else { mean(&holiday_ratios).max(0.0) }
        } else {
            1.0
        };

        let mut model = Self {
            config,
            origin,
            last_train,
            intercept,
            slope,
            weekly,
            yearly,
            monthly,
            holiday_factor,
            residual_std: 0.0,
            z: inverse_normal_cdf(0.5 + config.interval_width / 2.0),
        };

        let residuals: Vec<f64> =
            train.iter().map(|p| p.quantity - model.point_estimate(p.date)).collect();
        model.residual_std = sample_std_dev(&residuals);

        Ok(model)
    }

    fn trend_at(&self, date: NaiveDate) -> f64 {
        let t = (date - self.origin).num_days() as f64;
        (self.intercept + self.slope * t).max(0.0)
    }

    fn seasonal_factor(&self, date: NaiveDate) -> f64 {
        let mut factor = 1.0;
        if self.config.weekly {
            factor *= self.weekly[date.weekday().num_days_from_monday() as usize];
        }
        if self.config.yearly {
            factor *= self.yearly[date.month0() as usize];
        }
        if self.config.monthly {
            factor *= self.monthly[date.day0() as usize];
        }
        if self.config.holidays && is_holiday(date) {
            factor *= self.holiday_factor;
        }
        factor
    }

    fn point_estimate(&self, date: NaiveDate) -> f64 {
        (self.trend_at(date) * self.seasonal_factor(date)).max(0.0)
    }

    /// Full forecast row for one date. Intervals widen with the square root
    /// of the distance past the training window; historical dates get the
    /// base residual width.
    pub fn predict(&self, date: NaiveDate) -> ForecastPoint {
        let yhat = self.point_estimate(date);
        let days_out = (date - self.last_train).num_days().max(0) as f64;
        let width = self.z * self.residual_std * (1.0 + days_out).sqrt();
        ForecastPoint {
            date,
            yhat,
            yhat_lower: (yhat - width).max(0.0),
            yhat_upper: yhat + width,
            trend: self.trend_at(date),
        }
    }

    pub fn seasonal_patterns(&self) -> SeasonalPatterns {
        SeasonalPatterns {
            by_day_of_week: self.weekly,
            by_month: self.yearly,
            by_day_of_month: self.config.monthly.then(|| self.monthly.to_vec()),
        }
    }
}

fn least_squares(ts: &[f64], ys: &[f64]) -> (f64, f64) {
    let t_mean = mean(ts);
    let y_mean = mean(ys);
    let denom: f64 = ts.iter().map(|t| (t - t_mean).powi(2)).sum();
    if denom == 0.0 {
        return (y_mean, 0.0);
    }
    let numer: f64 = ts.iter().zip(ys).map(|(t, y)| (t - t_mean) * (y - y_mean)).sum();
    let slope = numer / denom;
    (y_mean - slope * t_mean, slope)
}

/// Mean detrended ratio per bucket, normalized so the occupied buckets
/// average 1.0. Unoccupied buckets stay at 1.0.
fn normalized_indices<const N: usize>(
    train: &[DailySalePoint],
    ratios: &[f64],
    key: impl Fn(NaiveDate) -> usize,
) -> [f64; N] {
    let mut sums = [0.0; N];
    let mut counts = [0usize; N];
    for (point, ratio) in train.iter().zip(ratios) {
        let bucket = key(point.date);
        sums[bucket] += ratio;
        counts[bucket] += 1;
    }

    let mut indices = [1.0; N];
    let occupied: Vec<usize> = (0..N).filter(|i| counts[*i] > 0).collect();
    if occupied.is_empty() {
        return indices;
    }
    for &i in &occupied {
        indices[i] = sums[i] / counts[i] as f64;
    }
    let norm = occupied.iter().map(|&i| indices[i]).sum::<f64>() / occupied.len() as f64;
    if norm > 0.0 {
        for &i in &occupied {
            indices[i] /= norm;
        }
    }
    indices
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn day(d: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap() + Duration::days(d)
    }

    fn series(values: impl IntoIterator<Item = f64>) -> Vec<DailySalePoint> {
        values
            .into_iter()
            .enumerate()
            .map(|(d, quantity)| DailySalePoint { date: day(d as i64), quantity })
            .collect()
    }

    #[test]
    fn feature_policy_follows_training_length() {
        let short = ModelConfig::for_training_len(10);
        assert!(!short.weekly && !short.monthly && !short.holidays && !short.yearly);

        let medium = ModelConfig::for_training_len(90);
        assert!(medium.weekly && medium.monthly && medium.holidays && !medium.yearly);

        let long = ModelConfig::for_training_len(400);
        assert!(long.yearly);
        assert_eq!(long.interval_width, 0.95);
    }

    #[test]
    fn linear_growth_is_recovered_by_the_trend() {
        let train = series((0..30).map(|d| 10.0 + 2.0 * d as f64));
        let config = ModelConfig { weekly: false, ..ModelConfig::for_training_len(30) };
        let model = SeasonalTrendModel::fit(&train, config).unwrap();
        let next = model.predict(day(30));
        assert!((next.yhat - 70.0).abs() < 1.0);
        assert!((next.trend - 70.0).abs() < 1.0);
    }

    #[test]
    fn weekly_seasonality_is_recovered() {
        // Flat level 10 with a weekend spike on Saturday (day 5 from the
        // Monday origin).
        let train = series((0..28).map(|d| if d % 7 == 5 { 20.0 } else { 10.0 }));
        let model =
            SeasonalTrendModel::fit(&train, ModelConfig::for_training_len(28)).unwrap();
        let saturday = model.predict(day(33));
        let tuesday = model.predict(day(29));
        assert!(saturday.yhat > tuesday.yhat * 1.5);
    }

    #[test]
    fn intervals_widen_with_the_future_horizon() {
        let train = series((0..40).map(|d| 10.0 + (d % 5) as f64));
        let model =
            SeasonalTrendModel::fit(&train, ModelConfig::for_training_len(40)).unwrap();
        let near = model.predict(day(41));
        let far = model.predict(day(60));
        assert!(far.yhat_upper - far.yhat_lower > near.yhat_upper - near.yhat_lower);
        // Historical dates keep the base width.
        let historical = model.predict(day(10));
        assert!(historical.yhat_upper >= historical.yhat_lower);
    }

    #[test]
    fn predictions_never_go_negative() {
        // Steeply declining series pushes the raw trend below zero.
        let train = series((0..20).map(|d| (50.0 - 5.0 * d as f64).max(1.0)));
        let model =
            SeasonalTrendModel::fit(&train, ModelConfig::for_training_len(20)).unwrap();
        let far = model.predict(day(60));
        assert!(far.yhat >= 0.0);
        assert!(far.yhat_lower >= 0.0);
    }

    #[test]
    fn all_zero_training_series_is_rejected() {
        let train = series(std::iter::repeat(0.0).take(20));
        assert!(SeasonalTrendModel::fit(&train, ModelConfig::for_training_len(20)).is_err());
    }

    #[test]
    fn seasonal_patterns_report_fitted_components_only() {
        let train = series((0..70).map(|d| 10.0 + (d % 7) as f64));
        let model =
            SeasonalTrendModel::fit(&train, ModelConfig::for_training_len(70)).unwrap();
        let patterns = model.seasonal_patterns();
        assert!(patterns.by_day_of_month.is_some());
        // Yearly needs a full year of history; indices stay neutral.
        assert!(patterns.by_month.iter().all(|i| *i == 1.0));
    }
}
