use std::collections::HashMap;

use chrono::NaiveDate;
use forecast_core::{ForecastError, Forecaster, TrainingSeries};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use tracing::{debug, warn};

/// Holdout backtest settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestConfig {
    /// Trailing observations withheld as the test window.
    pub test_days: usize,
    /// Minimum observations that must remain for training; shorter
    /// series get the zero-score sentinel instead of an error.
    pub min_training_window: usize,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            test_days: 5,
            min_training_window: 30,
        }
    }
}

/// One held-out day with its prediction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestRow {
    pub ds: NaiveDate,
    pub actual: f64,
    pub predicted: f64,
    pub ape_pct: f64,
}

/// Backtest outcome. `accuracy_score` is 100 minus the mean absolute
/// percentage error; it can go negative and is not capped at 100.
/// `matched_rows` versus `requested_days` makes silent calendar drops
/// visible to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestReport {
    pub accuracy_score: f64,
    pub rows: Vec<BacktestRow>,
    pub matched_rows: usize,
    pub requested_days: usize,
}

impl BacktestReport {
    /// Sentinel for series too short to evaluate; callers render the
    /// score conditionally, so this path never errors.
    fn empty(requested_days: usize) -> Self {
        Self {
            accuracy_score: 0.0,
            rows: Vec::new(),
            matched_rows: 0,
            requested_days,
        }
    }
}

/// Withhold the last `test_days` observations, refit on the remainder,
/// and score the forecaster against the held-out actuals.
///
/// Forecast rows are inner-joined to actuals by date; held-out dates the
/// forecaster never produced (weekend/holiday mismatches) are dropped,
/// which can shrink the effective window below `test_days`. Fit failures
/// propagate; a short series does not.
pub fn backtest<F: Forecaster>(
    forecaster: &F,
    series: &TrainingSeries,
    config: &BacktestConfig,
) -> Result<BacktestReport, ForecastError> {
    if config.test_days == 0 {
        return Err(ForecastError::InvalidData(
            "test window must be a positive number of days".to_string(),
        ));
    }
    if series.len() < config.test_days + config.min_training_window {
        debug!(
            observations = series.len(),
            test_days = config.test_days,
            min_training_window = config.min_training_window,
            "series too short to backtest, returning sentinel"
        );
        return Ok(BacktestReport::empty(config.test_days));
    }

    let (train, test) = series.split_holdout(config.test_days);
    let forecast = forecaster.fit_predict(&train, config.test_days as u32, true)?;
    let predicted_by_date: HashMap<NaiveDate, f64> =
        forecast.into_iter().map(|r| (r.ds, r.yhat)).collect();

    let mut rows = Vec::with_capacity(test.len());
    for obs in test {
        let Some(&predicted) = predicted_by_date.get(&obs.ds) else {
            continue;
        };
        if obs.y == 0.0 {
            warn!(date = %obs.ds, "zero actual close excluded from error mean");
            continue;
        }
        let ape_pct = (obs.y - predicted).abs() / obs.y * 100.0;
        rows.push(BacktestRow {
            ds: obs.ds,
            actual: obs.y,
            predicted,
            ape_pct,
        });
    }

    if rows.is_empty() {
        return Ok(BacktestReport::empty(config.test_days));
    }

    let apes: Vec<f64> = rows.iter().map(|r| r.ape_pct).collect();
    let matched_rows = rows.len();
    Ok(BacktestReport {
        accuracy_score: 100.0 - apes.as_slice().mean(),
        rows,
        matched_rows,
        requested_days: config.test_days,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Duration, Weekday};
    use forecast_core::{ForecastRow, TrainingPoint};
    use trend_model::TrendForecaster;

    /// Weekday-only linear close series starting Mon 2024-01-01.
    fn business_series(n: usize, start_y: f64, slope: f64) -> TrainingSeries {
        let mut points = Vec::with_capacity(n);
        let mut date: NaiveDate = "2024-01-01".parse().unwrap();
        let mut i = 0usize;
        while points.len() < n {
            if !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
                points.push(TrainingPoint {
                    ds: date,
                    y: start_y + slope * i as f64,
                });
                i += 1;
            }
            date += Duration::days(1);
        }
        TrainingSeries::new(points).unwrap()
    }

    /// Forecaster stub that predicts a fixed value for every period.
    struct FlatForecaster(f64);

    impl Forecaster for FlatForecaster {
        fn fit_predict(
            &self,
            series: &TrainingSeries,
            horizon_days: u32,
            business_days_only: bool,
        ) -> Result<Vec<ForecastRow>, ForecastError> {
            let mut rows: Vec<ForecastRow> = series
                .points()
                .iter()
                .map(|p| ForecastRow {
                    ds: p.ds,
                    yhat: self.0,
                    yhat_lower: self.0,
                    yhat_upper: self.0,
                })
                .collect();
            let last = series.last().unwrap().ds;
            for ds in trend_model::future_dates(last, horizon_days, business_days_only) {
                rows.push(ForecastRow {
                    ds,
                    yhat: self.0,
                    yhat_lower: self.0,
                    yhat_upper: self.0,
                });
            }
            Ok(rows)
        }
    }

    #[test]
    fn short_series_returns_zero_score_sentinel() {
        let series = business_series(20, 100.0, 1.0);
        let report = backtest(&TrendForecaster::new(), &series, &BacktestConfig::default())
            .unwrap();
        assert_eq!(report.accuracy_score, 0.0);
        assert!(report.rows.is_empty());
        assert_eq!(report.matched_rows, 0);
        assert_eq!(report.requested_days, 5);
    }

    #[test]
    fn linear_series_scores_near_one_hundred() {
        // 40 closes rising 100..139; a linear trend is trivially fit
        let series = business_series(40, 100.0, 1.0);
        let report = backtest(&TrendForecaster::new(), &series, &BacktestConfig::default())
            .unwrap();
        assert_eq!(report.requested_days, 5);
        assert_eq!(report.matched_rows, 5);
        assert!(
            report.accuracy_score > 95.0,
            "expected near-perfect score, got {}",
            report.accuracy_score
        );
    }

    #[test]
    fn known_errors_produce_exact_score() {
        // actuals 130..134, flat prediction of 132
        let series = business_series(35, 100.0, 1.0);
        let report = backtest(&FlatForecaster(132.0), &series, &BacktestConfig::default())
            .unwrap();
        assert_eq!(report.matched_rows, 5);
        let expected_mape = (2.0 / 130.0 + 1.0 / 131.0 + 0.0 / 132.0
            + 1.0 / 133.0
            + 2.0 / 134.0)
            / 5.0
            * 100.0;
        assert!((report.accuracy_score - (100.0 - expected_mape)).abs() < 1e-9);
    }

    #[test]
    fn score_is_not_floored_at_zero() {
        // actuals around 40, prediction 200: APE far above 100%
        let series = business_series(40, 10.0, 1.0);
        let report = backtest(&FlatForecaster(200.0), &series, &BacktestConfig::default())
            .unwrap();
        assert!(report.accuracy_score < 0.0);
    }

    #[test]
    fn unmatched_holdout_dates_shrink_the_window() {
        // calendar-daily series: weekend actuals get no business-day
        // prediction and are silently dropped
        let start: NaiveDate = "2024-01-01".parse().unwrap();
        let points = (0..40)
            .map(|i| TrainingPoint {
                ds: start + Duration::days(i),
                y: 100.0 + i as f64,
            })
            .collect();
        let series = TrainingSeries::new(points).unwrap();
        let config = BacktestConfig {
            test_days: 7,
            min_training_window: 30,
        };
        let report = backtest(&FlatForecaster(100.0), &series, &config).unwrap();
        assert_eq!(report.requested_days, 7);
        assert!(report.matched_rows < 7);
        assert_eq!(report.rows.len(), report.matched_rows);
    }

    #[test]
    fn zero_actuals_are_excluded_from_the_mean() {
        let start: NaiveDate = "2024-01-01".parse().unwrap(); // Monday
        let mut points: Vec<TrainingPoint> = Vec::new();
        let mut date = start;
        while points.len() < 35 {
            if !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
                points.push(TrainingPoint { ds: date, y: 50.0 });
            }
            date += Duration::days(1);
        }
        // last held-out day trades at exactly zero
        points.last_mut().unwrap().y = 0.0;
        let series = TrainingSeries::new(points).unwrap();
        let report = backtest(&FlatForecaster(50.0), &series, &BacktestConfig::default())
            .unwrap();
        assert_eq!(report.matched_rows, 4);
        assert_eq!(report.accuracy_score, 100.0);
    }

    #[test]
    fn zero_test_days_is_rejected() {
        let series = business_series(40, 100.0, 1.0);
        let config = BacktestConfig {
            test_days: 0,
            min_training_window: 30,
        };
        assert!(matches!(
            backtest(&TrendForecaster::new(), &series, &config),
            Err(ForecastError::InvalidData(_))
        ));
    }
}
