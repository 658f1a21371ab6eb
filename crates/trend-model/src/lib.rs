mod calendar;
mod model;

pub use calendar::future_dates;

use forecast_core::{ForecastError, ForecastRow, Forecaster, TrainingSeries};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Forecaster hyperparameters.
///
/// `changepoint_flexibility` defaults above a smooth prior on purpose: the
/// fitted trend should bend at recent regime shifts rather than average
/// them away. Tune it down for slow-moving asset classes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendModelConfig {
    /// Inverse ridge penalty on the changepoint hinge terms.
    pub changepoint_flexibility: f64,
    /// Inverse ridge penalty on the weekly seasonal terms.
    pub seasonality_flexibility: f64,
    /// Candidate changepoints, evenly spaced over `changepoint_range`.
    pub n_changepoints: usize,
    /// Fraction of the history that may contain changepoints.
    pub changepoint_range: f64,
    /// Fourier order for weekly seasonality; 0 disables it. There is no
    /// intra-day term: the input is one sample per trading day.
    pub weekly_fourier_order: usize,
    /// z-score for the uncertainty band (1.28 is an ~80% interval).
    pub interval_z: f64,
    /// Minimum observations required before fitting.
    pub min_observations: usize,
}

impl Default for TrendModelConfig {
    fn default() -> Self {
        Self {
            changepoint_flexibility: 0.5,
            seasonality_flexibility: 10.0,
            n_changepoints: 25,
            changepoint_range: 0.8,
            weekly_fourier_order: 3,
            interval_z: 1.28,
            min_observations: 30,
        }
    }
}

/// Forecast Adapter: fits the trend model and emits one row per training
/// date plus one per future period, with every output clamped to >= 0.
pub struct TrendForecaster {
    config: TrendModelConfig,
}

impl TrendForecaster {
    pub fn new() -> Self {
        Self::with_config(TrendModelConfig::default())
    }

    pub fn with_config(config: TrendModelConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrendModelConfig {
        &self.config
    }
}

impl Default for TrendForecaster {
    fn default() -> Self {
        Self::new()
    }
}

impl Forecaster for TrendForecaster {
    fn fit_predict(
        &self,
        series: &TrainingSeries,
        horizon_days: u32,
        business_days_only: bool,
    ) -> Result<Vec<ForecastRow>, ForecastError> {
        if horizon_days == 0 {
            return Err(ForecastError::InvalidData(
                "horizon must be a positive number of periods".to_string(),
            ));
        }
        if series.len() < self.config.min_observations {
            return Err(ForecastError::InsufficientData(format!(
                "need at least {} observations to fit, got {}",
                self.config.min_observations,
                series.len()
            )));
        }

        let opts = model::FitOptions {
            n_changepoints: self.config.n_changepoints,
            changepoint_range: self.config.changepoint_range,
            changepoint_flexibility: self.config.changepoint_flexibility,
            seasonality_flexibility: self.config.seasonality_flexibility,
            fourier_order: self.config.weekly_fourier_order,
        };
        let fitted = model::fit(series, &opts)?;
        debug!(
            observations = series.len(),
            sigma = fitted.sigma,
            horizon = horizon_days,
            business_days_only,
            "trend model fitted"
        );

        let n = fitted.n_train as f64;
        let band = |steps_ahead: usize| {
            // widen mildly with distance from the training window
            self.config.interval_z * fitted.sigma * (1.0 + steps_ahead as f64 / n).sqrt()
        };
        let row = |ds, steps_ahead: usize| {
            let yhat = fitted.predict(ds);
            let half = band(steps_ahead);
            // prices cannot be negative; clamp after the regression
            ForecastRow {
                ds,
                yhat: yhat.max(0.0),
                yhat_lower: (yhat - half).max(0.0),
                yhat_upper: (yhat + half).max(0.0),
            }
        };

        let mut rows: Vec<ForecastRow> = series
            .points()
            .iter()
            .map(|pt| row(pt.ds, 0))
            .collect();
        let last = series
            .last()
            .map(|pt| pt.ds)
            .ok_or_else(|| ForecastError::InsufficientData("empty series".to_string()))?;
        for (i, ds) in future_dates(last, horizon_days, business_days_only)
            .into_iter()
            .enumerate()
        {
            rows.push(row(ds, i + 1));
        }
        Ok(rows)
    }
}
