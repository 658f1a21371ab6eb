use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ForecastError;

/// OHLCV bar for one trading day
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// One (timestamp, value) observation the forecaster trains on
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TrainingPoint {
    pub ds: NaiveDate,
    pub y: f64,
}

/// Chronologically ordered close-price series with unique dates.
///
/// Construction validates the ordering invariant so the forecaster can
/// rely on it without re-checking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingSeries {
    points: Vec<TrainingPoint>,
}

impl TrainingSeries {
    pub fn new(points: Vec<TrainingPoint>) -> Result<Self, ForecastError> {
        for pair in points.windows(2) {
            if pair[1].ds <= pair[0].ds {
                return Err(ForecastError::InvalidData(format!(
                    "timestamps must be strictly increasing, got {} after {}",
                    pair[1].ds, pair[0].ds
                )));
            }
        }
        if let Some(bad) = points.iter().find(|p| !p.y.is_finite()) {
            return Err(ForecastError::InvalidData(format!(
                "non-finite value at {}",
                bad.ds
            )));
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[TrainingPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last(&self) -> Option<&TrainingPoint> {
        self.points.last()
    }

    /// Split off the last `test_days` observations for holdout evaluation.
    ///
    /// Returns `(train, test)`. Both halves preserve the ordering
    /// invariant, so no revalidation is needed.
    pub fn split_holdout(&self, test_days: usize) -> (TrainingSeries, &[TrainingPoint]) {
        let cut = self.points.len().saturating_sub(test_days);
        let train = TrainingSeries {
            points: self.points[..cut].to_vec(),
        };
        (train, &self.points[cut..])
    }
}

/// One forecasted observation: point estimate plus uncertainty band.
/// All three values are clamped to >= 0 by the adapter (prices cannot
/// go negative).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastRow {
    pub ds: NaiveDate,
    pub yhat: f64,
    pub yhat_lower: f64,
    pub yhat_upper: f64,
}

/// Display-only fundamentals panel data; never used in computation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Fundamentals {
    pub market_cap: Option<f64>,
    pub trailing_pe: Option<f64>,
    pub trailing_eps: Option<f64>,
    pub week_52_high: Option<f64>,
}

/// Current price card: last close against the previous session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceSnapshot {
    pub date: NaiveDate,
    pub price: f64,
    pub change: f64,
    pub change_pct: f64,
}

impl PriceSnapshot {
    /// Build from a chronological bar history (needs the last two closes).
    pub fn from_bars(bars: &[Bar]) -> Result<Self, ForecastError> {
        if bars.len() < 2 {
            return Err(ForecastError::InsufficientData(format!(
                "need at least 2 bars for a day-over-day change, got {}",
                bars.len()
            )));
        }
        let last = &bars[bars.len() - 1];
        let prev = &bars[bars.len() - 2];
        if prev.close == 0.0 {
            return Err(ForecastError::DivisionByZero(format!(
                "previous close at {} is zero",
                prev.date
            )));
        }
        let change = last.close - prev.close;
        Ok(Self {
            date: last.date,
            price: last.close,
            change,
            change_pct: change / prev.close * 100.0,
        })
    }
}
