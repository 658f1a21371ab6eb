use crate::{Bar, ForecastError, TrainingPoint, TrainingSeries};

/// Convert a raw bar history into the two-column series the forecaster
/// expects: (date, close) only, no other transformation.
///
/// `min_observations` is the forecaster-imposed floor (seasonal terms need
/// enough history to converge); two observations is the absolute minimum
/// for the day-over-day delta elsewhere in the pipeline.
pub fn to_training_series(
    bars: &[Bar],
    min_observations: usize,
) -> Result<TrainingSeries, ForecastError> {
    if bars.len() < 2 {
        return Err(ForecastError::InsufficientData(format!(
            "need at least 2 observations, got {}",
            bars.len()
        )));
    }
    if bars.len() < min_observations {
        return Err(ForecastError::InsufficientData(format!(
            "need at least {} observations to fit, got {}",
            min_observations,
            bars.len()
        )));
    }
    let points = bars
        .iter()
        .map(|b| TrainingPoint {
            ds: b.date,
            y: b.close,
        })
        .collect();
    TrainingSeries::new(points)
}
