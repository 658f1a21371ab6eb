use async_trait::async_trait;

use crate::{Bar, ForecastError, ForecastRow, Fundamentals, TrainingSeries};

/// Pluggable forecasting engine.
///
/// Fits on the given series and predicts over the union of the training
/// dates and `horizon_days` future periods. The backtest evaluator refits
/// through this seam, so implementations must be stateless across calls.
pub trait Forecaster: Send + Sync {
    fn fit_predict(
        &self,
        series: &TrainingSeries,
        horizon_days: u32,
        business_days_only: bool,
    ) -> Result<Vec<ForecastRow>, ForecastError>;
}

/// External data-retrieval collaborator.
///
/// Implementations live outside the core (HTTP clients, fixtures); the
/// orchestrator only sees this trait. History is expected chronological,
/// one bar per trading day, over the provider's lookback window.
#[async_trait]
pub trait HistoryProvider: Send + Sync {
    async fn price_history(&self, symbol: &str) -> Result<Vec<Bar>, ForecastError>;

    async fn fundamentals(&self, symbol: &str) -> Result<Option<Fundamentals>, ForecastError>;
}
