mod cache;

pub use cache::{CacheKey, HistoryCache};

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use backtest_evaluator::{backtest, BacktestConfig, BacktestReport};
use forecast_core::{
    to_training_series, Bar, ForecastRow, Forecaster, Fundamentals, HistoryProvider,
    PriceSnapshot,
};
use recommendation_engine::{classify, Recommendation};
use serde::Serialize;
use tracing::{debug, info, warn};
use trend_model::{TrendForecaster, TrendModelConfig};

/// Pipeline settings for one dashboard request
#[derive(Debug, Clone, Serialize)]
pub struct OrchestratorConfig {
    /// Future periods to forecast (the dashboard offers 30/60/90/180).
    pub horizon_days: u32,
    /// Restrict future dates to Mon-Fri, matching exchange calendars.
    pub business_days_only: bool,
    /// Future rows surfaced in the "upcoming" table.
    pub upcoming_rows: usize,
    /// Market tag used in the history cache key.
    pub market: String,
    pub model: TrendModelConfig,
    pub backtest: BacktestConfig,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            horizon_days: 60,
            business_days_only: true,
            upcoming_rows: 10,
            market: "US".to_string(),
            model: TrendModelConfig::default(),
            backtest: BacktestConfig::default(),
        }
    }
}

/// Everything the presentation layer renders for one symbol: the price
/// card, the forecast chart rows, the gauge recommendation, the upcoming
/// table slice, the backtest score, and the fundamentals panel.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardAnalysis {
    pub symbol: String,
    pub snapshot: PriceSnapshot,
    pub recommendation: Recommendation,
    pub target_price: f64,
    pub horizon_days: u32,
    pub forecast: Vec<ForecastRow>,
    pub upcoming: Vec<ForecastRow>,
    pub backtest: BacktestReport,
    pub fundamentals: Option<Fundamentals>,
}

/// Runs the single synchronous fetch -> normalize -> forecast ->
/// classify -> backtest cycle per user input. No state is shared between
/// requests beyond the history cache.
pub struct DashboardOrchestrator<P: HistoryProvider> {
    provider: P,
    forecaster: TrendForecaster,
    config: OrchestratorConfig,
    history_cache: HistoryCache,
}

impl<P: HistoryProvider> DashboardOrchestrator<P> {
    pub fn new(provider: P) -> Self {
        Self::with_config(provider, OrchestratorConfig::default())
    }

    pub fn with_config(provider: P, config: OrchestratorConfig) -> Self {
        let forecaster = TrendForecaster::with_config(config.model.clone());
        Self {
            provider,
            forecaster,
            config,
            history_cache: HistoryCache::new(),
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Drop the cached history for a symbol so the next request refetches.
    pub fn invalidate_history(&self, symbol: &str) {
        self.history_cache
            .invalidate(&CacheKey::new(symbol, &self.config.market));
    }

    pub async fn analyze(&self, symbol: &str) -> Result<DashboardAnalysis> {
        let key = CacheKey::new(symbol, &self.config.market);
        let symbol = key.symbol.clone();
        info!(%symbol, horizon = self.config.horizon_days, "dashboard analysis requested");

        let bars = self.fetch_history(&key).await?;
        if bars.is_empty() {
            bail!("no price history found for '{symbol}'");
        }

        let snapshot = PriceSnapshot::from_bars(&bars)?;
        let series = to_training_series(&bars, self.config.model.min_observations)?;

        let forecast = self.forecaster.fit_predict(
            &series,
            self.config.horizon_days,
            self.config.business_days_only,
        )?;
        let target_price = forecast
            .last()
            .map(|row| row.yhat)
            .context("forecast produced no rows")?;
        let recommendation = classify(snapshot.price, target_price)?;
        debug!(
            %symbol,
            target_price,
            change_pct = recommendation.change_pct,
            rating = recommendation.label(),
            "forecast classified"
        );

        let last_observed = snapshot.date;
        let upcoming: Vec<ForecastRow> = forecast
            .iter()
            .filter(|row| row.ds > last_observed)
            .take(self.config.upcoming_rows)
            .cloned()
            .collect();

        let backtest = backtest(&self.forecaster, &series, &self.config.backtest)?;
        if backtest.matched_rows < backtest.requested_days {
            debug!(
                %symbol,
                matched = backtest.matched_rows,
                requested = backtest.requested_days,
                "backtest window shrank at unmatched dates"
            );
        }

        let fundamentals = match self.provider.fundamentals(&symbol).await {
            Ok(f) => f,
            Err(err) => {
                // display-only panel; the analysis stands without it
                warn!(%symbol, %err, "fundamentals unavailable");
                None
            }
        };

        Ok(DashboardAnalysis {
            symbol,
            snapshot,
            recommendation,
            target_price,
            horizon_days: self.config.horizon_days,
            forecast,
            upcoming,
            backtest,
            fundamentals,
        })
    }

    async fn fetch_history(&self, key: &CacheKey) -> Result<Arc<Vec<Bar>>> {
        if let Some(bars) = self.history_cache.get(key) {
            debug!(symbol = %key.symbol, "history cache hit");
            return Ok(bars);
        }
        let bars = self
            .provider
            .price_history(&key.symbol)
            .await
            .with_context(|| format!("fetching history for '{}'", key.symbol))?;
        Ok(self.history_cache.insert(key.clone(), bars))
    }
}
