use forecast_core::ForecastError;
use serde::{Deserialize, Serialize};

/// Five-level buy/sell rating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rating {
    StrongBuy,
    Buy,
    Hold,
    Sell,
    StrongSell,
}

impl Rating {
    pub fn label(&self) -> &'static str {
        match self {
            Rating::StrongBuy => "Strong Buy",
            Rating::Buy => "Buy",
            Rating::Hold => "Hold",
            Rating::Sell => "Sell",
            Rating::StrongSell => "Strong Sell",
        }
    }

    /// Display color for cards and the gauge
    pub fn color(&self) -> &'static str {
        match self {
            Rating::StrongBuy => "#00CC96",
            Rating::Buy => "#2ca02c",
            Rating::Hold => "#ffbf00",
            Rating::Sell => "#d62728",
            Rating::StrongSell => "#8c1515",
        }
    }
}

/// One classification band: matched when `change_pct > threshold`, or
/// `change_pct >= threshold` when `inclusive` is set.
#[derive(Debug, Clone, Copy)]
pub struct RatingBand {
    pub threshold: f64,
    pub inclusive: bool,
    pub rating: Rating,
}

/// Canonical threshold table, evaluated top-down; first match wins and
/// anything below the last band is `StrongSell`.
///
/// Note the mixed boundary ownership: the buy-side bands are inclusive
/// (exactly +5.0 is Buy, exactly +10.0 is Strong Buy) while the sell-side
/// bands are exclusive, so exactly -5.0 falls through Hold into Sell and
/// exactly -10.0 falls through Sell into Strong Sell. That asymmetry is
/// kept as-is; downstream consumers pin it in tests.
pub const RATING_BANDS: [RatingBand; 4] = [
    RatingBand {
        threshold: 10.0,
        inclusive: true,
        rating: Rating::StrongBuy,
    },
    RatingBand {
        threshold: 5.0,
        inclusive: true,
        rating: Rating::Buy,
    },
    RatingBand {
        threshold: -5.0,
        inclusive: false,
        rating: Rating::Hold,
    },
    RatingBand {
        threshold: -10.0,
        inclusive: false,
        rating: Rating::Sell,
    },
];

/// Everything below the last band
pub const FALLBACK_RATING: Rating = Rating::StrongSell;

/// Gauge axis range in percent, matching the dashboard dial
pub const GAUGE_AXIS: (f64, f64) = (-30.0, 30.0);

/// One colored segment of the gauge dial
#[derive(Debug, Clone, Copy, Serialize)]
pub struct GaugeStep {
    pub from: f64,
    pub to: f64,
    pub color: &'static str,
}

/// Gauge segments derived from the canonical band table, worst to best.
pub fn gauge_steps() -> Vec<GaugeStep> {
    let mut steps = Vec::with_capacity(RATING_BANDS.len() + 1);
    let mut upper = GAUGE_AXIS.1;
    for band in RATING_BANDS.iter() {
        steps.push(GaugeStep {
            from: band.threshold,
            to: upper,
            color: band.rating.color(),
        });
        upper = band.threshold;
    }
    steps.push(GaugeStep {
        from: GAUGE_AXIS.0,
        to: upper,
        color: FALLBACK_RATING.color(),
    });
    steps.reverse();
    steps
}

/// Classification output: expected percentage change and its rating
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Recommendation {
    pub change_pct: f64,
    pub rating: Rating,
}

impl Recommendation {
    pub fn label(&self) -> &'static str {
        self.rating.label()
    }

    pub fn color(&self) -> &'static str {
        self.rating.color()
    }
}

/// Map a rating onto a raw percentage change via the band table.
pub fn rate_change(change_pct: f64) -> Rating {
    for band in RATING_BANDS.iter() {
        if change_pct > band.threshold || (band.inclusive && change_pct == band.threshold) {
            return band.rating;
        }
    }
    FALLBACK_RATING
}

/// Pure classifier from (current price, predicted future price) to an
/// expected percentage change and rating. A zero current price is
/// rejected rather than silently producing infinity.
pub fn classify(current_price: f64, future_price: f64) -> Result<Recommendation, ForecastError> {
    if !current_price.is_finite() || !future_price.is_finite() {
        return Err(ForecastError::InvalidData(
            "prices must be finite".to_string(),
        ));
    }
    if current_price == 0.0 {
        return Err(ForecastError::DivisionByZero(
            "current price is zero".to_string(),
        ));
    }
    if current_price < 0.0 || future_price < 0.0 {
        return Err(ForecastError::InvalidData(
            "prices cannot be negative".to_string(),
        ));
    }
    let change_pct = (future_price - current_price) / current_price * 100.0;
    Ok(Recommendation {
        change_pct,
        rating: rate_change(change_pct),
    })
}
