use chrono::NaiveDate;
use forecast_core::{ForecastError, TrainingSeries};
use nalgebra::{Cholesky, DMatrix, DVector};
use statrs::statistics::Statistics;

/// Fitted piecewise-linear trend + weekly seasonality model.
///
/// The trend is a base (intercept, slope) pair plus hinge terms at evenly
/// spaced changepoints; weekly seasonality is a low-order Fourier series on
/// the day-of-week phase. Coefficients come from ridge-regularized normal
/// equations: the base trend is effectively unpenalized, hinge terms get
/// `1 / changepoint_flexibility` and seasonal terms
/// `1 / seasonality_flexibility`, so a more flexible prior shrinks less.
pub(crate) struct FittedModel {
    start: NaiveDate,
    scale_days: f64,
    changepoints: Vec<f64>,
    fourier_order: usize,
    beta: DVector<f64>,
    pub(crate) sigma: f64,
    pub(crate) n_train: usize,
}

pub(crate) struct FitOptions {
    pub n_changepoints: usize,
    pub changepoint_range: f64,
    pub changepoint_flexibility: f64,
    pub seasonality_flexibility: f64,
    pub fourier_order: usize,
}

pub(crate) fn fit(series: &TrainingSeries, opts: &FitOptions) -> Result<FittedModel, ForecastError> {
    if opts.changepoint_flexibility <= 0.0 || opts.seasonality_flexibility <= 0.0 {
        return Err(ForecastError::FitFailed(
            "flexibility parameters must be positive".to_string(),
        ));
    }

    let pts = series.points();
    let n = pts.len();
    let start = pts[0].ds;
    let scale_days = ((pts[n - 1].ds - start).num_days() as f64).max(1.0);

    // Keep the system overdetermined on short histories.
    let n_cp = opts.n_changepoints.min(n.saturating_sub(2) / 2);
    let changepoints: Vec<f64> = (1..=n_cp)
        .map(|j| opts.changepoint_range * j as f64 / (n_cp as f64 + 1.0))
        .collect();

    let p = 2 + n_cp + 2 * opts.fourier_order;
    let mut design = DMatrix::zeros(n, p);
    let mut y = DVector::zeros(n);
    for (i, pt) in pts.iter().enumerate() {
        let t_days = (pt.ds - start).num_days() as f64;
        let row = features(t_days, scale_days, &changepoints, opts.fourier_order);
        for (j, v) in row.iter().enumerate() {
            design[(i, j)] = *v;
        }
        y[i] = pt.y;
    }

    let mut normal = design.transpose() * &design;
    for j in 0..p {
        let penalty = if j < 2 {
            1e-8
        } else if j < 2 + n_cp {
            1.0 / opts.changepoint_flexibility
        } else {
            1.0 / opts.seasonality_flexibility
        };
        normal[(j, j)] += penalty;
    }
    let rhs = design.transpose() * &y;

    let chol = Cholesky::new(normal).ok_or_else(|| {
        ForecastError::FitFailed("normal equations are not positive definite".to_string())
    })?;
    let beta = chol.solve(&rhs);
    if beta.iter().any(|c| !c.is_finite()) {
        return Err(ForecastError::FitFailed(
            "regression produced non-finite coefficients".to_string(),
        ));
    }

    let fitted = &design * &beta;
    let residuals: Vec<f64> = (0..n).map(|i| y[i] - fitted[i]).collect();
    let mut sigma = residuals.as_slice().std_dev();
    if !sigma.is_finite() {
        sigma = 0.0;
    }

    Ok(FittedModel {
        start,
        scale_days,
        changepoints,
        fourier_order: opts.fourier_order,
        beta,
        sigma,
        n_train: n,
    })
}

impl FittedModel {
    pub(crate) fn predict(&self, date: NaiveDate) -> f64 {
        let t_days = (date - self.start).num_days() as f64;
        features(t_days, self.scale_days, &self.changepoints, self.fourier_order)
            .iter()
            .zip(self.beta.iter())
            .map(|(x, b)| x * b)
            .sum()
    }
}

fn features(t_days: f64, scale_days: f64, changepoints: &[f64], fourier_order: usize) -> Vec<f64> {
    let x = t_days / scale_days;
    let mut row = Vec::with_capacity(2 + changepoints.len() + 2 * fourier_order);
    row.push(1.0);
    row.push(x);
    for &cp in changepoints {
        row.push((x - cp).max(0.0));
    }
    for k in 1..=fourier_order {
        let phase = 2.0 * std::f64::consts::PI * k as f64 * t_days / 7.0;
        row.push(phase.sin());
        row.push(phase.cos());
    }
    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use forecast_core::TrainingPoint;

    fn linear_series(n: usize, start_y: f64, slope: f64) -> TrainingSeries {
        let start: NaiveDate = "2024-01-01".parse().unwrap();
        let points = (0..n)
            .map(|i| TrainingPoint {
                ds: start + Duration::days(i as i64),
                y: start_y + slope * i as f64,
            })
            .collect();
        TrainingSeries::new(points).unwrap()
    }

    fn default_opts() -> FitOptions {
        FitOptions {
            n_changepoints: 25,
            changepoint_range: 0.8,
            changepoint_flexibility: 0.5,
            seasonality_flexibility: 10.0,
            fourier_order: 3,
        }
    }

    #[test]
    fn linear_trend_is_recovered() {
        let series = linear_series(60, 100.0, 1.0);
        let model = fit(&series, &default_opts()).unwrap();
        // in-sample fit should be essentially exact for a noiseless line
        let mid: NaiveDate = "2024-01-31".parse().unwrap();
        assert!((model.predict(mid) - 130.0).abs() < 0.5);
        assert!(model.sigma < 0.5);
    }

    #[test]
    fn extrapolates_the_slope() {
        let series = linear_series(60, 100.0, 1.0);
        let model = fit(&series, &default_opts()).unwrap();
        let future: NaiveDate = "2024-03-06".parse().unwrap(); // day index 65
        assert!((model.predict(future) - 165.0).abs() < 2.0);
    }

    #[test]
    fn rejects_non_positive_flexibility() {
        let series = linear_series(40, 100.0, 1.0);
        let mut opts = default_opts();
        opts.changepoint_flexibility = 0.0;
        assert!(matches!(
            fit(&series, &opts),
            Err(ForecastError::FitFailed(_))
        ));
    }

    #[test]
    fn changepoint_count_shrinks_for_short_series() {
        // 30 points leaves room for at most 14 hinge columns
        let series = linear_series(30, 50.0, 0.5);
        let model = fit(&series, &default_opts()).unwrap();
        assert!(model.changepoints.len() <= 14);
    }
}
