//! Multi-method passenger-flow forecasting
//!
//! One entry point per method plus a fixed-weight ensemble, all
//! dispatched through [`ForecastMethod`]. Methods share a contract:
//! prediction/upper/lower sequences of exactly the requested horizon,
//! empty sequences for empty history, and a held-out MAPE whenever
//! history extends beyond the 10-point holdout window.

mod heuristic;
mod methods;

pub use heuristic::{project_directional_flow, project_station_flow};

use crate::error::{RailflowError, Result};
use crate::flow::{Direction, FlowStore};
use crate::metrics;
use crate::series::SeriesExtractor;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default smoothing factor for exponential smoothing
pub const DEFAULT_ALPHA: f64 = 0.3;
/// Default seasonal period (weekly cycle)
pub const DEFAULT_SEASON_PERIOD: usize = 7;
/// Number of trailing points held out for the accuracy score
const ACCURACY_HOLDOUT: usize = 10;
/// Combined factor applied to the narrowest contributing band so the
/// ensemble lands on ±10%
const ENSEMBLE_BAND_SCALE: f64 = 0.10 / 0.12;

/// Forecasting method selector.
///
/// Confidence bands are fixed per-method percentages of the point
/// estimate — a design parameter, not a statistically derived interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ForecastMethod {
    /// Series mean held flat (naive baseline), band ±15%
    MovingAverage,
    /// Simple exponential smoothing, flat forecast, band ±20%
    ExponentialSmoothing { alpha: f64 },
    /// OLS of value against time index, extrapolated, band ±12%
    LinearTrend,
    /// Average by position within the cycle, band ±18%
    SeasonalDecomposition { period: usize },
    /// Simplified differencing + moving-average stand-in for ARIMA,
    /// band ±15%. Not a real ARIMA fit; q is accepted but unused.
    PseudoArima { p: usize, d: usize, q: usize },
    /// Fixed convex combination of the other methods, band ±10%
    Ensemble,
}

impl ForecastMethod {
    /// Human-readable method name for reports
    pub fn name(&self) -> String {
        match self {
            ForecastMethod::MovingAverage => "MovingAverage".to_string(),
            ForecastMethod::ExponentialSmoothing { alpha } => {
                format!("ExponentialSmoothing(alpha={alpha:.2})")
            }
            ForecastMethod::LinearTrend => "LinearTrend".to_string(),
            ForecastMethod::SeasonalDecomposition { period } => {
                format!("SeasonalDecomposition(period={period})")
            }
            ForecastMethod::PseudoArima { p, d, q } => format!("PseudoARIMA({p},{d},{q})"),
            ForecastMethod::Ensemble => "Ensemble".to_string(),
        }
    }

    /// Half-width of the confidence band as a fraction of the estimate
    pub fn band_fraction(&self) -> f64 {
        match self {
            ForecastMethod::MovingAverage => 0.15,
            ForecastMethod::ExponentialSmoothing { .. } => 0.20,
            ForecastMethod::LinearTrend => 0.12,
            ForecastMethod::SeasonalDecomposition { .. } => 0.18,
            ForecastMethod::PseudoArima { .. } => 0.15,
            ForecastMethod::Ensemble => {
                let narrowest = ensemble_members()
                    .iter()
                    .map(|(m, _)| m.band_fraction())
                    .fold(f64::MAX, f64::min);
                narrowest * ENSEMBLE_BAND_SCALE
            }
        }
    }

    fn validate(&self) -> Result<()> {
        match self {
            ForecastMethod::ExponentialSmoothing { alpha } => {
                if !(*alpha > 0.0 && *alpha <= 1.0) {
                    return Err(RailflowError::InvalidArgument(format!(
                        "smoothing factor alpha must be in (0, 1], got {alpha}"
                    )));
                }
            }
            ForecastMethod::SeasonalDecomposition { period } => {
                if *period == 0 {
                    return Err(RailflowError::InvalidArgument(
                        "seasonal period must be at least 1".to_string(),
                    ));
                }
            }
            _ => {}
        }
        Ok(())
    }
}

/// Fixed ensemble members and their convex weights (sum to 1; the
/// historically better-performing methods carry more weight)
fn ensemble_members() -> [(ForecastMethod, f64); 4] {
    [
        (ForecastMethod::PseudoArima { p: 7, d: 1, q: 0 }, 0.30),
        (
            ForecastMethod::ExponentialSmoothing {
                alpha: DEFAULT_ALPHA,
            },
            0.25,
        ),
        (
            ForecastMethod::SeasonalDecomposition {
                period: DEFAULT_SEASON_PERIOD,
            },
            0.25,
        ),
        (ForecastMethod::LinearTrend, 0.20),
    ]
}

/// A forecast for one station: point predictions with confidence bounds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastResult {
    pub method: String,
    pub predictions: Vec<f64>,
    pub upper_bound: Vec<f64>,
    pub lower_bound: Vec<f64>,
    /// Held-out MAPE over the trailing 10 points; None when history does
    /// not extend beyond the holdout window
    pub accuracy_mape: Option<f64>,
}

impl ForecastResult {
    fn empty(method: &ForecastMethod) -> Self {
        Self {
            method: method.name(),
            predictions: Vec::new(),
            upper_bound: Vec::new(),
            lower_bound: Vec::new(),
            accuracy_mape: None,
        }
    }
}

/// Held-out MAPE: the method is re-run on the history preceding the
/// trailing 10 points and its forecasts are scored against those actuals,
/// so the held-out points never influence the forecast being scored.
fn holdout_accuracy(series: &[f64], method: &ForecastMethod) -> Option<f64> {
    if series.len() <= ACCURACY_HOLDOUT {
        return None;
    }
    let (train, holdout) = series.split_at(series.len() - ACCURACY_HOLDOUT);
    let predicted = run_method(train, ACCURACY_HOLDOUT, method);
    if predicted.len() != holdout.len() {
        return None;
    }
    metrics::mape(holdout, &predicted).ok()
}

fn run_method(series: &[f64], horizon: usize, method: &ForecastMethod) -> Vec<f64> {
    match method {
        ForecastMethod::MovingAverage => methods::moving_average(series, horizon),
        ForecastMethod::ExponentialSmoothing { alpha } => {
            methods::exponential_smoothing(series, horizon, *alpha)
        }
        ForecastMethod::LinearTrend => methods::linear_trend(series, horizon),
        ForecastMethod::SeasonalDecomposition { period } => {
            methods::seasonal_decomposition(series, horizon, *period)
        }
        ForecastMethod::PseudoArima { p, d, .. } => methods::pseudo_arima(series, horizon, *p, *d),
        ForecastMethod::Ensemble => ensemble(series, horizon),
    }
}

/// Weighted pointwise combination of the ensemble members
fn ensemble(series: &[f64], horizon: usize) -> Vec<f64> {
    let outputs: Vec<(Vec<f64>, f64)> = ensemble_members()
        .iter()
        .map(|(method, weight)| (run_method(series, horizon, method), *weight))
        .collect();

    if outputs.iter().any(|(predictions, _)| predictions.is_empty()) && horizon > 0 {
        return Vec::new();
    }

    (0..horizon)
        .map(|i| {
            outputs
                .iter()
                .map(|(predictions, weight)| weight * predictions[i])
                .sum()
        })
        .collect()
}

/// Forecast directly from an oldest-first series.
///
/// Empty history yields empty prediction/bound sequences; horizon 0
/// yields empty sequences with the accuracy still computed when the
/// history allows it.
pub fn forecast_series(
    series: &[f64],
    horizon: usize,
    method: ForecastMethod,
) -> Result<ForecastResult> {
    method.validate()?;
    debug!(method = %method.name(), horizon, points = series.len(), "running forecast");

    if series.is_empty() {
        return Ok(ForecastResult::empty(&method));
    }

    let predictions = run_method(series, horizon, &method);
    let fraction = method.band_fraction();

    let upper_bound = predictions.iter().map(|&p| p * (1.0 + fraction)).collect();
    let lower_bound = predictions.iter().map(|&p| p * (1.0 - fraction)).collect();

    Ok(ForecastResult {
        method: method.name(),
        accuracy_mape: holdout_accuracy(series, &method),
        predictions,
        upper_bound,
        lower_bound,
    })
}

/// Held-out accuracy per method plus the best performer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodComparison {
    pub entries: Vec<(String, Option<f64>)>,
    /// Method with the lowest held-out MAPE, when any method has one
    pub best_method: Option<String>,
}

/// Store-backed forecasting façade: pulls station history through the
/// series extractor and runs the requested method
#[derive(Debug, Clone, Copy)]
pub struct Forecaster<'a> {
    store: &'a FlowStore,
    end_date: NaiveDate,
    history_window: usize,
}

impl<'a> Forecaster<'a> {
    /// Default history window, in days
    pub const DEFAULT_WINDOW: usize = 30;

    pub fn new(store: &'a FlowStore, end_date: NaiveDate) -> Self {
        Self {
            store,
            end_date,
            history_window: Self::DEFAULT_WINDOW,
        }
    }

    pub fn with_history_window(mut self, window_days: usize) -> Self {
        self.history_window = window_days;
        self
    }

    fn station_history(&self, station_id: &str) -> Vec<f64> {
        SeriesExtractor::new(self.store).extract_daily(
            station_id,
            self.history_window,
            self.end_date,
        )
    }

    /// N-day-ahead forecast for one station
    pub fn predict(
        &self,
        station_id: &str,
        horizon: usize,
        method: ForecastMethod,
    ) -> Result<ForecastResult> {
        forecast_series(&self.station_history(station_id), horizon, method)
    }

    /// Run every non-ensemble method and rank them by held-out MAPE
    pub fn compare_methods(&self, station_id: &str, horizon: usize) -> Result<MethodComparison> {
        let series = self.station_history(station_id);
        let candidates = [
            ForecastMethod::PseudoArima { p: 7, d: 1, q: 0 },
            ForecastMethod::ExponentialSmoothing {
                alpha: DEFAULT_ALPHA,
            },
            ForecastMethod::SeasonalDecomposition {
                period: DEFAULT_SEASON_PERIOD,
            },
            ForecastMethod::LinearTrend,
            ForecastMethod::MovingAverage,
        ];

        let mut entries = Vec::with_capacity(candidates.len());
        for method in candidates {
            let result = forecast_series(&series, horizon, method)?;
            entries.push((result.method, result.accuracy_mape));
        }

        let best_method = entries
            .iter()
            .filter_map(|(name, mape)| mape.map(|m| (name.clone(), m)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(name, _)| name);

        Ok(MethodComparison {
            entries,
            best_method,
        })
    }

    /// Seeded heuristic projection of a station's daily flow
    pub fn project_station(&self, station_id: &str, days: usize, seed: u64) -> Vec<u32> {
        project_station_flow(&self.station_history(station_id), days, seed)
    }

    /// Seeded heuristic projection of directional corridor flow
    pub fn project_directional(&self, direction: Direction, days: usize, seed: u64) -> Vec<u32> {
        let history = SeriesExtractor::new(self.store).extract_directional_daily(
            direction,
            self.history_window,
            self.end_date,
        );
        project_directional_flow(&history, days, direction, seed)
    }
}
