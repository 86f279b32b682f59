//! Per-method forecasting primitives
//!
//! Each method takes an oldest-first series and a horizon and produces
//! point predictions. All methods degrade to whatever sub-window of
//! history is available; an empty series yields an empty forecast.

fn mean(series: &[f64]) -> f64 {
    if series.is_empty() {
        0.0
    } else {
        series.iter().sum::<f64>() / series.len() as f64
    }
}

/// Naive baseline: the series mean, repeated across the horizon
pub(crate) fn moving_average(series: &[f64], horizon: usize) -> Vec<f64> {
    if series.is_empty() {
        return Vec::new();
    }
    vec![mean(series); horizon]
}

/// Simple exponential smoothing: S[0] = x[0],
/// S[i] = α·x[i] + (1−α)·S[i−1]; flat forecast at the final level.
pub(crate) fn exponential_smoothing(series: &[f64], horizon: usize, alpha: f64) -> Vec<f64> {
    if series.is_empty() {
        return Vec::new();
    }

    let alpha = alpha.clamp(0.0, 1.0);
    let mut level = series[0];
    for &value in &series[1..] {
        level = alpha * value + (1.0 - alpha) * level;
    }
    vec![level; horizon]
}

/// Ordinary least squares of value against time index; the forecast
/// extrapolates the fitted line past the end of the series.
pub(crate) fn linear_trend(series: &[f64], horizon: usize) -> Vec<f64> {
    if series.is_empty() {
        return Vec::new();
    }

    let n = series.len() as f64;
    let mean_x = (series.len() - 1) as f64 / 2.0;
    let mean_y = mean(series);

    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for (i, &y) in series.iter().enumerate() {
        let dx = i as f64 - mean_x;
        numerator += dx * (y - mean_y);
        denominator += dx * dx;
    }

    let slope = if denominator != 0.0 {
        numerator / denominator
    } else {
        0.0
    };
    let intercept = mean_y - slope * mean_x;

    (0..horizon)
        .map(|i| slope * (n + i as f64) + intercept)
        .collect()
}

/// Seasonal averaging: the forecast for step i is the historical mean of
/// all values at position `i mod period`. A period longer than the series
/// is clamped to the series length.
pub(crate) fn seasonal_decomposition(series: &[f64], horizon: usize, period: usize) -> Vec<f64> {
    if series.is_empty() || period == 0 {
        return Vec::new();
    }

    let period = period.min(series.len());
    let mut sums = vec![0.0; period];
    let mut counts = vec![0usize; period];
    for (i, &value) in series.iter().enumerate() {
        sums[i % period] += value;
        counts[i % period] += 1;
    }

    let pattern: Vec<f64> = sums
        .iter()
        .zip(counts.iter())
        .map(|(&s, &c)| if c > 0 { s / c as f64 } else { 0.0 })
        .collect();

    // Forecast for step i reuses the seasonal average at position i mod P
    (0..horizon).map(|i| pattern[i % period]).collect()
}

/// Simplified ARIMA(p,d,q) stand-in, not a real ARIMA fit: apply d-th
/// order differencing, smooth the differenced series with a trailing
/// moving average of window p, and hold `last raw value + last smoothed
/// difference` flat across the horizon. The q parameter is accepted for
/// signature compatibility but the moving-average-of-errors term is not
/// modeled.
pub(crate) fn pseudo_arima(series: &[f64], horizon: usize, p: usize, d: usize) -> Vec<f64> {
    if series.is_empty() {
        return Vec::new();
    }

    let diffed = difference(series, d);
    let last_raw = *series.last().unwrap_or(&0.0);

    if diffed.is_empty() {
        // Too little history to difference: hold the last value flat
        return vec![last_raw; horizon];
    }

    let window = p.max(1).min(diffed.len());
    let smoothed = trailing_moving_average(&diffed, window);
    let last_step = *smoothed.last().unwrap_or(&0.0);
    vec![last_raw + last_step; horizon]
}

/// d-th order first differencing; each pass shortens the series by one
pub(crate) fn difference(series: &[f64], d: usize) -> Vec<f64> {
    let mut current = series.to_vec();
    for _ in 0..d {
        if current.len() <= 1 {
            return Vec::new();
        }
        current = current.windows(2).map(|w| w[1] - w[0]).collect();
    }
    current
}

/// Trailing moving average with a ramp-up at the start (shorter windows
/// near index 0), same length as the input
pub(crate) fn trailing_moving_average(series: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);
    let mut result = Vec::with_capacity(series.len());
    for i in 0..series.len() {
        let start = (i + 1).saturating_sub(window);
        let slice = &series[start..=i];
        result.push(slice.iter().sum::<f64>() / slice.len() as f64);
    }
    result
}
