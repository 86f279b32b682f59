//! Forecast accuracy metrics
//!
//! MAPE, MAE, RMSE and R² between an actual and a predicted series.
//! Zero-actual points are excluded from MAPE rather than treated as
//! infinite error; R² of a constant actual series is defined as 0.

use crate::error::{RailflowError, Result};
use serde::{Deserialize, Serialize};

fn check_lengths(actual: &[f64], predicted: &[f64]) -> Result<()> {
    if actual.len() != predicted.len() {
        return Err(RailflowError::ShapeError(format!(
            "actual has {} points, predicted has {}",
            actual.len(),
            predicted.len()
        )));
    }
    if actual.is_empty() {
        return Err(RailflowError::InvalidArgument(
            "accuracy metrics require at least one point".to_string(),
        ));
    }
    Ok(())
}

/// Mean Absolute Percentage Error, in percent.
///
/// Points with actual == 0 are skipped; if every actual is zero the
/// result is 0.0.
pub fn mape(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_lengths(actual, predicted)?;

    let mut total_error = 0.0;
    let mut valid = 0usize;
    for (&a, &p) in actual.iter().zip(predicted.iter()) {
        if a != 0.0 {
            total_error += ((a - p) / a).abs();
            valid += 1;
        }
    }

    if valid == 0 {
        Ok(0.0)
    } else {
        Ok(total_error / valid as f64 * 100.0)
    }
}

/// Mean Absolute Error
pub fn mae(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_lengths(actual, predicted)?;
    let sum: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).abs())
        .sum();
    Ok(sum / actual.len() as f64)
}

/// Root Mean Squared Error
pub fn rmse(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_lengths(actual, predicted)?;
    let sum: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    Ok((sum / actual.len() as f64).sqrt())
}

/// Coefficient of determination R² = 1 − SS_res / SS_tot.
///
/// Returns 0.0 when the actual series is constant (undefined denominator).
pub fn r_squared(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_lengths(actual, predicted)?;

    let mean = actual.iter().sum::<f64>() / actual.len() as f64;
    let ss_tot: f64 = actual.iter().map(|&a| (a - mean).powi(2)).sum();
    if ss_tot == 0.0 {
        return Ok(0.0);
    }

    let ss_res: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).powi(2))
        .sum();

    Ok(1.0 - ss_res / ss_tot)
}

/// All four accuracy metrics for one actual/predicted pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccuracyReport {
    pub mape: f64,
    pub mae: f64,
    pub rmse: f64,
    pub r_squared: f64,
    pub n_points: usize,
}

impl AccuracyReport {
    pub fn compute(actual: &[f64], predicted: &[f64]) -> Result<Self> {
        Ok(Self {
            mape: mape(actual, predicted)?,
            mae: mae(actual, predicted)?,
            rmse: rmse(actual, predicted)?,
            r_squared: r_squared(actual, predicted)?,
            n_points: actual.len(),
        })
    }
}
