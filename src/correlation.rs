//! Pairwise station correlation
//!
//! Pearson correlation between the daily series of every unordered
//! station pair. Pairs whose |coefficient| exceeds the strong threshold
//! are surfaced separately with a scheduling recommendation.

use crate::error::{RailflowError, Result};
use crate::flow::FlowStore;
use crate::series::SeriesExtractor;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// |coefficient| above this is considered strongly correlated
pub const STRONG_CORRELATION_THRESHOLD: f64 = 0.7;

/// Pearson correlation coefficient between two equal-length series.
///
/// Zero variance in either series yields 0.0. Mismatched or empty series
/// are a caller contract violation.
pub fn pearson(x: &[f64], y: &[f64]) -> Result<f64> {
    if x.len() != y.len() {
        return Err(RailflowError::ShapeError(format!(
            "series lengths differ: {} vs {}",
            x.len(),
            y.len()
        )));
    }
    if x.is_empty() {
        return Err(RailflowError::InvalidArgument(
            "correlation requires non-empty series".to_string(),
        ));
    }

    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let mut numerator = 0.0;
    let mut denom_x = 0.0;
    let mut denom_y = 0.0;
    for (&xi, &yi) in x.iter().zip(y.iter()) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        numerator += dx * dy;
        denom_x += dx * dx;
        denom_y += dy * dy;
    }

    let denominator = (denom_x * denom_y).sqrt();
    if denominator == 0.0 {
        Ok(0.0)
    } else {
        Ok(numerator / denominator)
    }
}

/// Correlation coefficients for all unordered station pairs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationResult {
    /// Unordered pair (lexicographically smaller id first) → coefficient
    pub matrix: HashMap<(String, String), f64>,
    /// Pairs with |coefficient| above the strong threshold
    pub strongly_correlated: Vec<(String, String)>,
    /// Operational note derived from the strong pairs
    pub recommendation: String,
}

impl CorrelationResult {
    /// Coefficient for a pair, in either order
    pub fn coefficient(&self, a: &str, b: &str) -> Option<f64> {
        let key = ordered_pair(a, b);
        self.matrix.get(&key).copied()
    }
}

fn ordered_pair(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

/// Pairwise correlation analyzer over daily station series
#[derive(Debug, Clone, Copy)]
pub struct CorrelationAnalyzer<'a> {
    store: &'a FlowStore,
    end_date: NaiveDate,
}

impl<'a> CorrelationAnalyzer<'a> {
    pub fn new(store: &'a FlowStore, end_date: NaiveDate) -> Self {
        Self { store, end_date }
    }

    /// Correlate the daily series of every unordered pair of the given
    /// stations over the trailing window. Stations with no recorded
    /// history yield empty series and are left out of the matrix.
    pub fn correlate_all_pairs(
        &self,
        station_ids: &[String],
        window_days: usize,
    ) -> Result<CorrelationResult> {
        if window_days == 0 {
            return Err(RailflowError::InvalidArgument(
                "correlation window must be at least 1 day".to_string(),
            ));
        }

        let extractor = SeriesExtractor::new(self.store);
        let series: Vec<Vec<f64>> = station_ids
            .iter()
            .map(|id| extractor.extract_daily(id, window_days, self.end_date))
            .collect();

        let mut matrix = HashMap::new();
        let mut strongly_correlated = Vec::new();

        for i in 0..station_ids.len() {
            if series[i].is_empty() {
                continue;
            }
            for j in (i + 1)..station_ids.len() {
                if series[j].is_empty() {
                    continue;
                }
                let coefficient = pearson(&series[i], &series[j])?;
                let pair = ordered_pair(&station_ids[i], &station_ids[j]);
                if coefficient.abs() > STRONG_CORRELATION_THRESHOLD {
                    strongly_correlated.push(pair.clone());
                }
                matrix.insert(pair, coefficient);
            }
        }

        let recommendation = if strongly_correlated.is_empty() {
            "Station flows are largely independent; schedules can be planned per station."
                .to_string()
        } else {
            format!(
                "Found {} strongly correlated station pair(s); coordinating train schedules \
                 across these stations may balance passenger flow.",
                strongly_correlated.len()
            )
        };

        Ok(CorrelationResult {
            matrix,
            strongly_correlated,
            recommendation,
        })
    }
}
