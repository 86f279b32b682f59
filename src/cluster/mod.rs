//! Station clustering
//!
//! Groups stations by feature vectors extracted from the flow store:
//! aggregate statistics, 24-hour flow profiles, or 7-day weekly
//! profiles. The partition comes from k-means nearest-centroid
//! assignment and the quality score is the real silhouette coefficient.

mod kmeans;

pub use kmeans::{silhouette_score, KMeans, KMeansFit};

use crate::error::{RailflowError, Result};
use crate::flow::FlowStore;
use crate::series::SeriesExtractor;
use crate::station::StationRegistry;
use chrono::NaiveDate;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Which feature vector to cluster stations on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StationFeatures {
    /// [total flow, platform count, transfer flag]
    Aggregate,
    /// 24-entry hourly flow profile for one day
    HourlyProfile,
    /// 7-entry daily flow profile for the trailing week
    WeeklyProfile,
}

/// Result of clustering stations into k groups
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterResult {
    /// Station ids per cluster index; every station appears exactly once
    pub groups: Vec<Vec<String>>,
    /// One centroid (in feature space) per cluster index
    pub centroids: Vec<Vec<f64>>,
    /// Mean silhouette coefficient of the partition
    pub silhouette: f64,
    /// Which features the partition was computed on
    pub features: StationFeatures,
}

/// Station clustering over a registry and flow store
#[derive(Debug, Clone, Copy)]
pub struct ClusterEngine<'a> {
    store: &'a FlowStore,
    registry: &'a StationRegistry,
    reference_date: NaiveDate,
    max_iter: usize,
    seed: u64,
}

impl<'a> ClusterEngine<'a> {
    pub fn new(store: &'a FlowStore, registry: &'a StationRegistry, reference_date: NaiveDate) -> Self {
        Self {
            store,
            registry,
            reference_date,
            max_iter: 100,
            seed: 42,
        }
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Feature matrix for all registered stations, in registry order
    fn feature_matrix(&self, features: StationFeatures) -> (Vec<String>, Array2<f64>) {
        let extractor = SeriesExtractor::new(self.store);
        let ids = self.registry.ids();

        let rows: Vec<Vec<f64>> = self
            .registry
            .iter()
            .map(|station| match features {
                StationFeatures::Aggregate => vec![
                    self.store.station_total_flow(&station.id) as f64,
                    station.platform_count as f64,
                    if station.is_transfer { 1.0 } else { 0.0 },
                ],
                StationFeatures::HourlyProfile => extractor
                    .extract_hourly(&station.id, self.reference_date)
                    .to_vec(),
                StationFeatures::WeeklyProfile => {
                    extractor.extract_daily(&station.id, 7, self.reference_date)
                }
            })
            .collect();

        // A station with no records yields an empty daily series; pad
        // short rows with zeros so the matrix stays rectangular
        let dim = rows.iter().map(|r| r.len()).max().unwrap_or(0);
        let mut matrix = Array2::zeros((rows.len(), dim));
        for (i, row) in rows.iter().enumerate() {
            for (j, &value) in row.iter().enumerate() {
                matrix[[i, j]] = value;
            }
        }
        (ids, matrix)
    }

    /// Partition all registered stations into k groups.
    ///
    /// Fails fast when k = 0, k exceeds the station count, or the
    /// registry is empty.
    pub fn cluster(&self, features: StationFeatures, k: usize) -> Result<ClusterResult> {
        if self.registry.is_empty() {
            return Err(RailflowError::DataError(
                "no stations registered for clustering".to_string(),
            ));
        }

        let (ids, matrix) = self.feature_matrix(features);
        let fit = KMeans::new(k)
            .with_max_iter(self.max_iter)
            .with_seed(self.seed)
            .fit(&matrix)?;

        let mut groups = vec![Vec::new(); k];
        for (id, &label) in ids.iter().zip(fit.labels.iter()) {
            groups[label].push(id.clone());
        }

        let centroids = (0..k)
            .map(|c| fit.centroids.row(c).to_vec())
            .collect();

        Ok(ClusterResult {
            silhouette: silhouette_score(&matrix, &fit.labels, k),
            groups,
            centroids,
            features,
        })
    }
}
