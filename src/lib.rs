//! Railflow — passenger-flow analytics engine for a two-city rail corridor
//!
//! Ingests per-station, per-hour boarding/alighting records and derives
//! analytics on top of them:
//!
//! - [`series`] - Ordered daily/hourly time-series extraction
//! - [`forecast`] - Multi-method forecasting (smoothing, trend, seasonal,
//!   simplified ARIMA) plus a fixed-weight ensemble and seeded heuristic
//!   projections
//! - [`cluster`] - K-means station clustering with silhouette scoring
//! - [`correlation`] - Pairwise Pearson correlation with strong-pair flags
//! - [`anomaly`] - Trailing-window z-score anomaly detection
//! - [`metrics`] - MAPE/MAE/RMSE/R² accuracy evaluation
//! - [`patterns`] - Peak-hour, per-city, transfer and resilience mining
//!
//! Every analysis is a pure, re-computable function of the flow history
//! in the [`flow::FlowStore`]; no model state persists across calls.
//! Insufficient data degrades to documented defaults instead of failing;
//! only caller contract violations return errors.

pub mod error;

// Domain data
pub mod flow;
pub mod station;

// Analytics
pub mod anomaly;
pub mod cluster;
pub mod correlation;
pub mod forecast;
pub mod metrics;
pub mod patterns;
pub mod series;

pub use error::{RailflowError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{RailflowError, Result};

    pub use crate::flow::{Direction, FlowRecord, FlowStore};
    pub use crate::station::{City, Station, StationRegistry};

    pub use crate::anomaly::{AnomalyDetector, AnomalyFlag, AnomalyScan};
    pub use crate::cluster::{ClusterEngine, ClusterResult, KMeans, StationFeatures};
    pub use crate::correlation::{CorrelationAnalyzer, CorrelationResult};
    pub use crate::forecast::{ForecastMethod, ForecastResult, Forecaster};
    pub use crate::metrics::AccuracyReport;
    pub use crate::patterns::PatternMiner;
    pub use crate::series::SeriesExtractor;
}
