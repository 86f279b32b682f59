//! Day-level flow anomaly detection
//!
//! Flags days whose flow deviates from the trailing-window mean by more
//! than 2 population standard deviations. Needs at least 3 points;
//! shorter windows produce no flags.

use crate::flow::FlowStore;
use crate::series::SeriesExtractor;
use crate::station::StationRegistry;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Deviation multiple that marks a day as anomalous
pub const ANOMALY_SIGMA: f64 = 2.0;
/// Minimum points needed before flagging anything
const MIN_POINTS: usize = 3;
/// Default trailing window, in days
pub const DEFAULT_WINDOW_DAYS: usize = 7;

/// One anomalous day in a station's series
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyFlag {
    pub station_id: String,
    /// Index into the trailing window (0 = oldest day of the window)
    pub day_index: usize,
    /// Observed daily flow
    pub value: f64,
    /// Trailing-window mean
    pub mean: f64,
    /// Trailing-window population standard deviation
    pub stddev: f64,
}

/// Network-wide anomaly scan result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyScan {
    pub flags: Vec<AnomalyFlag>,
    /// Flags per station-day examined, as a percentage
    pub anomaly_rate: f64,
}

fn mean_and_stddev(series: &[f64]) -> (f64, f64) {
    let n = series.len() as f64;
    let mean = series.iter().sum::<f64>() / n;
    let variance = series.iter().map(|&v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

/// Flag indices of `series` deviating more than 2σ from the series mean
pub fn detect_in_series(station_id: &str, series: &[f64]) -> Vec<AnomalyFlag> {
    if series.len() < MIN_POINTS {
        return Vec::new();
    }

    let (mean, stddev) = mean_and_stddev(series);
    series
        .iter()
        .enumerate()
        .filter(|(_, &value)| (value - mean).abs() > ANOMALY_SIGMA * stddev)
        .map(|(day_index, &value)| AnomalyFlag {
            station_id: station_id.to_string(),
            day_index,
            value,
            mean,
            stddev,
        })
        .collect()
}

/// Store-backed anomaly detector over trailing daily windows
#[derive(Debug, Clone, Copy)]
pub struct AnomalyDetector<'a> {
    store: &'a FlowStore,
    end_date: NaiveDate,
}

impl<'a> AnomalyDetector<'a> {
    pub fn new(store: &'a FlowStore, end_date: NaiveDate) -> Self {
        Self { store, end_date }
    }

    /// Anomalous days for one station over the trailing window
    pub fn detect_anomalies(&self, station_id: &str, window_days: usize) -> Vec<AnomalyFlag> {
        let series =
            SeriesExtractor::new(self.store).extract_daily(station_id, window_days, self.end_date);
        detect_in_series(station_id, &series)
    }

    /// Scan every registered station over the default trailing week
    pub fn scan_all(&self, registry: &StationRegistry) -> AnomalyScan {
        let mut flags = Vec::new();
        for station in registry.iter() {
            flags.extend(self.detect_anomalies(&station.id, DEFAULT_WINDOW_DAYS));
        }

        let examined = registry.len() * DEFAULT_WINDOW_DAYS;
        let anomaly_rate = if examined == 0 {
            0.0
        } else {
            flags.len() as f64 / examined as f64 * 100.0
        };

        AnomalyScan {
            flags,
            anomaly_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::FlowRecord;
    use crate::station::{City, Station};
    use chrono::Days;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_constant_series_has_no_flags() {
        let series = vec![100.0; 7];
        assert!(detect_in_series("S", &series).is_empty());
    }

    #[test]
    fn test_single_spike_is_flagged_exactly_once() {
        // Low-variance base with one value far above mean + 2σ
        let mut series = vec![100.0, 101.0, 99.0, 100.0, 101.0, 99.0];
        series.push(200.0);

        let flags = detect_in_series("S", &series);
        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].day_index, 6);
        assert_eq!(flags[0].value, 200.0);
        assert!((flags[0].value - flags[0].mean).abs() > 2.0 * flags[0].stddev);
    }

    #[test]
    fn test_fewer_than_three_points_no_flags() {
        assert!(detect_in_series("S", &[1.0, 1000.0]).is_empty());
        assert!(detect_in_series("S", &[]).is_empty());
    }

    #[test]
    fn test_store_backed_detection() {
        let end = date(2024, 12, 15);
        let mut store = FlowStore::new();
        let totals = [100u32, 101, 99, 100, 101, 99, 400];
        for (i, &flow) in totals.iter().enumerate() {
            let day = end.checked_sub_days(Days::new((6 - i) as u64)).unwrap();
            store.add_record(FlowRecord::new("CD001", day, 8, flow, 0));
        }

        let detector = AnomalyDetector::new(&store, end);
        let flags = detector.detect_anomalies("CD001", 7);
        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].day_index, 6);
    }

    #[test]
    fn test_scan_all_reports_rate() {
        let end = date(2024, 12, 15);
        let mut registry = StationRegistry::new();
        registry.insert(Station::new("A", "A", City::Chengdu, 2, false));
        registry.insert(Station::new("B", "B", City::Chongqing, 2, false));

        let mut store = FlowStore::new();
        let spiky = [100u32, 101, 99, 100, 101, 99, 500];
        for (i, &flow) in spiky.iter().enumerate() {
            let day = end.checked_sub_days(Days::new((6 - i) as u64)).unwrap();
            store.add_record(FlowRecord::new("A", day, 8, flow, 0));
            store.add_record(FlowRecord::new("B", day, 8, 100, 0));
        }

        let scan = AnomalyDetector::new(&store, end).scan_all(&registry);
        assert_eq!(scan.flags.len(), 1);
        // 1 flag over 2 stations × 7 days
        assert!((scan.anomaly_rate - 100.0 / 14.0).abs() < 1e-9);
    }
}
