//! Time-series extraction from the flow store
//!
//! Builds ordered numeric series (daily or hourly) for a station. Pure
//! reads: no side effects on the store. A station with no records at all
//! yields an empty daily series (zeros for hourly); gap days within a
//! known station's history fill with 0.

use crate::flow::FlowStore;
use chrono::{Days, NaiveDate};

/// Extracts ordered time series from a [`FlowStore`]
#[derive(Debug, Clone, Copy)]
pub struct SeriesExtractor<'a> {
    store: &'a FlowStore,
}

impl<'a> SeriesExtractor<'a> {
    pub fn new(store: &'a FlowStore) -> Self {
        Self { store }
    }

    /// Daily totals for `[end_date - window_days + 1, end_date]`,
    /// oldest first. A station with no records yields an empty series;
    /// otherwise days with no records contribute 0.0, so the result has
    /// exactly `window_days` entries.
    pub fn extract_daily(
        &self,
        station_id: &str,
        window_days: usize,
        end_date: NaiveDate,
    ) -> Vec<f64> {
        if !self.store.has_station(station_id) {
            return Vec::new();
        }

        let mut series = Vec::with_capacity(window_days);
        for i in (0..window_days).rev() {
            let day = end_date
                .checked_sub_days(Days::new(i as u64))
                .unwrap_or(end_date);
            series.push(self.store.station_daily_flow(station_id, day) as f64);
        }
        series
    }

    /// Daily totals for one travel direction over the same window as
    /// [`extract_daily`](Self::extract_daily), oldest first. Empty when
    /// no record carries the direction.
    pub fn extract_directional_daily(
        &self,
        direction: crate::flow::Direction,
        window_days: usize,
        end_date: NaiveDate,
    ) -> Vec<f64> {
        if !self.store.has_direction(direction) {
            return Vec::new();
        }

        let mut series = Vec::with_capacity(window_days);
        for i in (0..window_days).rev() {
            let day = end_date
                .checked_sub_days(Days::new(i as u64))
                .unwrap_or(end_date);
            series.push(self.store.directional_flow(direction, day) as f64);
        }
        series
    }

    /// Fixed 24-entry hourly profile for one day, index = hour of day
    pub fn extract_hourly(&self, station_id: &str, date: NaiveDate) -> [f64; 24] {
        let hourly = self.store.station_hourly_flow(station_id, date);
        let mut profile = [0.0f64; 24];
        for (slot, &count) in profile.iter_mut().zip(hourly.iter()) {
            *slot = count as f64;
        }
        profile
    }
}
