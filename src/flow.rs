//! Passenger flow records and the in-memory flow store
//!
//! `FlowRecord` is an immutable per-station, per-hour fact. `FlowStore`
//! holds the record collection and answers the aggregate queries the
//! analytics engine consumes; the engine itself treats the store as
//! read-only.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Travel direction along the corridor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Chengdu → Chongqing
    ChengduToChongqing,
    /// Chongqing → Chengdu
    ChongqingToChengdu,
}

/// One boarding/alighting fact for a station, date and hour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowRecord {
    pub station_id: String,
    pub date: NaiveDate,
    /// Hour of day, 0–23
    pub hour: u8,
    pub boarding: u32,
    pub alighting: u32,
    pub train_id: Option<String>,
    pub direction: Option<Direction>,
}

impl FlowRecord {
    pub fn new(
        station_id: impl Into<String>,
        date: NaiveDate,
        hour: u8,
        boarding: u32,
        alighting: u32,
    ) -> Self {
        Self {
            station_id: station_id.into(),
            date,
            hour: hour.min(23),
            boarding,
            alighting,
            train_id: None,
            direction: None,
        }
    }

    pub fn with_train(mut self, train_id: impl Into<String>) -> Self {
        self.train_id = Some(train_id.into());
        self
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = Some(direction);
        self
    }

    /// Boarding plus alighting
    pub fn total_flow(&self) -> u32 {
        self.boarding + self.alighting
    }
}

/// Assumed seat capacity per train, used for load-factor estimates
const TRAIN_CAPACITY: u32 = 1200;

/// In-memory collection of flow records with aggregate queries.
///
/// Aggregates are recomputed over a daily index that is kept in sync on
/// every insert, so per-day queries do not rescan the full record list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlowStore {
    records: Vec<FlowRecord>,
    /// (station_id, date) → daily total flow
    daily_index: HashMap<(String, NaiveDate), u32>,
}

impl FlowStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_record(&mut self, record: FlowRecord) {
        let key = (record.station_id.clone(), record.date);
        *self.daily_index.entry(key).or_insert(0) += record.total_flow();
        self.records.push(record);
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    pub fn records(&self) -> &[FlowRecord] {
        &self.records
    }

    /// Whether any record exists for this station
    pub fn has_station(&self, station_id: &str) -> bool {
        self.daily_index.keys().any(|(id, _)| id == station_id)
    }

    /// Whether any record carries this travel direction
    pub fn has_direction(&self, direction: Direction) -> bool {
        self.records.iter().any(|r| r.direction == Some(direction))
    }

    /// Total flow for a station over all recorded history
    pub fn station_total_flow(&self, station_id: &str) -> u32 {
        self.records
            .iter()
            .filter(|r| r.station_id == station_id)
            .map(|r| r.total_flow())
            .sum()
    }

    /// Total flow for a station on one day (0 if no records)
    pub fn station_daily_flow(&self, station_id: &str, date: NaiveDate) -> u32 {
        self.daily_index
            .get(&(station_id.to_string(), date))
            .copied()
            .unwrap_or(0)
    }

    /// 24-entry hourly flow profile for a station on one day
    pub fn station_hourly_flow(&self, station_id: &str, date: NaiveDate) -> [u32; 24] {
        let mut hourly = [0u32; 24];
        for record in &self.records {
            if record.station_id == station_id && record.date == date {
                hourly[record.hour as usize] += record.total_flow();
            }
        }
        hourly
    }

    /// Total flow per station id, over all recorded history
    pub fn all_stations_flow(&self) -> HashMap<String, u32> {
        let mut totals: HashMap<String, u32> = HashMap::new();
        for record in &self.records {
            *totals.entry(record.station_id.clone()).or_insert(0) += record.total_flow();
        }
        totals
    }

    /// Station ids ranked by total flow, descending
    pub fn station_ranking(&self) -> Vec<(String, u32)> {
        let mut ranking: Vec<(String, u32)> = self.all_stations_flow().into_iter().collect();
        ranking.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranking
    }

    /// Total flow in one direction on one day
    pub fn directional_flow(&self, direction: Direction, date: NaiveDate) -> u32 {
        self.records
            .iter()
            .filter(|r| r.date == date && r.direction == Some(direction))
            .map(|r| r.total_flow())
            .sum()
    }

    /// Ratio of Chengdu→Chongqing flow to Chongqing→Chengdu flow over all
    /// history; 0.0 when the denominator is empty
    pub fn flow_ratio(&self) -> f64 {
        let mut cd_to_cq: u64 = 0;
        let mut cq_to_cd: u64 = 0;
        for record in &self.records {
            match record.direction {
                Some(Direction::ChengduToChongqing) => cd_to_cq += record.total_flow() as u64,
                Some(Direction::ChongqingToChengdu) => cq_to_cd += record.total_flow() as u64,
                None => {}
            }
        }
        if cq_to_cd == 0 {
            0.0
        } else {
            cd_to_cq as f64 / cq_to_cd as f64
        }
    }

    /// Estimated load factor (%) per train on one day: mean boarding per
    /// record relative to the assumed train capacity
    pub fn train_load_factors(&self, date: NaiveDate) -> HashMap<String, f64> {
        let mut boardings: HashMap<String, (u64, u64)> = HashMap::new();
        for record in &self.records {
            if record.date == date {
                if let Some(train_id) = &record.train_id {
                    let entry = boardings.entry(train_id.clone()).or_insert((0, 0));
                    entry.0 += record.boarding as u64;
                    entry.1 += 1;
                }
            }
        }

        boardings
            .into_iter()
            .map(|(train_id, (total, count))| {
                let factor = total as f64 / count as f64 / TRAIN_CAPACITY as f64 * 100.0;
                (train_id, factor)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_total_flow_sums_boarding_and_alighting() {
        let record = FlowRecord::new("CD001", date(2024, 12, 15), 8, 120, 80);
        assert_eq!(record.total_flow(), 200);
    }

    #[test]
    fn test_daily_flow_aggregates_hours() {
        let mut store = FlowStore::new();
        store.add_record(FlowRecord::new("CD001", date(2024, 12, 15), 8, 100, 50));
        store.add_record(FlowRecord::new("CD001", date(2024, 12, 15), 9, 200, 100));
        store.add_record(FlowRecord::new("CD001", date(2024, 12, 16), 8, 10, 10));
        store.add_record(FlowRecord::new("CQ001", date(2024, 12, 15), 8, 999, 0));

        assert_eq!(store.station_daily_flow("CD001", date(2024, 12, 15)), 450);
        assert_eq!(store.station_daily_flow("CD001", date(2024, 12, 16)), 20);
        assert_eq!(store.station_daily_flow("CD001", date(2024, 12, 17)), 0);
        assert_eq!(store.station_total_flow("CD001"), 470);
    }

    #[test]
    fn test_has_station_and_direction() {
        let mut store = FlowStore::new();
        assert!(!store.has_station("CD001"));
        assert!(!store.has_direction(Direction::ChengduToChongqing));

        store.add_record(
            FlowRecord::new("CD001", date(2024, 12, 15), 8, 100, 50)
                .with_direction(Direction::ChengduToChongqing),
        );
        assert!(store.has_station("CD001"));
        assert!(!store.has_station("CQ001"));
        assert!(store.has_direction(Direction::ChengduToChongqing));
        assert!(!store.has_direction(Direction::ChongqingToChengdu));
    }

    #[test]
    fn test_hourly_flow_profile() {
        let mut store = FlowStore::new();
        store.add_record(FlowRecord::new("CD001", date(2024, 12, 15), 8, 100, 50));
        store.add_record(FlowRecord::new("CD001", date(2024, 12, 15), 8, 10, 0));
        store.add_record(FlowRecord::new("CD001", date(2024, 12, 15), 18, 70, 30));

        let hourly = store.station_hourly_flow("CD001", date(2024, 12, 15));
        assert_eq!(hourly[8], 160);
        assert_eq!(hourly[18], 100);
        assert_eq!(hourly[0], 0);
    }

    #[test]
    fn test_directional_flow_and_ratio() {
        let mut store = FlowStore::new();
        store.add_record(
            FlowRecord::new("CD001", date(2024, 12, 15), 8, 300, 0)
                .with_direction(Direction::ChengduToChongqing),
        );
        store.add_record(
            FlowRecord::new("CQ001", date(2024, 12, 15), 9, 150, 0)
                .with_direction(Direction::ChongqingToChengdu),
        );

        assert_eq!(
            store.directional_flow(Direction::ChengduToChongqing, date(2024, 12, 15)),
            300
        );
        assert!((store.flow_ratio() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_flow_ratio_zero_denominator() {
        let mut store = FlowStore::new();
        store.add_record(
            FlowRecord::new("CD001", date(2024, 12, 15), 8, 300, 0)
                .with_direction(Direction::ChengduToChongqing),
        );
        assert_eq!(store.flow_ratio(), 0.0);
    }

    #[test]
    fn test_station_ranking_descending() {
        let mut store = FlowStore::new();
        store.add_record(FlowRecord::new("A", date(2024, 12, 15), 8, 10, 0));
        store.add_record(FlowRecord::new("B", date(2024, 12, 15), 8, 100, 0));
        store.add_record(FlowRecord::new("C", date(2024, 12, 15), 8, 50, 0));

        let ranking = store.station_ranking();
        assert_eq!(ranking[0].0, "B");
        assert_eq!(ranking[1].0, "C");
        assert_eq!(ranking[2].0, "A");
    }

    #[test]
    fn test_train_load_factors() {
        let mut store = FlowStore::new();
        store.add_record(
            FlowRecord::new("CD001", date(2024, 12, 15), 8, 600, 0).with_train("G8501"),
        );
        store.add_record(
            FlowRecord::new("CQ001", date(2024, 12, 15), 10, 600, 0).with_train("G8501"),
        );

        let factors = store.train_load_factors(date(2024, 12, 15));
        // mean boarding 600 of capacity 1200 → 50%
        assert!((factors["G8501"] - 50.0).abs() < 1e-9);
    }
}
