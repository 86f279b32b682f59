//! Temporal and spatial pattern mining
//!
//! Network-level summaries over the flow store: peak-hour detection,
//! per-city distribution, transfer-station efficiency and a simple
//! network resilience index, plus capacity recommendations derived
//! from the mined numbers.

use crate::flow::FlowStore;
use crate::station::{City, StationRegistry};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Morning peak search range, inclusive
const MORNING_HOURS: std::ops::RangeInclusive<usize> = 6..=10;
/// Evening peak search range, inclusive
const EVENING_HOURS: std::ops::RangeInclusive<usize> = 17..=21;
/// Peak flow above which extra trains are recommended
const HEAVY_PEAK_FLOW: u64 = 5000;
/// Peak/valley ratio above which capacity smoothing is recommended
const HIGH_PEAK_VALLEY_RATIO: f64 = 3.0;

/// Network-wide time-of-day pattern for one date
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemporalPatterns {
    /// Total flow per hour across all stations
    pub hourly_total: [u64; 24],
    /// Busiest hour in 6–10
    pub morning_peak_hour: usize,
    pub morning_peak_flow: u64,
    /// Busiest hour in 17–21
    pub evening_peak_hour: usize,
    pub evening_peak_flow: u64,
    /// max(peak flows) / max(min hourly flow, 1)
    pub peak_valley_ratio: f64,
}

/// Per-city flow distribution over all recorded history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpatialPatterns {
    pub city_total_flow: HashMap<City, u64>,
    pub city_station_count: HashMap<City, usize>,
    pub city_average_flow: HashMap<City, f64>,
}

/// Flow per platform for each transfer station
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferEfficiency {
    /// station id → total flow / platform count
    pub per_station: HashMap<String, f64>,
}

/// How concentrated the network's flow is on a few critical stations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkResilience {
    /// 1 − critical stations / total stations
    pub resilience_index: f64,
    /// Stations carrying more than 2× the mean station flow
    pub critical_stations: Vec<String>,
    pub average_station_flow: f64,
}

/// Pattern mining over a registry and flow store
#[derive(Debug, Clone, Copy)]
pub struct PatternMiner<'a> {
    store: &'a FlowStore,
    registry: &'a StationRegistry,
}

impl<'a> PatternMiner<'a> {
    pub fn new(store: &'a FlowStore, registry: &'a StationRegistry) -> Self {
        Self { store, registry }
    }

    /// Mine the network's hourly peaks for one date
    pub fn temporal_patterns(&self, date: NaiveDate) -> TemporalPatterns {
        let mut hourly_total = [0u64; 24];
        for station in self.registry.iter() {
            let hourly = self.store.station_hourly_flow(&station.id, date);
            for (total, &count) in hourly_total.iter_mut().zip(hourly.iter()) {
                *total += count as u64;
            }
        }

        let peak_in = |range: std::ops::RangeInclusive<usize>| -> (usize, u64) {
            range
                .map(|h| (h, hourly_total[h]))
                .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))
                .unwrap_or((0, 0))
        };

        let (morning_peak_hour, morning_peak_flow) = peak_in(MORNING_HOURS);
        let (evening_peak_hour, evening_peak_flow) = peak_in(EVENING_HOURS);

        let valley = *hourly_total.iter().min().unwrap_or(&0);
        let peak_valley_ratio =
            morning_peak_flow.max(evening_peak_flow) as f64 / valley.max(1) as f64;

        TemporalPatterns {
            hourly_total,
            morning_peak_hour,
            morning_peak_flow,
            evening_peak_hour,
            evening_peak_flow,
            peak_valley_ratio,
        }
    }

    /// Per-city totals, station counts and per-station averages
    pub fn spatial_patterns(&self) -> SpatialPatterns {
        let mut city_total_flow: HashMap<City, u64> = HashMap::new();
        let mut city_station_count: HashMap<City, usize> = HashMap::new();

        for station in self.registry.iter() {
            let flow = self.store.station_total_flow(&station.id) as u64;
            *city_total_flow.entry(station.city).or_insert(0) += flow;
            *city_station_count.entry(station.city).or_insert(0) += 1;
        }

        let city_average_flow = city_total_flow
            .iter()
            .map(|(&city, &total)| {
                let count = city_station_count.get(&city).copied().unwrap_or(0);
                let average = if count > 0 {
                    total as f64 / count as f64
                } else {
                    0.0
                };
                (city, average)
            })
            .collect();

        SpatialPatterns {
            city_total_flow,
            city_station_count,
            city_average_flow,
        }
    }

    /// Flow per platform for transfer stations
    pub fn transfer_efficiency(&self) -> TransferEfficiency {
        let per_station = self
            .registry
            .iter()
            .filter(|s| s.is_transfer)
            .map(|station| {
                let flow = self.store.station_total_flow(&station.id) as f64;
                let efficiency = if station.platform_count > 0 {
                    flow / station.platform_count as f64
                } else {
                    0.0
                };
                (station.id.clone(), efficiency)
            })
            .collect();

        TransferEfficiency { per_station }
    }

    /// Resilience = 1 − share of stations carrying >2× the mean flow
    pub fn network_resilience(&self) -> NetworkResilience {
        let n = self.registry.len();
        if n == 0 {
            return NetworkResilience {
                resilience_index: 0.0,
                critical_stations: Vec::new(),
                average_station_flow: 0.0,
            };
        }

        let flows: Vec<(String, u64)> = self
            .registry
            .iter()
            .map(|s| (s.id.clone(), self.store.station_total_flow(&s.id) as u64))
            .collect();
        let total: u64 = flows.iter().map(|(_, f)| f).sum();
        let average = total as f64 / n as f64;

        let critical_stations: Vec<String> = flows
            .into_iter()
            .filter(|(_, flow)| *flow as f64 > average * 2.0)
            .map(|(id, _)| id)
            .collect();

        NetworkResilience {
            resilience_index: 1.0 - critical_stations.len() as f64 / n as f64,
            critical_stations,
            average_station_flow: average,
        }
    }

    /// Capacity advice derived from the temporal pattern for one date
    pub fn capacity_recommendations(&self, date: NaiveDate) -> Vec<String> {
        let patterns = self.temporal_patterns(date);
        let mut recommendations = Vec::new();

        if patterns.peak_valley_ratio > HIGH_PEAK_VALLEY_RATIO {
            recommendations.push(format!(
                "Peak demand is {:.0}x the off-peak level; add train frequency during peak hours.",
                patterns.peak_valley_ratio
            ));
        }
        if patterns.morning_peak_flow > HEAVY_PEAK_FLOW {
            recommendations.push(format!(
                "Heavy morning peak around {}:00; schedule extra departures in that window.",
                patterns.morning_peak_hour
            ));
        }
        if patterns.evening_peak_flow > HEAVY_PEAK_FLOW {
            recommendations.push(format!(
                "Heavy evening peak around {}:00; consider extending service hours.",
                patterns.evening_peak_hour
            ));
        }
        recommendations
            .push("Adjust headways dynamically based on observed passenger flow.".to_string());

        recommendations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::FlowRecord;
    use crate::station::Station;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn fixture() -> (FlowStore, StationRegistry, NaiveDate) {
        let day = date(2024, 12, 15);
        let mut registry = StationRegistry::new();
        registry.insert(Station::new("CD001", "Chengdu East", City::Chengdu, 8, true));
        registry.insert(Station::new("CD002", "Chengdu South", City::Chengdu, 4, false));
        registry.insert(Station::new("CQ001", "Chongqing North", City::Chongqing, 10, true));

        let mut store = FlowStore::new();
        // Morning peak at 8, evening peak at 18
        for id in ["CD001", "CD002", "CQ001"] {
            store.add_record(FlowRecord::new(id, day, 8, 3000, 1000));
            store.add_record(FlowRecord::new(id, day, 12, 300, 100));
            store.add_record(FlowRecord::new(id, day, 18, 2500, 900));
        }
        (store, registry, day)
    }

    #[test]
    fn test_temporal_peaks() {
        let (store, registry, day) = fixture();
        let miner = PatternMiner::new(&store, &registry);
        let patterns = miner.temporal_patterns(day);

        assert_eq!(patterns.morning_peak_hour, 8);
        assert_eq!(patterns.morning_peak_flow, 12000);
        assert_eq!(patterns.evening_peak_hour, 18);
        assert_eq!(patterns.evening_peak_flow, 10200);
        // valley hours have zero flow → denominator clamps to 1
        assert!((patterns.peak_valley_ratio - 12000.0).abs() < 1e-9);
    }

    #[test]
    fn test_spatial_distribution() {
        let (store, registry, _) = fixture();
        let miner = PatternMiner::new(&store, &registry);
        let spatial = miner.spatial_patterns();

        assert_eq!(spatial.city_station_count[&City::Chengdu], 2);
        assert_eq!(spatial.city_station_count[&City::Chongqing], 1);
        // each station logged 7800 total flow
        assert_eq!(spatial.city_total_flow[&City::Chengdu], 15600);
        assert!((spatial.city_average_flow[&City::Chongqing] - 7800.0).abs() < 1e-9);
    }

    #[test]
    fn test_transfer_efficiency_only_covers_transfer_stations() {
        let (store, registry, _) = fixture();
        let miner = PatternMiner::new(&store, &registry);
        let efficiency = miner.transfer_efficiency();

        assert_eq!(efficiency.per_station.len(), 2);
        assert!((efficiency.per_station["CD001"] - 7800.0 / 8.0).abs() < 1e-9);
        assert!(!efficiency.per_station.contains_key("CD002"));
    }

    #[test]
    fn test_network_resilience_balanced_network() {
        let (store, registry, _) = fixture();
        let miner = PatternMiner::new(&store, &registry);
        let resilience = miner.network_resilience();

        // all stations carry the same flow — none critical
        assert!(resilience.critical_stations.is_empty());
        assert!((resilience.resilience_index - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_network_resilience_flags_dominant_station() {
        let day = date(2024, 12, 15);
        let mut registry = StationRegistry::new();
        for id in ["A", "B", "C", "D"] {
            registry.insert(Station::new(id, id, City::Chengdu, 2, false));
        }
        let mut store = FlowStore::new();
        store.add_record(FlowRecord::new("A", day, 8, 10000, 0));
        for id in ["B", "C", "D"] {
            store.add_record(FlowRecord::new(id, day, 8, 100, 0));
        }

        let miner = PatternMiner::new(&store, &registry);
        let resilience = miner.network_resilience();
        assert_eq!(resilience.critical_stations, vec!["A".to_string()]);
        assert!((resilience.resilience_index - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_capacity_recommendations_mention_heavy_peaks() {
        let (store, registry, day) = fixture();
        let miner = PatternMiner::new(&store, &registry);
        let recommendations = miner.capacity_recommendations(day);

        assert!(recommendations.iter().any(|r| r.contains("morning peak")));
        assert!(recommendations.iter().any(|r| r.contains("evening peak")));
        // the dynamic-headway advice is always present
        assert!(recommendations.last().unwrap().contains("headways"));
    }
}
