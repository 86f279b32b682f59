//! Station registry
//!
//! Stations are plain value structs held in an id-indexed registry. All
//! cross-references between analytics components are station-id lookups —
//! there is no shared-ownership entity graph.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The two cities of the corridor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum City {
    Chengdu,
    Chongqing,
}

impl City {
    pub fn name(&self) -> &'static str {
        match self {
            City::Chengdu => "Chengdu",
            City::Chongqing => "Chongqing",
        }
    }
}

/// A station on the corridor — only the attributes the analytics consume
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Station {
    pub id: String,
    pub name: String,
    pub city: City,
    pub platform_count: u32,
    pub is_transfer: bool,
}

impl Station {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        city: City,
        platform_count: u32,
        is_transfer: bool,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            city,
            platform_count,
            is_transfer,
        }
    }
}

/// Id-indexed station repository
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StationRegistry {
    stations: HashMap<String, Station>,
    /// Insertion order, so analyses over "all stations" are deterministic
    order: Vec<String>,
}

impl StationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a station
    pub fn insert(&mut self, station: Station) {
        if !self.stations.contains_key(&station.id) {
            self.order.push(station.id.clone());
        }
        self.stations.insert(station.id.clone(), station);
    }

    pub fn get(&self, id: &str) -> Option<&Station> {
        self.stations.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.stations.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// Stations in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Station> {
        self.order.iter().filter_map(|id| self.stations.get(id))
    }

    /// Station ids in insertion order
    pub fn ids(&self) -> Vec<String> {
        self.order.clone()
    }
}
