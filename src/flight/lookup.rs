//! Airport reference data
//!
//! Walking distances, terminal allocation and aircraft-type passenger defaults are
//! static tables owned by the airport. The simulator consumes them through the
//! [`AirportLookup`] trait so that other airports (or tests) can plug in their own.

use crate::types::Terminal;
use std::collections::HashMap;
use thiserror::Error;

/// Passenger count used when neither flight data nor the type table know better
pub const GENERIC_DEFAULT_PAX: u32 = 100;

/// Errors raised by airport lookups
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// No walking distance is known for the parking position
    #[error("Unknown parking position: {0}")]
    UnknownPosition(String),
}

/// Pure lookups into airport reference data
pub trait AirportLookup: Send + Sync + std::fmt::Debug {
    /// Walking distance in metres from a parking position to the checkpoint
    fn walking_distance_m(&self, parking_position: &str) -> Result<f64, LookupError>;

    /// Terminal whose checkpoint handles a parking position
    fn terminal_for(&self, parking_position: &str) -> Terminal;

    /// Typical passenger count for an aircraft type
    fn default_pax(&self, aircraft_type: &str) -> Option<u32>;
}

/// Table-driven [`AirportLookup`]
#[derive(Debug, Clone, Default)]
pub struct StaticAirportLookup {
    distances_m: HashMap<String, f64>,
    t1_positions: Vec<String>,
    pax_by_type: HashMap<String, u32>,
}

const STANDARD_DISTANCES_M: [(&str, f64); 16] = [
    ("01", 165.0),
    ("01A", 200.0),
    ("01B", 165.0),
    ("02", 110.0),
    ("02A", 110.0),
    ("02B", 70.0),
    ("05", 110.0),
    ("05A", 110.0),
    ("05B", 70.0),
    ("06", 120.0),
    ("06A", 150.0),
    ("06B", 120.0),
    ("07", 240.0),
    ("07A", 240.0),
    ("07B", 220.0),
    ("08", 290.0),
];

const STANDARD_T1_POSITIONS: [&str; 6] = ["01", "01A", "01B", "02", "02A", "02B"];

const STANDARD_PAX_BY_TYPE: [(&str, u32); 41] = [
    ("A20N", 179),
    ("A21N", 221),
    ("A318", 126),
    ("A319", 144),
    ("A320", 174),
    ("A321", 203),
    ("A332", 275),
    ("A333", 291),
    ("A359", 300),
    ("AT43", 46),
    ("AT45", 48),
    ("AT75", 67),
    ("AT76", 72),
    ("B38M", 188),
    ("B39M", 170),
    ("B733", 149),
    ("B734", 169),
    ("B737", 137),
    ("B738", 185),
    ("B739", 183),
    ("B748", 364),
    ("B752", 183),
    ("B753", 272),
    ("B77L", 302),
    ("B77W", 366),
    ("B788", 254),
    ("B789", 337),
    ("BCS1", 115),
    ("BCS3", 140),
    ("CRJ9", 87),
    ("CRJX", 96),
    ("DH8D", 76),
    ("E145", 60),
    ("E170", 74),
    ("E190", 101),
    ("E195", 114),
    ("E290", 106),
    ("E295", 131),
    ("E75L", 88),
    ("E75S", 80),
    ("SB20", 58),
];

impl StaticAirportLookup {
    /// Create an empty lookup: every position unknown, everything in T2
    pub fn new() -> Self {
        Self::default()
    }

    /// Lookup carrying the reference airport's tables
    pub fn standard() -> Self {
        let mut lookup = Self::new();
        for (position, distance) in STANDARD_DISTANCES_M {
            lookup.insert_distance(position, distance);
        }
        for position in STANDARD_T1_POSITIONS {
            lookup.add_t1_position(position);
        }
        for (aircraft_type, pax) in STANDARD_PAX_BY_TYPE {
            lookup.insert_default_pax(aircraft_type, pax);
        }
        lookup
    }

    /// Register a walking distance
    pub fn insert_distance(&mut self, position: &str, distance_m: f64) {
        self.distances_m.insert(normalize_position(position), distance_m);
    }

    /// Register a position as belonging to terminal 1
    pub fn add_t1_position(&mut self, position: &str) {
        self.t1_positions.push(normalize_position(position));
    }

    /// Register a typical passenger count for an aircraft type
    pub fn insert_default_pax(&mut self, aircraft_type: &str, pax: u32) {
        self.pax_by_type.insert(aircraft_type.trim().to_uppercase(), pax);
    }
}

/// Positions are compared upper-case and without leading zeros, so "5a" and "05A" match
fn normalize_position(position: &str) -> String {
    let upper = position.trim().to_uppercase();
    let stripped = upper.trim_start_matches('0');
    if stripped.is_empty() {
        upper
    } else {
        stripped.to_string()
    }
}

impl AirportLookup for StaticAirportLookup {
    fn walking_distance_m(&self, parking_position: &str) -> Result<f64, LookupError> {
        self.distances_m
            .get(&normalize_position(parking_position))
            .copied()
            .ok_or_else(|| LookupError::UnknownPosition(parking_position.to_string()))
    }

    fn terminal_for(&self, parking_position: &str) -> Terminal {
        let key = normalize_position(parking_position);
        if self.t1_positions.contains(&key) {
            Terminal::T1
        } else {
            Terminal::T2
        }
    }

    fn default_pax(&self, aircraft_type: &str) -> Option<u32> {
        self.pax_by_type.get(&aircraft_type.trim().to_uppercase()).copied()
    }
}
