//! Flight records consumed by a simulation run
//!
//! Flights arrive already parsed and validated. The simulator only needs the
//! block-in time, the parking position, and enough passenger-count information to
//! resolve how many people leave the aircraft.

use crate::flight::lookup::{AirportLookup, GENERIC_DEFAULT_PAX};
use crate::types::{FlightId, Terminal};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An arriving flight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flight {
    /// Identifier from the schedule (e.g. flight number plus date)
    pub id: FlightId,
    /// Block-in timestamp at the parking position
    pub block_in: DateTime<Utc>,
    /// Parking position code, e.g. "05A"
    pub parking_position: String,
    /// Passengers actually on board, if known
    #[serde(default)]
    pub actual_pax: Option<u32>,
    /// Passengers expected from booking data, if known
    #[serde(default)]
    pub expected_pax: Option<u32>,
    /// ICAO aircraft type designator, e.g. "A320"
    #[serde(default)]
    pub aircraft_type: String,
    /// Origin airport
    #[serde(default)]
    pub origin: Option<String>,
    /// Inactive flights are ignored by the simulator
    #[serde(default = "default_active")]
    pub active: bool,
    /// Terminal override; derived from the parking position when absent
    #[serde(default)]
    pub terminal: Option<Terminal>,
}

fn default_active() -> bool {
    true
}

impl Flight {
    /// Create an active flight with no passenger counts and no terminal override
    pub fn new(
        id: impl Into<String>,
        block_in: DateTime<Utc>,
        parking_position: impl Into<String>,
        aircraft_type: impl Into<String>,
    ) -> Self {
        Self {
            id: FlightId::new(id),
            block_in,
            parking_position: parking_position.into(),
            actual_pax: None,
            expected_pax: None,
            aircraft_type: aircraft_type.into(),
            origin: None,
            active: true,
            terminal: None,
        }
    }

    /// Set the actual passenger count
    pub fn with_actual_pax(mut self, pax: u32) -> Self {
        self.actual_pax = Some(pax);
        self
    }

    /// Set the expected passenger count
    pub fn with_expected_pax(mut self, pax: u32) -> Self {
        self.expected_pax = Some(pax);
        self
    }

    /// Force the flight to a terminal
    pub fn with_terminal(mut self, terminal: Terminal) -> Self {
        self.terminal = Some(terminal);
        self
    }

    /// Resolve the number of passengers to simulate
    ///
    /// Priority: actual count, expected count, aircraft-type default, then the
    /// generic default of 100.
    pub fn resolved_pax(&self, lookup: &dyn AirportLookup) -> u32 {
        self.actual_pax
            .or(self.expected_pax)
            .or_else(|| lookup.default_pax(&self.aircraft_type))
            .unwrap_or(GENERIC_DEFAULT_PAX)
    }

    /// Whether the count came from a fallback rather than flight data
    pub fn uses_fallback_pax(&self) -> bool {
        self.actual_pax.is_none() && self.expected_pax.is_none()
    }

    /// Terminal that processes this flight
    pub fn resolved_terminal(&self, lookup: &dyn AirportLookup) -> Terminal {
        self.terminal.unwrap_or_else(|| lookup.terminal_for(&self.parking_position))
    }
}
