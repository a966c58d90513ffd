//! Flight input and airport reference data
//!
//! This module holds the flight records a run consumes and the lookups that turn a
//! parking position into a walking distance and a terminal.
//!
//! # Overview
//!
//! - **Flight**: an arriving flight with block-in time, parking position and pax counts
//! - **AirportLookup**: walking-distance, terminal and aircraft-type lookups
//! - **StaticAirportLookup**: table-driven lookup carrying the reference airport data
//!
//! # Usage Example
//!
//! ```rust
//! use ees_border_sim::flight::*;
//! use chrono::{TimeZone, Utc};
//!
//! let lookup = StaticAirportLookup::standard();
//! let block_in = Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap();
//! let flight = Flight::new("LH100", block_in, "05A", "A320");
//!
//! assert_eq!(flight.resolved_pax(&lookup), 174);
//! assert_eq!(lookup.walking_distance_m("05A"), Ok(110.0));
//! ```

pub mod flight;
pub mod lookup;

// Re-export all public types for convenience
pub use flight::Flight;
pub use lookup::{AirportLookup, LookupError, StaticAirportLookup, GENERIC_DEFAULT_PAX};
