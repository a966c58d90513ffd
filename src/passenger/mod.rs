//! Passengers, process paths and passenger generation
//!
//! This module turns flights into the individual passengers a run moves through
//! the checkpoint, and defines which stations each group has to visit.
//!
//! # Overview
//!
//! - **Passenger**: one traveller with group, EES status and checkpoint-arrival time
//! - **PassengerState**: lifecycle state tracked by the scheduler
//! - **ProcessPath / ProcessPaths**: ordered stations per group at one terminal
//! - **PassengerFactory**: deterministic expansion of flights into passengers
//!
//! # Usage Example
//!
//! ```rust
//! use ees_border_sim::flight::*;
//! use ees_border_sim::passenger::*;
//! use ees_border_sim::types::*;
//! use chrono::{TimeZone, Utc};
//!
//! let config = SimulationConfig::default();
//! let lookup = StaticAirportLookup::standard();
//! let block_in = Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap();
//! let flights = vec![Flight::new("LH100", block_in, "05", "A320").with_actual_pax(120)];
//!
//! let expansion = PassengerFactory::new(&config, &lookup).expand(&flights).unwrap();
//! assert_eq!(expansion.passengers.len(), 120);
//!
//! let paths = ProcessPaths::for_terminal(&config, Terminal::T2).unwrap();
//! assert_eq!(paths.get(PassengerGroup::TcnV).len(), 2);
//! ```

pub mod factory;
pub mod passenger;
pub mod path;

// Re-export all public types for convenience
pub use factory::{allocate_groups, spread_groups, Expansion, PassengerFactory};
pub use passenger::{Passenger, PassengerState};
pub use path::{ProcessPath, ProcessPaths};
