//! Simulation engine, capacity search and reporting
//!
//! This module contains the single-run engine, the capacity solver, metrics
//! collection and statistics, and error handling.
//!
//! # Overview
//!
//! - **Scheduler**: virtual clock plus time-ordered event queue with stable FIFO ties
//! - **Simulation**: drives every passenger through its process path on one timeline
//! - **MetricsCollector**: records visit timestamps and queue samples, yields a [`RunResult`]
//! - **RunKpis / ControlSummary**: statistics derived from a finished run
//! - **CapacitySolver**: "Passbox" search for minimal station capacities
//! - **RunProgress**: progress counters readable while a run executes
//! - **SimulationError**: error handling for simulation operations
//!
//! # Usage Example
//!
//! ```rust
//! use ees_border_sim::flight::{Flight, StaticAirportLookup};
//! use ees_border_sim::simulation::*;
//! use ees_border_sim::types::*;
//! use chrono::{TimeZone, Utc};
//!
//! let lookup = StaticAirportLookup::standard();
//! let block_in = Utc.with_ymd_and_hms(2025, 6, 1, 9, 30, 0).unwrap();
//! let flights = vec![Flight::new("FR1234", block_in, "05A", "A320").with_actual_pax(150)];
//!
//! let simulation = Simulation::new(SimulationConfig::default(), &lookup)?;
//! let result = simulation.run(&flights, None)?;
//! assert_eq!(result.passengers.len(), 150);
//!
//! let kpis = RunKpis::from_result(&result, 1800.0);
//! println!("{}", kpis);
//! # Ok::<(), SimulationError>(())
//! ```

pub mod engine;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod progress;
pub mod random;
pub mod scheduler;
pub mod solver;
pub mod statistics;

// Re-export all public types for convenience
pub use engine::*;
pub use error::*;
pub use logging::*;
pub use metrics::*;
pub use progress::*;
pub use random::*;
pub use scheduler::*;
pub use solver::*;
pub use statistics::*;
