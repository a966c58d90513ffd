//! EES Border Checkpoint Simulator
//!
//! A discrete-event simulation of passenger flow through an airport border-control
//! checkpoint, with a capacity search that finds the minimal number of desks,
//! gates and kiosks meeting a waiting-time target.
//!
//! # Overview
//!
//! A run is a pure function from (flights, configuration, seed) to per-passenger
//! timings and per-station queue series. Passengers are generated from the flight
//! schedule, walk or ride a bus to the checkpoint and then pass the stations of
//! their group's process path in order, waiting in strict FIFO queues whenever all
//! desks of a station are busy.
//!
//! ## Key Features
//!
//! - **Deterministic Runs**: identical inputs and seed give byte-identical results
//! - **Four Passenger Groups**: Easypass, EU manual, third-country visa-exempt and visa-required
//! - **EES Registration**: unregistered third-country passengers take longer at the desk
//! - **Multi-stage Paths**: kiosk pre-enrolment followed by a manual desk
//! - **Passbox Mode**: minimal capacity search, independent or round-robin, on a worker pool
//! - **Reporting**: wait percentiles, queue peaks, service-level breach intervals, mix check
//!
//! ## Quick Start
//!
//! ```rust
//! use ees_border_sim::*;
//! use chrono::{TimeZone, Utc};
//!
//! let lookup = StaticAirportLookup::standard();
//! let block_in = Utc.with_ymd_and_hms(2025, 6, 1, 14, 5, 0).unwrap();
//! let flights = vec![Flight::new("EW582", block_in, "12", "A320").with_actual_pax(140)];
//!
//! let mut config = SimulationConfig::default();
//! config.station_mut(StationKind::Tcn).capacity = 4;
//!
//! let result = Simulation::new(config, &lookup)?.run(&flights, None)?;
//! println!("{} passengers, {} completed", result.passengers.len(), result.completed_count());
//! # Ok::<(), SimulationError>(())
//! ```
//!
//! ## Module Organization
//!
//! - [`types`]: Core types, identifiers, and configuration
//! - [`flight`]: Flight records and airport reference lookups
//! - [`passenger`]: Passengers, process paths and passenger generation
//! - [`station`]: Capacity-bounded stations and service-time distributions
//! - [`simulation`]: Scheduler, engine, metrics, statistics and capacity search
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐    ┌─────────────┐    ┌─────────────┐
//! │   Types     │    │   Flight    │    │  Passenger  │
//! │             │    │             │    │             │
//! │ Identifiers │◄───┤ Schedule    │◄───┤ Factory     │
//! │ Enums       │    │ Lookups     │    │ Paths       │
//! │ Config      │    │             │    │             │
//! └─────────────┘    └─────────────┘    └─────────────┘
//!        ▲                                     ▲
//!        │                                     │
//! ┌─────────────┐    ┌─────────────┐    ┌─────────────┐
//! │  Station    │    │ Simulation  │    │   Solver    │
//! │             │    │             │    │             │
//! │ FIFO Queue  │◄───┤ Scheduler   │◄───┤ Passbox     │
//! │ Service     │    │ Metrics     │    │ Search      │
//! │ Times       │    │ Statistics  │    │             │
//! └─────────────┘    └─────────────┘    └─────────────┘
//! ```
#![warn(missing_docs, missing_debug_implementations, unreachable_pub)]

// Module declarations
pub mod flight;
pub mod passenger;
pub mod simulation;
pub mod station;

pub mod types;

// Core types and identifiers
pub use types::{
    ConfigValidationError,
    EesStatus,
    FlightId,
    OutputFormat,
    // Enums
    PassengerGroup,
    // Identifiers
    PassengerId,
    // Configuration
    SimulationConfig,
    SolveMode,
    StationKind,
    Terminal,
    WaitStatistic,
};

// Flights and reference data
pub use flight::{AirportLookup, Flight, StaticAirportLookup};

// Passengers and stations
pub use passenger::{Passenger, PassengerFactory, ProcessPaths};
pub use station::ResourceStation;

// Simulation types and functionality
pub use simulation::{
    CapacitySolver, ControlSummary, PassboxReport, PassboxStatus, RunKpis, RunProgress, RunResult,
    RunStatus, Simulation, SimulationError,
};
