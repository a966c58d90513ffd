//! Core types and identifiers for the checkpoint simulator
//!
//! This module contains fundamental types, identifiers, and configuration structures
//! used throughout the simulation system.
//!
//! # Overview
//!
//! - **Identifiers**: dense passenger indices and schedule flight identifiers
//! - **Enums**: passenger groups, station kinds, EES status, terminals, statistics
//! - **Configuration**: simulation configuration with validation and CLI support
//!
//! # Usage Example
//!
//! ```rust
//! use ees_border_sim::types::*;
//!
//! let mut config = SimulationConfig::default();
//! config.seed = 7;
//! config.station_mut(StationKind::Tcn).capacity = 4;
//! assert!(config.validate().is_ok());
//! ```

pub mod config;
pub mod enums;
pub mod identifiers;

// Re-export all public types for convenience
pub use config::*;
pub use enums::*;
pub use identifiers::*;
