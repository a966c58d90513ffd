//! Processing stations
//!
//! This module models the units of contention at the checkpoint: pools of desks,
//! gates or kiosks with a FIFO queue and a service-time distribution per group.
//!
//! # Overview
//!
//! - **ResourceStation**: bounded concurrent service with a strict FIFO queue
//! - **ServiceTimeDistribution**: fixed, normal, log-normal or exponential service times
//!
//! # Usage Example
//!
//! ```rust
//! use ees_border_sim::station::*;
//! use ees_border_sim::types::*;
//!
//! let config = StationConfig::new(1, ServiceTimeParams::Fixed { seconds: 30.0 });
//! let mut desk = ResourceStation::from_config(StationKind::Eu, &config).unwrap();
//!
//! assert_eq!(desk.try_acquire(PassengerId(0)), AcquireOutcome::Started);
//! assert_eq!(desk.try_acquire(PassengerId(1)), AcquireOutcome::Queued);
//! desk.release(PassengerId(0));
//! assert_eq!(desk.admit_next(), Some(PassengerId(1)));
//! ```

pub mod distribution;
pub mod station;

// Re-export all public types for convenience
pub use distribution::{ServiceTimeDistribution, SERVICE_TIME_FLOOR_S};
pub use station::{AcquireOutcome, ResourceStation};
