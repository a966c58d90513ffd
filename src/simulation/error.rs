//! Error types and handling
//!
//! This module contains error types and error handling for the simulation.
//! Configuration and liveness problems are raised before any event is processed,
//! so a failed run never yields a partial result.

use crate::types::{ConfigError, ConfigValidationError, PassengerGroup, StationKey};
use thiserror::Error;

/// Errors that can occur during simulation
#[derive(Debug, Error)]
pub enum SimulationError {
    /// Configuration validation failed
    #[error("Configuration validation failed: {0}")]
    ConfigurationError(#[from] ConfigValidationError),

    /// Configuration could not be loaded
    #[error("Configuration loading failed: {0}")]
    ConfigLoadError(#[from] ConfigError),

    /// A station with zero capacity has demand that can never be served
    #[error("Liveness error: station {station} cannot serve {demand} passenger(s) of group {group}")]
    LivenessError {
        /// Desk pool that can never start service
        station: StationKey,
        /// First group routed through the station
        group: PassengerGroup,
        /// Number of passengers that would wait forever
        demand: usize,
    },

    /// Flight input rejected
    #[error("Invalid flight input: {0}")]
    InputError(String),

    /// I/O error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// The capacity search could not start its worker pool
    #[error("Worker pool error: {0}")]
    WorkerPoolError(#[from] rayon::ThreadPoolBuildError),
}

impl SimulationError {
    /// Create a liveness error
    pub fn liveness_error(station: StationKey, group: PassengerGroup, demand: usize) -> Self {
        Self::LivenessError { station, group, demand }
    }

    /// Create an input error
    pub fn input_error(msg: impl Into<String>) -> Self {
        Self::InputError(msg.into())
    }

    /// Check if this is a recoverable error
    ///
    /// Recoverable errors depend on the environment rather than on the inputs, so
    /// retrying with the same configuration may succeed.
    pub fn is_recoverable(&self) -> bool {
        match self {
            SimulationError::ConfigurationError(_) => false,
            SimulationError::ConfigLoadError(_) => false,
            SimulationError::LivenessError { .. } => false,
            SimulationError::InputError(_) => false,
            SimulationError::IoError(_) => true,
            SimulationError::SerializationError(_) => true,
            SimulationError::WorkerPoolError(_) => true,
        }
    }

    /// Get the error category
    pub fn category(&self) -> &'static str {
        match self {
            SimulationError::ConfigurationError(_) => "Configuration",
            SimulationError::ConfigLoadError(_) => "Configuration Loading",
            SimulationError::LivenessError { .. } => "Liveness",
            SimulationError::InputError(_) => "Input",
            SimulationError::IoError(_) => "IO",
            SimulationError::SerializationError(_) => "Serialization",
            SimulationError::WorkerPoolError(_) => "Worker Pool",
        }
    }
}

/// Result type for simulation operations
pub type SimulationResult<T> = Result<T, SimulationError>;
