//! Passenger entities and their lifecycle state

use crate::types::{EesStatus, FlightId, PassengerGroup, PassengerId, StationKind, Terminal, TransportMode};
use serde::{Deserialize, Serialize};

/// A passenger created by the factory at run start
///
/// Immutable for the rest of the run; progress is tracked separately in
/// [`PassengerState`] and in the metrics records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passenger {
    /// Position in the run's passenger arena
    pub id: PassengerId,
    /// Flight the passenger arrived with
    pub flight_id: FlightId,
    /// Index within the flight, starting at 0 (deboarding order)
    pub pax_index: u32,
    /// Processing group
    pub group: PassengerGroup,
    /// EES status (third-country groups only)
    pub ees: Option<EesStatus>,
    /// How the passenger reached the checkpoint
    pub transport: TransportMode,
    /// Terminal processing the flight
    pub terminal: Terminal,
    /// Seconds after t0 the passenger reaches the checkpoint
    pub checkpoint_arrival_s: f64,
}

/// Where a passenger is in its process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PassengerState {
    /// Aircraft not yet at the gate
    NotArrived,
    /// On the way to the checkpoint (or between stations)
    Walking,
    /// Waiting in a station queue
    Queued(StationKind),
    /// Being served at a station
    InService(StationKind),
    /// Every station of the path done
    Completed,
    /// Still in the process when the horizon was reached
    Incomplete,
}

impl PassengerState {
    /// Whether the passenger is done, one way or the other
    pub fn is_final(&self) -> bool {
        matches!(self, PassengerState::Completed | PassengerState::Incomplete)
    }
}
