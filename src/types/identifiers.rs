//! Identifier types for the checkpoint simulator
//!
//! Passengers are addressed by their position in the run's passenger arena, so
//! identifiers are dense indices rather than random UUIDs. Two runs over the same
//! inputs therefore hand out identical identifiers.
//!
//! Desk pools are addressed by [`StationKey`]: each terminal runs its own
//! border-control facility, so the same station kind exists once per terminal.

use crate::types::enums::{StationKind, Terminal};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Index of a passenger within one run, in passenger-creation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PassengerId(pub u32);

impl PassengerId {
    /// Arena slot of this passenger
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<usize> for PassengerId {
    fn from(index: usize) -> Self {
        Self(index as u32)
    }
}

impl fmt::Display for PassengerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PAX_{:06}", self.0)
    }
}

/// Identifier of a flight as supplied by the schedule
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlightId(pub String);

impl FlightId {
    /// Create a flight identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FlightId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FlightId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// One desk pool: a station kind at one terminal
///
/// Serialized as `"T1/TCN"` so it can key JSON maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct StationKey {
    /// Terminal owning the desks
    pub terminal: Terminal,
    /// Kind of desk
    pub station: StationKind,
}

impl StationKey {
    /// Number of desk pools in the airport
    pub const COUNT: usize = Terminal::ALL.len() * StationKind::ALL.len();

    /// Create a key
    pub fn new(terminal: Terminal, station: StationKind) -> Self {
        Self { terminal, station }
    }

    /// Every desk pool, terminal by terminal in canonical station order
    pub fn all() -> impl Iterator<Item = StationKey> {
        Terminal::ALL
            .into_iter()
            .flat_map(|terminal| StationKind::ALL.into_iter().map(move |station| Self::new(terminal, station)))
    }

    /// Dense slot of this pool, matching the order of [`StationKey::all`]
    pub fn index(self) -> usize {
        self.terminal.index() * StationKind::ALL.len() + self.station.index()
    }
}

impl fmt::Display for StationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.terminal, self.station)
    }
}

impl FromStr for StationKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (terminal, station) =
            s.split_once('/').ok_or_else(|| format!("Expected TERMINAL/STATION, got: {}", s))?;
        Ok(Self::new(terminal.trim().parse()?, station.trim().parse()?))
    }
}

impl From<StationKey> for String {
    fn from(key: StationKey) -> Self {
        key.to_string()
    }
}

impl TryFrom<String> for StationKey {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passenger_id_display() {
        assert_eq!(PassengerId(42).to_string(), "PAX_000042");
        assert_eq!(PassengerId::from(7usize).index(), 7);
    }

    #[test]
    fn test_passenger_id_serializes_as_number() {
        let json = serde_json::to_string(&PassengerId(3)).unwrap();
        assert_eq!(json, "3");
    }

    #[test]
    fn test_flight_id_roundtrip() {
        let id = FlightId::new("LH1234");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"LH1234\"");
        let back: FlightId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
        assert_eq!(back.as_str(), "LH1234");
    }

    #[test]
    fn test_station_key_slots_are_dense() {
        let keys: Vec<StationKey> = StationKey::all().collect();
        assert_eq!(keys.len(), StationKey::COUNT);
        for (i, key) in keys.iter().enumerate() {
            assert_eq!(key.index(), i);
        }
        assert_eq!(keys[0], StationKey::new(Terminal::T1, StationKind::Sss));
        assert_eq!(keys[StationKey::COUNT - 1], StationKey::new(Terminal::T2, StationKind::Tcn));
    }

    #[test]
    fn test_station_key_keys_json_maps() {
        let key = StationKey::new(Terminal::T1, StationKind::Tcn);
        assert_eq!(key.to_string(), "T1/TCN");
        assert_eq!("t2/kiosk".parse::<StationKey>().unwrap(), StationKey::new(Terminal::T2, StationKind::Sss));
        assert!("TCN".parse::<StationKey>().is_err());
        assert!("T3/TCN".parse::<StationKey>().is_err());

        let map: std::collections::BTreeMap<StationKey, usize> = [(key, 4)].into_iter().collect();
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"T1/TCN":4}"#);
        let back: std::collections::BTreeMap<StationKey, usize> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
    }
}
