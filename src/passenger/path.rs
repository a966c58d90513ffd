//! Process paths
//!
//! Each passenger group walks a fixed, ordered list of stations. Paths are
//! resolved once per run and terminal from the configuration (with that
//! terminal's kiosk switch applied) and never change while the run executes.

use crate::types::{ConfigValidationError, PassengerGroup, SimulationConfig, StationKind, Terminal};
use serde::{Deserialize, Serialize};

/// Ordered stations a group must traverse
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessPath {
    /// Group the path belongs to
    pub group: PassengerGroup,
    /// Stations in visiting order
    pub stations: Vec<StationKind>,
}

impl ProcessPath {
    /// Station at a step, if the path is that long
    pub fn step(&self, index: usize) -> Option<StationKind> {
        self.stations.get(index).copied()
    }

    /// Number of stations on the path
    pub fn len(&self) -> usize {
        self.stations.len()
    }

    /// Whether the path has no stations
    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// Whether the path visits a station
    pub fn visits(&self, station: StationKind) -> bool {
        self.stations.contains(&station)
    }
}

/// The process paths of all four groups at one terminal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessPaths {
    paths: [ProcessPath; 4],
}

impl ProcessPaths {
    /// Resolve and check the paths a terminal's checkpoint runs
    pub fn for_terminal(config: &SimulationConfig, terminal: Terminal) -> Result<Self, ConfigValidationError> {
        let build = |group: PassengerGroup| -> Result<ProcessPath, ConfigValidationError> {
            let stations = config.terminal_path(terminal, group);
            if stations.is_empty() {
                return Err(ConfigValidationError::EmptyProcessPath(group));
            }
            for (i, station) in stations.iter().enumerate() {
                if stations[..i].contains(station) {
                    return Err(ConfigValidationError::RepeatedStation { group, station: *station });
                }
            }
            Ok(ProcessPath { group, stations })
        };

        Ok(Self {
            paths: [
                build(PassengerGroup::Easypass)?,
                build(PassengerGroup::EuManual)?,
                build(PassengerGroup::TcnAt)?,
                build(PassengerGroup::TcnV)?,
            ],
        })
    }

    /// Path of a group
    pub fn get(&self, group: PassengerGroup) -> &ProcessPath {
        &self.paths[group.index()]
    }

    /// Groups whose path visits a station
    pub fn groups_visiting(&self, station: StationKind) -> impl Iterator<Item = PassengerGroup> + '_ {
        self.paths.iter().filter(move |path| path.visits(station)).map(|path| path.group)
    }

    /// Iterate paths in group order
    pub fn iter(&self) -> impl Iterator<Item = &ProcessPath> {
        self.paths.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_paths() {
        let paths = ProcessPaths::for_terminal(&SimulationConfig::default(), Terminal::T1).unwrap();
        assert_eq!(paths.get(PassengerGroup::Easypass).stations, vec![StationKind::Easypass]);
        assert_eq!(paths.get(PassengerGroup::TcnV).stations, vec![StationKind::Sss, StationKind::Tcn]);
        assert_eq!(paths.get(PassengerGroup::TcnV).step(1), Some(StationKind::Tcn));
        assert_eq!(paths.get(PassengerGroup::TcnV).step(2), None);

        let easypass_users: Vec<_> = paths.groups_visiting(StationKind::Easypass).collect();
        assert_eq!(easypass_users, vec![PassengerGroup::Easypass, PassengerGroup::TcnAt]);
    }

    #[test]
    fn test_repeated_station_rejected() {
        let mut config = SimulationConfig::default();
        config.paths.set(PassengerGroup::TcnAt, vec![StationKind::Tcn, StationKind::Sss, StationKind::Tcn]);
        assert_eq!(
            ProcessPaths::for_terminal(&config, Terminal::T2),
            Err(ConfigValidationError::RepeatedStation {
                group: PassengerGroup::TcnAt,
                station: StationKind::Tcn
            })
        );
    }

    #[test]
    fn test_kiosk_switch_applies() {
        let mut config = SimulationConfig::default();
        config.sss_enabled = false;
        let paths = ProcessPaths::for_terminal(&config, Terminal::T2).unwrap();
        assert_eq!(paths.get(PassengerGroup::TcnV).stations, vec![StationKind::Tcn]);
        assert_eq!(paths.groups_visiting(StationKind::Sss).count(), 0);
    }

    #[test]
    fn test_terminals_resolve_their_own_kiosk_switch() {
        let mut config = SimulationConfig::default();
        config.terminals.entry(Terminal::T1).or_default().sss_enabled = Some(false);

        let t1 = ProcessPaths::for_terminal(&config, Terminal::T1).unwrap();
        let t2 = ProcessPaths::for_terminal(&config, Terminal::T2).unwrap();
        assert_eq!(t1.get(PassengerGroup::TcnV).stations, vec![StationKind::Tcn]);
        assert_eq!(t2.get(PassengerGroup::TcnV).stations, vec![StationKind::Sss, StationKind::Tcn]);
    }
}
