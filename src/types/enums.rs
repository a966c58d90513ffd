//! Enumeration types for the checkpoint simulator
//!
//! This module contains all enumeration types used throughout the simulation system,
//! including passenger groups, station kinds, EES status, terminals, transport modes,
//! wait statistics and output formats.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Passenger categories with distinct processing requirements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PassengerGroup {
    /// EU/EEA citizens using automated gates
    Easypass,
    /// EU/EEA citizens processed at a manual EU desk
    EuManual,
    /// Third-country nationals exempt from visa requirements
    TcnAt,
    /// Third-country nationals requiring a visa
    TcnV,
}

impl PassengerGroup {
    /// All groups in their canonical order
    pub const ALL: [PassengerGroup; 4] = [
        PassengerGroup::Easypass,
        PassengerGroup::EuManual,
        PassengerGroup::TcnAt,
        PassengerGroup::TcnV,
    ];

    /// Position of the group in [`PassengerGroup::ALL`]
    pub fn index(self) -> usize {
        match self {
            PassengerGroup::Easypass => 0,
            PassengerGroup::EuManual => 1,
            PassengerGroup::TcnAt => 2,
            PassengerGroup::TcnV => 3,
        }
    }

    /// Whether passengers of this group carry an EES registration status
    pub fn is_third_country(self) -> bool {
        matches!(self, PassengerGroup::TcnAt | PassengerGroup::TcnV)
    }
}

impl fmt::Display for PassengerGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PassengerGroup::Easypass => write!(f, "EASYPASS"),
            PassengerGroup::EuManual => write!(f, "EU_MANUAL"),
            PassengerGroup::TcnAt => write!(f, "TCN_AT"),
            PassengerGroup::TcnV => write!(f, "TCN_V"),
        }
    }
}

impl FromStr for PassengerGroup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "easypass" => Ok(PassengerGroup::Easypass),
            "eu_manual" | "eumanual" | "eu" => Ok(PassengerGroup::EuManual),
            "tcn_at" | "tcnat" => Ok(PassengerGroup::TcnAt),
            "tcn_v" | "tcnv" => Ok(PassengerGroup::TcnV),
            _ => Err(format!("Unknown passenger group: {}", s)),
        }
    }
}

/// Kinds of processing stations at the checkpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StationKind {
    /// Self-service kiosks for EES pre-registration
    Sss,
    /// Automated border gates
    Easypass,
    /// Manual desks for EU citizens
    Eu,
    /// Manual desks for third-country nationals
    Tcn,
}

impl StationKind {
    /// All station kinds in their canonical order
    pub const ALL: [StationKind; 4] =
        [StationKind::Sss, StationKind::Easypass, StationKind::Eu, StationKind::Tcn];

    /// Position of the station in [`StationKind::ALL`]
    pub fn index(self) -> usize {
        match self {
            StationKind::Sss => 0,
            StationKind::Easypass => 1,
            StationKind::Eu => 2,
            StationKind::Tcn => 3,
        }
    }
}

impl fmt::Display for StationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StationKind::Sss => write!(f, "SSS"),
            StationKind::Easypass => write!(f, "EASYPASS"),
            StationKind::Eu => write!(f, "EU"),
            StationKind::Tcn => write!(f, "TCN"),
        }
    }
}

impl FromStr for StationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sss" | "kiosk" => Ok(StationKind::Sss),
            "easypass" | "egate" => Ok(StationKind::Easypass),
            "eu" => Ok(StationKind::Eu),
            "tcn" => Ok(StationKind::Tcn),
            _ => Err(format!("Unknown station: {}", s)),
        }
    }
}

/// Entry/Exit System registration status of a third-country passenger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EesStatus {
    /// Biometrics already on file
    Registered,
    /// First enrolment required at the desk
    Unregistered,
}

impl fmt::Display for EesStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EesStatus::Registered => write!(f, "EES_registered"),
            EesStatus::Unregistered => write!(f, "EES_unregistered"),
        }
    }
}

/// Terminal whose border-control facility a flight is processed at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Terminal {
    /// Terminal 1
    T1,
    /// Terminal 2
    T2,
}

impl Terminal {
    /// Both terminals in their canonical order
    pub const ALL: [Terminal; 2] = [Terminal::T1, Terminal::T2];

    /// Position of the terminal in [`Terminal::ALL`]
    pub fn index(self) -> usize {
        match self {
            Terminal::T1 => 0,
            Terminal::T2 => 1,
        }
    }
}

impl fmt::Display for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Terminal::T1 => write!(f, "T1"),
            Terminal::T2 => write!(f, "T2"),
        }
    }
}

impl FromStr for Terminal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "T1" | "1" => Ok(Terminal::T1),
            "T2" | "2" => Ok(Terminal::T2),
            _ => Err(format!("Unknown terminal: {}", s)),
        }
    }
}

/// How a passenger gets from the aircraft to the checkpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransportMode {
    /// Walking from a contact position
    Walk,
    /// Apron bus from a remote position
    Bus,
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportMode::Walk => write!(f, "Walk"),
            TransportMode::Bus => write!(f, "Bus"),
        }
    }
}

/// Statistic used to compare wait times against a service-level threshold
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum WaitStatistic {
    /// Arithmetic mean of the waits
    Mean,
    /// Percentile in (0, 100], linearly interpolated
    Percentile(f64),
    /// Largest observed wait
    Max,
}

impl fmt::Display for WaitStatistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaitStatistic::Mean => write!(f, "mean"),
            WaitStatistic::Percentile(p) => write!(f, "p{}", p),
            WaitStatistic::Max => write!(f, "max"),
        }
    }
}

impl FromStr for WaitStatistic {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        match lower.as_str() {
            "mean" | "avg" | "average" => Ok(WaitStatistic::Mean),
            "max" | "maximum" => Ok(WaitStatistic::Max),
            other => {
                let digits = other.strip_prefix('p').unwrap_or(other);
                digits
                    .parse::<f64>()
                    .map(WaitStatistic::Percentile)
                    .map_err(|_| format!("Unknown wait statistic: {}", s))
            }
        }
    }
}

/// Handling of parking positions that have no known walking distance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownPositionHandling {
    /// Walk the configured default distance
    DefaultDistance,
    /// Transfer passengers by apron bus
    Bus,
}

/// How the capacity solver treats several stations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveMode {
    /// Each station searched once, others held at their configured capacity
    Independent,
    /// Stations searched round-robin until no capacity changes
    RoundRobin,
}

/// Output formats for run results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Pretty-printed JSON
    Json,
    /// Plain-text summary only
    Summary,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Summary => write!(f, "summary"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "summary" | "text" => Ok(OutputFormat::Summary),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}
