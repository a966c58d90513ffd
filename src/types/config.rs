//! Configuration structures for the checkpoint simulator
//!
//! This module contains the simulation configuration structure and validation logic
//! used to control the behavior and parameters of a simulation run. A configuration
//! is immutable for the life of one run; the capacity solver derives a fresh copy
//! per candidate capacity.

use super::{
    OutputFormat, PassengerGroup, SolveMode, StationKey, StationKind, Terminal, UnknownPositionHandling,
    WaitStatistic,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Upper limit for any single station capacity
pub const MAX_STATION_CAPACITY: usize = 1_000;

/// Tolerance used when checking that the group mix sums to one
pub const MIX_SUM_TOLERANCE: f64 = 1e-3;

/// Default calibration of the original checkpoint, in seconds
pub mod defaults {
    /// Mean kiosk processing time
    pub const MEAN_SSS_S: f64 = 34.0;
    /// Standard deviation of kiosk processing time
    pub const SD_SSS_S: f64 = 20.4;

    /// Log-normal mu for automated gates
    pub const MU_EASYPASS: f64 = 2.76;
    /// Log-normal sigma for automated gates
    pub const SIGMA_EASYPASS: f64 = 0.34;
    /// Cap for automated gate processing
    pub const MAX_EASYPASS_S: f64 = 90.0;

    /// Log-normal mu for manual EU desks
    pub const MU_EU: f64 = 3.76;
    /// Log-normal sigma for manual EU desks
    pub const SIGMA_EU: f64 = 0.5;
    /// Cap for manual EU desk processing
    pub const MAX_EU_S: f64 = 180.0;

    /// Log-normal mu for third-country desks
    pub const MU_TCN: f64 = 3.92;
    /// Log-normal sigma for third-country desks
    pub const SIGMA_TCN: f64 = 0.54;
    /// Cap for third-country desk processing
    pub const MAX_TCN_S: f64 = 180.0;

    /// Minimum delay between two deboarding passengers
    pub const DEBOARD_DELAY_MIN_S: u32 = 2;
    /// Maximum delay between two deboarding passengers
    pub const DEBOARD_DELAY_MAX_S: u32 = 8;

    /// Seats per apron bus
    pub const BUS_CAPACITY: usize = 80;
    /// Time to fill a full bus
    pub const BUS_FILL_TIME_S: f64 = 420.0;
    /// Bus travel time to the checkpoint
    pub const BUS_TRAVEL_TIME_S: f64 = 150.0;
}

/// Parameters of a service-time distribution, all in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "distribution", rename_all = "snake_case")]
pub enum ServiceTimeParams {
    /// Constant service time
    Fixed {
        /// Service time
        seconds: f64,
    },
    /// Normal distribution floored at a small positive value
    Normal {
        /// Mean service time
        mean_s: f64,
        /// Standard deviation
        sd_s: f64,
    },
    /// Log-normal distribution (parameters of the underlying normal), capped
    LogNormal {
        /// Mean of ln(service time)
        mu: f64,
        /// Standard deviation of ln(service time)
        sigma: f64,
        /// Hard upper bound
        max_s: f64,
    },
    /// Exponential distribution
    Exponential {
        /// Mean service time
        mean_s: f64,
    },
}

impl ServiceTimeParams {
    /// Check parameters, returning the offending field and value
    pub fn check(&self) -> Result<(), (&'static str, f64)> {
        let finite_non_negative = |field: &'static str, value: f64| {
            if value.is_finite() && value >= 0.0 {
                Ok(())
            } else {
                Err((field, value))
            }
        };

        match *self {
            ServiceTimeParams::Fixed { seconds } => finite_non_negative("seconds", seconds),
            ServiceTimeParams::Normal { mean_s, sd_s } => {
                finite_non_negative("mean_s", mean_s)?;
                finite_non_negative("sd_s", sd_s)
            }
            ServiceTimeParams::LogNormal { mu, sigma, max_s } => {
                if !mu.is_finite() {
                    return Err(("mu", mu));
                }
                finite_non_negative("sigma", sigma)?;
                finite_non_negative("max_s", max_s)
            }
            ServiceTimeParams::Exponential { mean_s } => {
                if mean_s.is_finite() && mean_s > 0.0 {
                    Ok(())
                } else {
                    Err(("mean_s", mean_s))
                }
            }
        }
    }

    /// Approximate expected service time
    pub fn expected_s(&self) -> f64 {
        match *self {
            ServiceTimeParams::Fixed { seconds } => seconds,
            ServiceTimeParams::Normal { mean_s, .. } => mean_s,
            ServiceTimeParams::LogNormal { mu, sigma, max_s } => {
                (mu + sigma * sigma / 2.0).exp().min(max_s)
            }
            ServiceTimeParams::Exponential { mean_s } => mean_s,
        }
    }
}

/// Shares of the four passenger groups (must sum to one)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroupMix {
    /// Share of automated-gate users
    pub easypass: f64,
    /// Share of EU citizens at manual desks
    pub eu_manual: f64,
    /// Share of visa-exempt third-country nationals
    pub tcn_at: f64,
    /// Share of visa-required third-country nationals
    pub tcn_v: f64,
}

impl Default for GroupMix {
    fn default() -> Self {
        Self { easypass: 0.49, eu_manual: 0.21, tcn_at: 0.15, tcn_v: 0.15 }
    }
}

impl GroupMix {
    /// Share configured for a group
    pub fn share(&self, group: PassengerGroup) -> f64 {
        match group {
            PassengerGroup::Easypass => self.easypass,
            PassengerGroup::EuManual => self.eu_manual,
            PassengerGroup::TcnAt => self.tcn_at,
            PassengerGroup::TcnV => self.tcn_v,
        }
    }

    /// Shares in canonical group order
    pub fn shares(&self) -> [f64; 4] {
        [self.easypass, self.eu_manual, self.tcn_at, self.tcn_v]
    }

    /// Sum of all shares
    pub fn sum(&self) -> f64 {
        self.shares().iter().sum()
    }
}

/// Configuration of a single processing station
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationConfig {
    /// Number of passengers that can be served concurrently
    pub capacity: usize,
    /// Service time used when no override applies
    pub service_time: ServiceTimeParams,
    /// Per-group service time overrides
    #[serde(default)]
    pub group_service_times: BTreeMap<PassengerGroup, ServiceTimeParams>,
    /// Override for third-country passengers without EES registration
    #[serde(default)]
    pub unregistered_service_time: Option<ServiceTimeParams>,
}

impl StationConfig {
    /// Create a station configuration without overrides
    pub fn new(capacity: usize, service_time: ServiceTimeParams) -> Self {
        Self {
            capacity,
            service_time,
            group_service_times: BTreeMap::new(),
            unregistered_service_time: None,
        }
    }
}

/// Configuration of all four stations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationTable {
    /// Self-service kiosks
    pub sss: StationConfig,
    /// Automated gates
    pub easypass: StationConfig,
    /// Manual EU desks
    pub eu: StationConfig,
    /// Manual third-country desks
    pub tcn: StationConfig,
}

impl Default for StationTable {
    fn default() -> Self {
        let tcn_time =
            ServiceTimeParams::LogNormal { mu: defaults::MU_TCN, sigma: defaults::SIGMA_TCN, max_s: defaults::MAX_TCN_S };
        let mut tcn = StationConfig::new(6, tcn_time);
        tcn.unregistered_service_time = Some(tcn_time);

        Self {
            sss: StationConfig::new(
                6,
                ServiceTimeParams::Normal { mean_s: defaults::MEAN_SSS_S, sd_s: defaults::SD_SSS_S },
            ),
            easypass: StationConfig::new(
                8,
                ServiceTimeParams::LogNormal {
                    mu: defaults::MU_EASYPASS,
                    sigma: defaults::SIGMA_EASYPASS,
                    max_s: defaults::MAX_EASYPASS_S,
                },
            ),
            eu: StationConfig::new(
                2,
                ServiceTimeParams::LogNormal { mu: defaults::MU_EU, sigma: defaults::SIGMA_EU, max_s: defaults::MAX_EU_S },
            ),
            tcn,
        }
    }
}

impl StationTable {
    /// Configuration of one station
    pub fn get(&self, kind: StationKind) -> &StationConfig {
        match kind {
            StationKind::Sss => &self.sss,
            StationKind::Easypass => &self.easypass,
            StationKind::Eu => &self.eu,
            StationKind::Tcn => &self.tcn,
        }
    }

    /// Mutable configuration of one station
    pub fn get_mut(&mut self, kind: StationKind) -> &mut StationConfig {
        match kind {
            StationKind::Sss => &mut self.sss,
            StationKind::Easypass => &mut self.easypass,
            StationKind::Eu => &mut self.eu,
            StationKind::Tcn => &mut self.tcn,
        }
    }

    /// Iterate stations in canonical order
    pub fn iter(&self) -> impl Iterator<Item = (StationKind, &StationConfig)> {
        StationKind::ALL.into_iter().map(move |kind| (kind, self.get(kind)))
    }
}

/// Settings of one terminal's checkpoint that differ from the shared station table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TerminalConfig {
    /// Desk counts replacing the shared capacity of a station kind
    #[serde(default)]
    pub capacities: BTreeMap<StationKind, usize>,
    /// Kiosk switch of this terminal; the global switch applies when unset
    #[serde(default)]
    pub sss_enabled: Option<bool>,
}

/// Ordered station sequences per passenger group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathTable {
    /// Path of automated-gate users
    pub easypass: Vec<StationKind>,
    /// Path of EU citizens at manual desks
    pub eu_manual: Vec<StationKind>,
    /// Path of visa-exempt third-country nationals
    pub tcn_at: Vec<StationKind>,
    /// Path of visa-required third-country nationals
    pub tcn_v: Vec<StationKind>,
}

impl Default for PathTable {
    fn default() -> Self {
        Self {
            easypass: vec![StationKind::Easypass],
            eu_manual: vec![StationKind::Eu],
            tcn_at: vec![StationKind::Easypass],
            tcn_v: vec![StationKind::Sss, StationKind::Tcn],
        }
    }
}

impl PathTable {
    /// Configured path of a group
    pub fn get(&self, group: PassengerGroup) -> &[StationKind] {
        match group {
            PassengerGroup::Easypass => &self.easypass,
            PassengerGroup::EuManual => &self.eu_manual,
            PassengerGroup::TcnAt => &self.tcn_at,
            PassengerGroup::TcnV => &self.tcn_v,
        }
    }

    /// Replace the path of a group
    pub fn set(&mut self, group: PassengerGroup, path: Vec<StationKind>) {
        match group {
            PassengerGroup::Easypass => self.easypass = path,
            PassengerGroup::EuManual => self.eu_manual = path,
            PassengerGroup::TcnAt => self.tcn_at = path,
            PassengerGroup::TcnV => self.tcn_v = path,
        }
    }
}

/// Walking-speed distribution in metres per second
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WalkSpeed {
    /// Mean walking speed
    pub mean_mps: f64,
    /// Standard deviation of walking speed
    pub sd_mps: f64,
    /// Nobody walks slower than this
    pub floor_mps: f64,
}

impl Default for WalkSpeed {
    fn default() -> Self {
        Self { mean_mps: 1.25, sd_mps: 0.25, floor_mps: 0.5 }
    }
}

/// How passengers reach the checkpoint on foot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalkingConfig {
    /// Speed used for terminals without their own entry
    pub default_speed: WalkSpeed,
    /// Per-terminal walking speeds
    #[serde(default)]
    pub terminal_speeds: BTreeMap<Terminal, WalkSpeed>,
    /// Distance walked from positions missing in the distance table
    pub default_distance_m: f64,
    /// What to do with positions missing in the distance table
    pub unknown_position: UnknownPositionHandling,
    /// Extra delay per group before reaching the checkpoint
    #[serde(default)]
    pub group_dwell_s: BTreeMap<PassengerGroup, f64>,
}

impl Default for WalkingConfig {
    fn default() -> Self {
        Self {
            default_speed: WalkSpeed::default(),
            terminal_speeds: BTreeMap::new(),
            default_distance_m: 150.0,
            unknown_position: UnknownPositionHandling::DefaultDistance,
            group_dwell_s: BTreeMap::new(),
        }
    }
}

impl WalkingConfig {
    /// Walking speed distribution for a terminal
    pub fn speed_for(&self, terminal: Terminal) -> WalkSpeed {
        self.terminal_speeds.get(&terminal).copied().unwrap_or(self.default_speed)
    }

    /// Dwell offset for a group
    pub fn dwell_for(&self, group: PassengerGroup) -> f64 {
        self.group_dwell_s.get(&group).copied().unwrap_or(0.0)
    }
}

/// Aircraft deboarding timing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeboardingConfig {
    /// Delay between block-in and the first passenger leaving the aircraft
    pub offset_s: f64,
    /// Minimum gap between consecutive passengers
    pub delay_min_s: u32,
    /// Maximum gap between consecutive passengers
    pub delay_max_s: u32,
}

impl Default for DeboardingConfig {
    fn default() -> Self {
        Self {
            offset_s: 300.0,
            delay_min_s: defaults::DEBOARD_DELAY_MIN_S,
            delay_max_s: defaults::DEBOARD_DELAY_MAX_S,
        }
    }
}

/// Apron bus transfer parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BusConfig {
    /// Seats per bus
    pub capacity: usize,
    /// Time to fill a full bus
    pub fill_time_s: f64,
    /// Travel time from the aircraft to the checkpoint
    pub travel_time_s: f64,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            capacity: defaults::BUS_CAPACITY,
            fill_time_s: defaults::BUS_FILL_TIME_S,
            travel_time_s: defaults::BUS_TRAVEL_TIME_S,
        }
    }
}

/// Wait-time threshold and the statistic it applies to
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ServiceLevelTarget {
    /// Statistic compared against the threshold
    pub statistic: WaitStatistic,
    /// Largest acceptable value of the statistic
    pub max_wait_s: f64,
}

impl Default for ServiceLevelTarget {
    fn default() -> Self {
        Self { statistic: WaitStatistic::Percentile(95.0), max_wait_s: 600.0 }
    }
}

impl ServiceLevelTarget {
    /// Whether a measured statistic meets the target
    pub fn is_met_by(&self, measured_s: f64) -> bool {
        measured_s <= self.max_wait_s
    }
}

/// Capacity search ("Passbox") parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassboxConfig {
    /// Smallest capacity considered
    pub lower_bound: usize,
    /// Largest capacity considered
    pub upper_bound: usize,
    /// Stations to solve at every terminal with demand; empty means every station used by a path
    #[serde(default)]
    pub stations: Vec<StationKind>,
    /// Per-terminal replacement of `upper_bound`, keyed `"T1/TCN"`
    #[serde(default)]
    pub upper_bounds: BTreeMap<StationKey, usize>,
    /// Independent or round-robin joint search
    pub mode: SolveMode,
    /// Round-robin pass limit
    pub max_rounds: usize,
    /// Replicate runs per capacity
    pub probes_per_capacity: usize,
    /// Upper bound on concurrently evaluated runs
    pub workers: usize,
}

impl Default for PassboxConfig {
    fn default() -> Self {
        Self {
            lower_bound: 1,
            upper_bound: 10,
            stations: Vec::new(),
            upper_bounds: [
                (StationKey::new(Terminal::T1, StationKind::Tcn), 6),
                (StationKey::new(Terminal::T2, StationKind::Tcn), 8),
            ]
            .into_iter()
            .collect(),
            mode: SolveMode::RoundRobin,
            max_rounds: 5,
            probes_per_capacity: 1,
            workers: 1,
        }
    }
}

impl PassboxConfig {
    /// Largest capacity considered for one desk pool
    pub fn upper_bound_for(&self, key: StationKey) -> usize {
        self.upper_bounds.get(&key).copied().unwrap_or(self.upper_bound)
    }
}

/// Command line arguments structure
#[derive(Debug, Clone, Parser)]
#[command(
    name = "ees-border-sim",
    version,
    about = "EES checkpoint simulator - passenger waiting times and required desk capacities",
    long_about = "Simulates passenger flow through an airport border-control checkpoint for a given flight schedule and passenger mix, and optionally searches the minimal station capacities meeting a service-level target (Passbox mode).

EXAMPLES:
    # Simulate a flight schedule with default settings
    ees-border-sim --flights flights.json

    # Use a configuration file and override the TCN desk count
    ees-border-sim --config config.json --flights flights.json --capacity TCN=4

    # Four kiosks at terminal 1 only, no kiosks at terminal 2
    ees-border-sim --flights flights.json --capacity T1/SSS=4 --disable-sss T2

    # Find minimal capacities keeping the maximum wait under 5 minutes
    ees-border-sim --flights flights.json --passbox --statistic max --target-wait-s 300

    # Generate configuration template
    ees-border-sim --print-config > my-config.json

CONFIGURATION:
    Configuration can be provided via:
    1. Command line arguments (highest priority)
    2. Configuration file (--config flag)
    3. Default values (lowest priority)"
)]
pub struct CliArgs {
    /// Configuration file path (JSON format)
    #[arg(short, long, help = "Configuration file path (JSON format)")]
    pub config: Option<String>,

    /// Flight schedule (JSON array of flights)
    #[arg(short, long, help = "Flight schedule file (JSON array of flights)")]
    pub flights: Option<String>,

    /// Random seed for reproducible results
    #[arg(long, help = "Random seed for reproducible results")]
    pub seed: Option<u64>,

    /// Simulation horizon in minutes after the first block-in
    #[arg(long, help = "Stop the simulation after this many minutes")]
    pub until_min: Option<f64>,

    /// Station capacity overrides
    #[arg(
        long = "capacity",
        value_name = "[TERMINAL/]STATION=N",
        help = "Override a station capacity, e.g. TCN=4 or T1/TCN=4 (repeatable)"
    )]
    pub capacities: Vec<String>,

    /// Terminals without kiosks
    #[arg(long = "disable-sss", value_name = "TERMINAL", help = "Drop kiosks from the paths at a terminal (repeatable)")]
    pub disable_sss: Vec<String>,

    /// Service-level threshold in seconds
    #[arg(long, help = "Largest acceptable wait statistic in seconds")]
    pub target_wait_s: Option<f64>,

    /// Statistic the threshold applies to
    #[arg(long, help = "Wait statistic: mean, max or pNN (e.g. p95)")]
    pub statistic: Option<String>,

    /// Run the capacity search instead of a single simulation
    #[arg(long, help = "Search minimal capacities meeting the service level")]
    pub passbox: bool,

    /// Smallest capacity considered by the search
    #[arg(long, help = "Passbox lower capacity bound")]
    pub lower_bound: Option<usize>,

    /// Largest capacity considered by the search
    #[arg(long, help = "Passbox upper capacity bound")]
    pub upper_bound: Option<usize>,

    /// Concurrent runs during the search
    #[arg(long, help = "Number of parallel workers for the capacity search")]
    pub workers: Option<usize>,

    /// Replicate runs per candidate capacity
    #[arg(long, help = "Replicate runs per candidate capacity")]
    pub probes: Option<usize>,

    /// Where to write the result
    #[arg(short, long, help = "Write the result to this file")]
    pub output: Option<String>,

    /// Output format
    #[arg(long, help = "Output format (json or summary)")]
    pub output_format: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, help = "Enable verbose logging")]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(short, long, help = "Enable debug logging")]
    pub debug: bool,

    /// Emit log lines as JSON
    #[arg(long, help = "Write log lines as JSON")]
    pub log_json: bool,

    /// Directory for daily rolling log files
    #[arg(long, value_name = "DIR", help = "Also write JSON logs to daily files in this directory")]
    pub log_dir: Option<String>,

    /// Dry run mode - validate configuration without running simulation
    #[arg(long, help = "Validate configuration without running simulation")]
    pub dry_run: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in JSON format and exit")]
    pub print_config: bool,
}

/// Configuration file structure (allows partial configuration)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConfigFile {
    /// Passenger group shares
    pub mix: Option<GroupMix>,
    /// Draw groups randomly instead of proportional allocation
    pub randomized_group_assignment: Option<bool>,
    /// Share of third-country passengers already registered in EES
    pub ees_registered_share: Option<f64>,
    /// Whether kiosks are part of the process
    pub sss_enabled: Option<bool>,
    /// Station configuration
    pub stations: Option<StationTable>,
    /// Per-terminal capacity and kiosk settings
    pub terminals: Option<BTreeMap<Terminal, TerminalConfig>>,
    /// Process paths
    pub paths: Option<PathTable>,
    /// Walking configuration
    pub walking: Option<WalkingConfig>,
    /// Deboarding configuration
    pub deboarding: Option<DeboardingConfig>,
    /// Bus configuration
    pub bus: Option<BusConfig>,
    /// Desk changeover time
    pub changeover_s: Option<f64>,
    /// Service-level target
    pub service_level: Option<ServiceLevelTarget>,
    /// Capacity search configuration
    pub passbox: Option<PassboxConfig>,
    /// Random seed
    pub seed: Option<u64>,
    /// Resampling grid step
    pub series_interval_s: Option<f64>,
}

/// Configuration for one simulation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Passenger group shares (sum to one)
    pub mix: GroupMix,
    /// Draw groups randomly per passenger instead of proportional allocation
    pub randomized_group_assignment: bool,
    /// Share of third-country passengers already registered in EES (0.0-1.0)
    pub ees_registered_share: f64,
    /// Whether kiosks are part of the process; when false SSS is dropped from all paths
    pub sss_enabled: bool,
    /// Capacities and service times per station, shared by both terminals
    pub stations: StationTable,
    /// Per-terminal deviations from the shared station table
    #[serde(default)]
    pub terminals: BTreeMap<Terminal, TerminalConfig>,
    /// Ordered stations per group
    pub paths: PathTable,
    /// Walking from aircraft to checkpoint
    pub walking: WalkingConfig,
    /// Aircraft deboarding
    pub deboarding: DeboardingConfig,
    /// Bus transfer from remote positions
    pub bus: BusConfig,
    /// Time a desk stays occupied after each service
    pub changeover_s: f64,
    /// Service-level target
    pub service_level: ServiceLevelTarget,
    /// Capacity search parameters
    pub passbox: PassboxConfig,
    /// Random seed
    pub seed: u64,
    /// Step of the fixed-interval queue series, if wanted
    pub series_interval_s: Option<f64>,
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    /// Configuration file read error
    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    /// JSON parsing error
    #[error("Failed to parse JSON configuration: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Unsupported configuration file format
    #[error("Unsupported configuration file format: {0} (supported: .json)")]
    UnsupportedFormat(String),

    /// Malformed command line override
    #[error("Invalid override '{0}'")]
    InvalidOverride(String),
}

/// Validation errors for simulation configuration
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigValidationError {
    /// Station capacity out of range
    #[error("Invalid capacity for station {station}: {capacity} (max {MAX_STATION_CAPACITY})")]
    InvalidCapacity {
        /// Station with the bad capacity
        station: StationKind,
        /// The rejected capacity
        capacity: usize,
    },

    /// Service-time parameter negative or not finite
    #[error("Invalid service-time parameter {field} = {value} at station {station}")]
    NegativeServiceParameter {
        /// Station the parameter belongs to
        station: StationKind,
        /// Name of the parameter
        field: String,
        /// The rejected value
        value: f64,
    },

    /// Group shares don't sum to 1.0
    #[error("Group mix must sum to 1.0, got {sum}")]
    InvalidMixSum {
        /// The actual sum of the shares
        sum: f64,
    },

    /// Percentage value is out of range
    #[error("Invalid percentage for {field}: {value} (must be between 0.0 and 1.0)")]
    InvalidPercentage {
        /// Name of the field with invalid percentage
        field: String,
        /// The invalid percentage value
        value: f64,
    },

    /// A duration or distance is negative or not finite
    #[error("Invalid value for {field}: {value}")]
    InvalidDuration {
        /// Name of the field
        field: String,
        /// The rejected value
        value: f64,
    },

    /// Walking speed parameters unusable
    #[error("Invalid walking speed {field}: {value}")]
    InvalidWalkSpeed {
        /// Name of the field
        field: String,
        /// The rejected value
        value: f64,
    },

    /// Deboarding delay range is inverted
    #[error("Invalid deboarding delay range: min ({0}) must be <= max ({1})")]
    InvalidDeboardingRange(u32, u32),

    /// Bus capacity is zero
    #[error("Bus capacity must be greater than 0")]
    InvalidBusCapacity,

    /// A group has no stations to visit
    #[error("Process path of group {0} is empty")]
    EmptyProcessPath(PassengerGroup),

    /// A group visits the same station twice
    #[error("Process path of group {group} visits station {station} more than once")]
    RepeatedStation {
        /// Group with the bad path
        group: PassengerGroup,
        /// Station that repeats
        station: StationKind,
    },

    /// Percentile outside (0, 100]
    #[error("Invalid percentile {0} (must be in (0, 100])")]
    InvalidPercentile(f64),

    /// Solver bounds unusable
    #[error("Invalid solver bounds: lower ({lower}) must be >= 1 and <= upper ({upper}) <= {MAX_STATION_CAPACITY}")]
    InvalidSolverBounds {
        /// Lower bound
        lower: usize,
        /// Upper bound
        upper: usize,
    },

    /// Per-terminal solver bound outside the global range
    #[error("Invalid solver upper bound for {key}: {upper} (must be in {lower}..={MAX_STATION_CAPACITY})")]
    InvalidTerminalBound {
        /// Desk pool
        key: StationKey,
        /// Lower bound
        lower: usize,
        /// Rejected upper bound
        upper: usize,
    },

    /// Solver counter is zero
    #[error("Solver setting {0} must be greater than 0")]
    InvalidSolverSetting(String),
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            mix: GroupMix::default(),
            randomized_group_assignment: false,
            ees_registered_share: 0.75,
            sss_enabled: true,
            stations: StationTable::default(),
            terminals: BTreeMap::new(),
            paths: PathTable::default(),
            walking: WalkingConfig::default(),
            deboarding: DeboardingConfig::default(),
            bus: BusConfig::default(),
            changeover_s: 0.0,
            service_level: ServiceLevelTarget::default(),
            passbox: PassboxConfig::default(),
            seed: 42,
            series_interval_s: None,
        }
    }
}

impl SimulationConfig {
    /// Create a new configuration from command line arguments and optional config file
    pub fn from_args() -> Result<Self, ConfigError> {
        let args = CliArgs::parse();
        Self::from_cli_args(args)
    }

    /// Create configuration from parsed CLI arguments
    pub fn from_cli_args(args: CliArgs) -> Result<Self, ConfigError> {
        // Start with default configuration
        let mut config = Self::default();

        // Load from config file if specified
        if let Some(config_path) = &args.config {
            config = Self::from_file(config_path)?;
        }

        // Override with command line arguments (CLI takes precedence)
        Self::apply_cli_overrides(&mut config, args)?;

        Ok(config)
    }

    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let content = fs::read_to_string(path)?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => {
                let config_file: ConfigFile = serde_json::from_str(&content)?;
                Ok(Self::from_config_file(config_file))
            }
            Some(ext) => Err(ConfigError::UnsupportedFormat(ext.to_string())),
            None => Err(ConfigError::UnsupportedFormat("no extension".to_string())),
        }
    }

    /// Create configuration from a config file, merging with defaults
    fn from_config_file(config_file: ConfigFile) -> Self {
        let defaults = Self::default();

        Self {
            mix: config_file.mix.unwrap_or(defaults.mix),
            randomized_group_assignment: config_file
                .randomized_group_assignment
                .unwrap_or(defaults.randomized_group_assignment),
            ees_registered_share: config_file
                .ees_registered_share
                .unwrap_or(defaults.ees_registered_share),
            sss_enabled: config_file.sss_enabled.unwrap_or(defaults.sss_enabled),
            stations: config_file.stations.unwrap_or(defaults.stations),
            terminals: config_file.terminals.unwrap_or(defaults.terminals),
            paths: config_file.paths.unwrap_or(defaults.paths),
            walking: config_file.walking.unwrap_or(defaults.walking),
            deboarding: config_file.deboarding.unwrap_or(defaults.deboarding),
            bus: config_file.bus.unwrap_or(defaults.bus),
            changeover_s: config_file.changeover_s.unwrap_or(defaults.changeover_s),
            service_level: config_file.service_level.unwrap_or(defaults.service_level),
            passbox: config_file.passbox.unwrap_or(defaults.passbox),
            seed: config_file.seed.unwrap_or(defaults.seed),
            series_interval_s: config_file.series_interval_s.or(defaults.series_interval_s),
        }
    }

    /// Apply CLI argument overrides to configuration
    fn apply_cli_overrides(config: &mut Self, args: CliArgs) -> Result<(), ConfigError> {
        if let Some(value) = args.seed {
            config.seed = value;
        }
        for entry in &args.capacities {
            match parse_capacity_override(entry)? {
                (Some(terminal), station, capacity) => config.set_capacity(StationKey::new(terminal, station), capacity),
                (None, station, capacity) => *config = config.with_capacity(station, capacity),
            }
        }
        for entry in &args.disable_sss {
            let terminal: Terminal = entry.parse().map_err(|_| ConfigError::InvalidOverride(entry.clone()))?;
            config.terminals.entry(terminal).or_default().sss_enabled = Some(false);
        }
        if let Some(value) = args.target_wait_s {
            config.service_level.max_wait_s = value;
        }
        if let Some(value) = &args.statistic {
            config.service_level.statistic =
                value.parse().map_err(|_| ConfigError::InvalidOverride(value.clone()))?;
        }
        if let Some(value) = args.lower_bound {
            config.passbox.lower_bound = value;
        }
        if let Some(value) = args.upper_bound {
            config.passbox.upper_bound = value;
        }
        if let Some(value) = args.workers {
            config.passbox.workers = value;
        }
        if let Some(value) = args.probes {
            config.passbox.probes_per_capacity = value;
        }
        Ok(())
    }

    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Print configuration as JSON
    pub fn print_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate the configuration parameters
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        // Group mix
        for group in PassengerGroup::ALL {
            self.validate_percentage(&format!("mix.{}", group), self.mix.share(group))?;
        }
        let sum = self.mix.sum();
        if (sum - 1.0).abs() > MIX_SUM_TOLERANCE {
            return Err(ConfigValidationError::InvalidMixSum { sum });
        }
        self.validate_percentage("ees_registered_share", self.ees_registered_share)?;

        // Stations
        for (kind, station) in self.stations.iter() {
            if station.capacity > MAX_STATION_CAPACITY {
                return Err(ConfigValidationError::InvalidCapacity {
                    station: kind,
                    capacity: station.capacity,
                });
            }
            let all_params = std::iter::once(&station.service_time)
                .chain(station.group_service_times.values())
                .chain(station.unregistered_service_time.iter());
            for params in all_params {
                params.check().map_err(|(field, value)| {
                    ConfigValidationError::NegativeServiceParameter {
                        station: kind,
                        field: field.to_string(),
                        value,
                    }
                })?;
            }
        }

        for terminal in self.terminals.values() {
            for (kind, capacity) in &terminal.capacities {
                if *capacity > MAX_STATION_CAPACITY {
                    return Err(ConfigValidationError::InvalidCapacity { station: *kind, capacity: *capacity });
                }
            }
        }

        // Paths, as each terminal runs them
        for terminal in Terminal::ALL {
            for group in PassengerGroup::ALL {
                let path = self.terminal_path(terminal, group);
                if path.is_empty() {
                    return Err(ConfigValidationError::EmptyProcessPath(group));
                }
                for (i, station) in path.iter().enumerate() {
                    if path[..i].contains(station) {
                        return Err(ConfigValidationError::RepeatedStation { group, station: *station });
                    }
                }
            }
        }

        // Walking
        let speeds =
            std::iter::once(&self.walking.default_speed).chain(self.walking.terminal_speeds.values());
        for speed in speeds {
            Self::validate_walk_speed(speed)?;
        }
        self.validate_duration("walking.default_distance_m", self.walking.default_distance_m)?;
        for (group, dwell) in &self.walking.group_dwell_s {
            self.validate_duration(&format!("walking.group_dwell_s.{}", group), *dwell)?;
        }

        // Deboarding and bus
        self.validate_duration("deboarding.offset_s", self.deboarding.offset_s)?;
        if self.deboarding.delay_min_s > self.deboarding.delay_max_s {
            return Err(ConfigValidationError::InvalidDeboardingRange(
                self.deboarding.delay_min_s,
                self.deboarding.delay_max_s,
            ));
        }
        if self.bus.capacity == 0 {
            return Err(ConfigValidationError::InvalidBusCapacity);
        }
        self.validate_duration("bus.fill_time_s", self.bus.fill_time_s)?;
        self.validate_duration("bus.travel_time_s", self.bus.travel_time_s)?;
        self.validate_duration("changeover_s", self.changeover_s)?;

        // Service level
        self.validate_duration("service_level.max_wait_s", self.service_level.max_wait_s)?;
        if let WaitStatistic::Percentile(p) = self.service_level.statistic {
            if !(p > 0.0 && p <= 100.0) {
                return Err(ConfigValidationError::InvalidPercentile(p));
            }
        }

        // Passbox
        let passbox = &self.passbox;
        if passbox.lower_bound == 0
            || passbox.lower_bound > passbox.upper_bound
            || passbox.upper_bound > MAX_STATION_CAPACITY
        {
            return Err(ConfigValidationError::InvalidSolverBounds {
                lower: passbox.lower_bound,
                upper: passbox.upper_bound,
            });
        }
        for (key, upper) in &passbox.upper_bounds {
            if *upper < passbox.lower_bound || *upper > MAX_STATION_CAPACITY {
                return Err(ConfigValidationError::InvalidTerminalBound {
                    key: *key,
                    lower: passbox.lower_bound,
                    upper: *upper,
                });
            }
        }
        if passbox.max_rounds == 0 {
            return Err(ConfigValidationError::InvalidSolverSetting("max_rounds".to_string()));
        }
        if passbox.probes_per_capacity == 0 {
            return Err(ConfigValidationError::InvalidSolverSetting(
                "probes_per_capacity".to_string(),
            ));
        }
        if passbox.workers == 0 {
            return Err(ConfigValidationError::InvalidSolverSetting("workers".to_string()));
        }

        if let Some(step) = self.series_interval_s {
            if !(step.is_finite() && step > 0.0) {
                return Err(ConfigValidationError::InvalidDuration {
                    field: "series_interval_s".to_string(),
                    value: step,
                });
            }
        }

        Ok(())
    }

    /// Helper method to validate percentage values
    fn validate_percentage(&self, field: &str, value: f64) -> Result<(), ConfigValidationError> {
        if !(0.0..=1.0).contains(&value) {
            return Err(ConfigValidationError::InvalidPercentage {
                field: field.to_string(),
                value,
            });
        }
        Ok(())
    }

    fn validate_duration(&self, field: &str, value: f64) -> Result<(), ConfigValidationError> {
        if !(value.is_finite() && value >= 0.0) {
            return Err(ConfigValidationError::InvalidDuration { field: field.to_string(), value });
        }
        Ok(())
    }

    fn validate_walk_speed(speed: &WalkSpeed) -> Result<(), ConfigValidationError> {
        let checks = [
            ("mean_mps", speed.mean_mps, speed.mean_mps > 0.0),
            ("sd_mps", speed.sd_mps, speed.sd_mps >= 0.0),
            ("floor_mps", speed.floor_mps, speed.floor_mps > 0.0),
        ];
        for (field, value, ok) in checks {
            if !(ok && value.is_finite()) {
                return Err(ConfigValidationError::InvalidWalkSpeed { field: field.to_string(), value });
            }
        }
        Ok(())
    }

    /// Path of a group after applying the global kiosk switch
    pub fn effective_path(&self, group: PassengerGroup) -> Vec<StationKind> {
        Self::without_kiosk(self.paths.get(group), self.sss_enabled)
    }

    /// Path of a group at one terminal, after that terminal's kiosk switch
    pub fn terminal_path(&self, terminal: Terminal, group: PassengerGroup) -> Vec<StationKind> {
        Self::without_kiosk(self.paths.get(group), self.sss_enabled_at(terminal))
    }

    fn without_kiosk(path: &[StationKind], sss_enabled: bool) -> Vec<StationKind> {
        path.iter().copied().filter(|station| sss_enabled || *station != StationKind::Sss).collect()
    }

    /// Whether kiosks are in use at a terminal
    pub fn sss_enabled_at(&self, terminal: Terminal) -> bool {
        self.terminals.get(&terminal).and_then(|t| t.sss_enabled).unwrap_or(self.sss_enabled)
    }

    /// Desk count of one pool: the terminal's own value or the shared one
    pub fn capacity(&self, key: StationKey) -> usize {
        self.terminals
            .get(&key.terminal)
            .and_then(|t| t.capacities.get(&key.station))
            .copied()
            .unwrap_or(self.stations.get(key.station).capacity)
    }

    /// Give one terminal its own desk count for a station kind
    pub fn set_capacity(&mut self, key: StationKey, capacity: usize) {
        self.terminals.entry(key.terminal).or_default().capacities.insert(key.station, capacity);
    }

    /// Configuration of one station
    pub fn station(&self, kind: StationKind) -> &StationConfig {
        self.stations.get(kind)
    }

    /// Mutable configuration of one station
    pub fn station_mut(&mut self, kind: StationKind) -> &mut StationConfig {
        self.stations.get_mut(kind)
    }

    /// Current capacity of every desk pool
    pub fn capacities(&self) -> BTreeMap<StationKey, usize> {
        StationKey::all().map(|key| (key, self.capacity(key))).collect()
    }

    /// Copy of this configuration with one station capacity replaced at both terminals
    pub fn with_capacity(&self, kind: StationKind, capacity: usize) -> Self {
        let mut config = self.clone();
        config.stations.get_mut(kind).capacity = capacity;
        for terminal in config.terminals.values_mut() {
            terminal.capacities.remove(&kind);
        }
        config
    }

    /// Copy of this configuration with one terminal's desk count replaced
    pub fn with_terminal_capacity(&self, terminal: Terminal, kind: StationKind, capacity: usize) -> Self {
        let mut config = self.clone();
        config.set_capacity(StationKey::new(terminal, kind), capacity);
        config
    }

    /// Copy of this configuration with a different seed
    pub fn with_seed(&self, seed: u64) -> Self {
        let mut config = self.clone();
        config.seed = seed;
        config
    }

    /// Stations visited by at least one group path at some terminal
    pub fn used_stations(&self) -> Vec<StationKind> {
        StationKind::ALL
            .into_iter()
            .filter(|station| {
                Terminal::ALL.iter().any(|terminal| {
                    PassengerGroup::ALL.iter().any(|group| self.terminal_path(*terminal, *group).contains(station))
                })
            })
            .collect()
    }
}

/// Parse a `STATION=N` or `TERMINAL/STATION=N` capacity override
fn parse_capacity_override(entry: &str) -> Result<(Option<Terminal>, StationKind, usize), ConfigError> {
    let invalid = || ConfigError::InvalidOverride(entry.to_string());
    let (name, value) = entry.split_once('=').ok_or_else(invalid)?;
    let capacity: usize = value.trim().parse().map_err(|_| invalid())?;
    match name.split_once('/') {
        Some(_) => {
            let key: StationKey = name.trim().parse().map_err(|_| invalid())?;
            Ok((Some(key.terminal), key.station, capacity))
        }
        None => Ok((None, name.trim().parse().map_err(|_| invalid())?, capacity)),
    }
}

impl OutputFormat {
    /// Output format requested on the command line, defaulting to a summary
    pub fn from_cli(value: Option<&str>) -> Result<Self, String> {
        value.map(str::parse).unwrap_or(Ok(OutputFormat::Summary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_args() -> CliArgs {
        CliArgs {
            config: None,
            flights: None,
            seed: None,
            until_min: None,
            capacities: Vec::new(),
            disable_sss: Vec::new(),
            target_wait_s: None,
            statistic: None,
            passbox: false,
            lower_bound: None,
            upper_bound: None,
            workers: None,
            probes: None,
            output: None,
            output_format: None,
            verbose: false,
            debug: false,
            log_json: false,
            log_dir: None,
            dry_run: false,
            print_config: false,
        }
    }

    #[test]
    fn test_simulation_config_default() {
        let config = SimulationConfig::default();

        assert_eq!(config.stations.sss.capacity, 6);
        assert_eq!(config.stations.easypass.capacity, 8);
        assert_eq!(config.stations.eu.capacity, 2);
        assert_eq!(config.stations.tcn.capacity, 6);
        assert!((config.mix.sum() - 1.0).abs() < 1e-9);
        assert_eq!(config.seed, 42);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_capacity_override_parsing() {
        let mut args = empty_args();
        args.capacities = vec!["TCN=3".to_string(), "eu = 5".to_string()];
        args.seed = Some(9);

        let config = SimulationConfig::from_cli_args(args).unwrap();
        assert_eq!(config.stations.tcn.capacity, 3);
        assert_eq!(config.stations.eu.capacity, 5);
        assert_eq!(config.seed, 9);
    }

    #[test]
    fn test_capacity_override_rejects_garbage() {
        let mut args = empty_args();
        args.capacities = vec!["TCN:3".to_string()];
        assert!(matches!(
            SimulationConfig::from_cli_args(args),
            Err(ConfigError::InvalidOverride(_))
        ));
    }

    #[test]
    fn test_service_level_overrides() {
        let mut args = empty_args();
        args.target_wait_s = Some(300.0);
        args.statistic = Some("max".to_string());
        args.workers = Some(4);

        let config = SimulationConfig::from_cli_args(args).unwrap();
        assert_eq!(config.service_level.max_wait_s, 300.0);
        assert_eq!(config.service_level.statistic, WaitStatistic::Max);
        assert_eq!(config.passbox.workers, 4);
    }

    #[test]
    fn test_validation_mix_sum() {
        let mut config = SimulationConfig::default();
        config.mix.easypass = 0.6;

        match config.validate() {
            Err(ConfigValidationError::InvalidMixSum { sum }) => {
                assert!((sum - 1.11).abs() < 1e-9);
            }
            other => panic!("Expected InvalidMixSum error, got {:?}", other),
        }
    }

    #[test]
    fn test_validation_negative_service_parameter() {
        let mut config = SimulationConfig::default();
        config.stations.eu.service_time = ServiceTimeParams::Normal { mean_s: -3.0, sd_s: 1.0 };

        match config.validate() {
            Err(ConfigValidationError::NegativeServiceParameter { station, field, value }) => {
                assert_eq!(station, StationKind::Eu);
                assert_eq!(field, "mean_s");
                assert_eq!(value, -3.0);
            }
            other => panic!("Expected NegativeServiceParameter error, got {:?}", other),
        }
    }

    #[test]
    fn test_validation_capacity_limit() {
        let config = SimulationConfig::default().with_capacity(StationKind::Tcn, MAX_STATION_CAPACITY + 1);
        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::InvalidCapacity { station: StationKind::Tcn, .. })
        ));
    }

    #[test]
    fn test_validation_paths() {
        let mut config = SimulationConfig::default();
        config.paths.set(PassengerGroup::EuManual, vec![StationKind::Eu, StationKind::Eu]);
        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::RepeatedStation { group: PassengerGroup::EuManual, .. })
        ));

        let mut config = SimulationConfig::default();
        config.paths.set(PassengerGroup::TcnV, vec![StationKind::Sss]);
        config.sss_enabled = false;
        assert_eq!(
            config.validate(),
            Err(ConfigValidationError::EmptyProcessPath(PassengerGroup::TcnV))
        );
    }

    #[test]
    fn test_validation_solver_bounds() {
        let mut config = SimulationConfig::default();
        config.passbox.lower_bound = 0;
        assert!(matches!(config.validate(), Err(ConfigValidationError::InvalidSolverBounds { .. })));

        config.passbox.lower_bound = 8;
        config.passbox.upper_bound = 4;
        assert!(matches!(config.validate(), Err(ConfigValidationError::InvalidSolverBounds { .. })));

        let mut config = SimulationConfig::default();
        config.passbox.workers = 0;
        assert!(matches!(config.validate(), Err(ConfigValidationError::InvalidSolverSetting(_))));
    }

    #[test]
    fn test_validation_percentile() {
        let mut config = SimulationConfig::default();
        config.service_level.statistic = WaitStatistic::Percentile(0.0);
        assert_eq!(config.validate(), Err(ConfigValidationError::InvalidPercentile(0.0)));
    }

    #[test]
    fn test_effective_path_drops_kiosk_when_disabled() {
        let mut config = SimulationConfig::default();
        assert_eq!(config.effective_path(PassengerGroup::TcnV), vec![StationKind::Sss, StationKind::Tcn]);
        config.sss_enabled = false;
        assert_eq!(config.effective_path(PassengerGroup::TcnV), vec![StationKind::Tcn]);
        assert!(!config.used_stations().contains(&StationKind::Sss));
    }

    #[test]
    fn test_config_file_loading() {
        use std::io::Write;

        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{ "seed": 7, "changeover_s": 5.0, "ees_registered_share": 0.5 }}"#
        )
        .unwrap();

        let config = SimulationConfig::from_file(file.path()).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.changeover_s, 5.0);
        assert_eq!(config.ees_registered_share, 0.5);
        assert_eq!(config.stations, StationTable::default());
    }

    #[test]
    fn test_config_file_unsupported_format() {
        let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        assert!(matches!(
            SimulationConfig::from_file(file.path()),
            Err(ConfigError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            SimulationConfig::from_file("/definitely/not/here.json"),
            Err(ConfigError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_simulation_config_serialization_roundtrip() {
        let config = SimulationConfig::default();
        let json = config.print_json().unwrap();
        let back: SimulationConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_with_capacity_leaves_original_untouched() {
        let config = SimulationConfig::default();
        let changed = config.with_capacity(StationKind::Eu, 7);
        assert_eq!(config.stations.eu.capacity, 2);
        assert_eq!(changed.stations.eu.capacity, 7);
        assert_eq!(changed.capacities()[&StationKey::new(Terminal::T1, StationKind::Eu)], 7);
        assert_eq!(changed.capacities()[&StationKey::new(Terminal::T2, StationKind::Eu)], 7);
    }

    #[test]
    fn test_terminal_capacities_override_shared_table() {
        let t1_tcn = StationKey::new(Terminal::T1, StationKind::Tcn);
        let t2_tcn = StationKey::new(Terminal::T2, StationKind::Tcn);
        let config = SimulationConfig::default().with_terminal_capacity(Terminal::T1, StationKind::Tcn, 3);

        assert_eq!(config.capacity(t1_tcn), 3);
        assert_eq!(config.capacity(t2_tcn), 6);
        assert_eq!(config.capacities().len(), StationKey::COUNT);
        assert!(config.validate().is_ok());

        // an airport-wide change drops the terminal's own value
        let shared = config.with_capacity(StationKind::Tcn, 9);
        assert_eq!(shared.capacity(t1_tcn), 9);
        assert_eq!(shared.capacity(t2_tcn), 9);

        let too_many = config.with_terminal_capacity(Terminal::T2, StationKind::Eu, MAX_STATION_CAPACITY + 1);
        assert!(matches!(
            too_many.validate(),
            Err(ConfigValidationError::InvalidCapacity { station: StationKind::Eu, .. })
        ));
    }

    #[test]
    fn test_kiosk_switch_per_terminal() {
        let mut config = SimulationConfig::default();
        config.terminals.entry(Terminal::T2).or_default().sss_enabled = Some(false);

        assert!(config.sss_enabled_at(Terminal::T1));
        assert!(!config.sss_enabled_at(Terminal::T2));
        assert_eq!(config.terminal_path(Terminal::T1, PassengerGroup::TcnV), vec![StationKind::Sss, StationKind::Tcn]);
        assert_eq!(config.terminal_path(Terminal::T2, PassengerGroup::TcnV), vec![StationKind::Tcn]);
        assert!(config.used_stations().contains(&StationKind::Sss));

        config.paths.set(PassengerGroup::TcnV, vec![StationKind::Sss]);
        assert_eq!(config.validate(), Err(ConfigValidationError::EmptyProcessPath(PassengerGroup::TcnV)));
    }

    #[test]
    fn test_terminal_overrides_on_the_command_line() {
        let mut args = empty_args();
        args.capacities = vec!["T1/TCN=3".to_string(), "eu=5".to_string()];
        args.disable_sss = vec!["T2".to_string()];

        let config = SimulationConfig::from_cli_args(args).unwrap();
        assert_eq!(config.capacity(StationKey::new(Terminal::T1, StationKind::Tcn)), 3);
        assert_eq!(config.capacity(StationKey::new(Terminal::T2, StationKind::Tcn)), 6);
        assert_eq!(config.capacity(StationKey::new(Terminal::T1, StationKind::Eu)), 5);
        assert!(!config.sss_enabled_at(Terminal::T2));

        let mut args = empty_args();
        args.capacities = vec!["T3/TCN=3".to_string()];
        assert!(matches!(SimulationConfig::from_cli_args(args), Err(ConfigError::InvalidOverride(_))));
    }

    #[test]
    fn test_terminal_solver_bounds() {
        let config = SimulationConfig::default();
        assert_eq!(config.passbox.upper_bound_for(StationKey::new(Terminal::T1, StationKind::Tcn)), 6);
        assert_eq!(config.passbox.upper_bound_for(StationKey::new(Terminal::T2, StationKind::Tcn)), 8);
        assert_eq!(config.passbox.upper_bound_for(StationKey::new(Terminal::T1, StationKind::Eu)), 10);

        let mut config = SimulationConfig::default();
        config.passbox.lower_bound = 7;
        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::InvalidTerminalBound { upper: 6, .. })
        ));
    }

    #[test]
    fn test_terminals_from_config_file() {
        use std::io::Write;

        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{ "terminals": {{ "T1": {{ "capacities": {{ "SSS": 4, "EASYPASS": 4 }}, "sss_enabled": true }} }} }}"#
        )
        .unwrap();

        let config = SimulationConfig::from_file(file.path()).unwrap();
        assert_eq!(config.capacity(StationKey::new(Terminal::T1, StationKind::Sss)), 4);
        assert_eq!(config.capacity(StationKey::new(Terminal::T2, StationKind::Sss)), 6);
        assert_eq!(config.capacity(StationKey::new(Terminal::T1, StationKind::Easypass)), 4);
    }
}
