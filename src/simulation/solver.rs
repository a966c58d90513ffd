//! Capacity search ("Passbox" mode)
//!
//! The [`CapacitySolver`] repeats full simulation runs with different station
//! capacities to find, per desk pool (station kind at one terminal), the
//! smallest capacity whose wait statistic meets the service-level target. The
//! search assumes the statistic does not increase with capacity.
//!
//! Each pool is bisected over `(lower_bound - 1, upper]` once the upper bound
//! itself is known to be feasible; capacities below the lower bound count as
//! infeasible without a run.
//!
//! Passengers are expanded once per replicate seed and reused for every
//! candidate, and service times come from per-passenger streams, so runs at
//! different capacities see the same demand. Candidates evaluated in parallel
//! are merged back in capacity order, which keeps the search path independent
//! of the worker count.

use crate::flight::{AirportLookup, Flight};
use crate::passenger::{Expansion, PassengerFactory};
use crate::simulation::engine::Simulation;
use crate::simulation::error::SimulationResult;
use crate::simulation::metrics::RunResult;
use crate::simulation::statistics;
use crate::types::{PassengerGroup, SimulationConfig, SolveMode, StationKey, StationKind, Terminal};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::{debug, info, instrument, warn};

/// Outcome of a capacity search
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PassboxStatus {
    /// Every solved station meets the target
    Converged,
    /// Some desk pools miss the target even at their upper bound
    Infeasible {
        /// Pools that cannot meet the target
        stations: Vec<StationKey>,
    },
    /// The round-robin search hit its pass limit before reaching a fixed point
    NotConverged {
        /// Passes performed
        rounds: usize,
    },
}

/// One evaluated candidate capacity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeRecord {
    /// Round-robin pass (1 for independent searches)
    pub round: usize,
    /// Desk pool whose capacity was varied
    pub station: StationKey,
    /// Candidate capacity
    pub capacity: usize,
    /// Statistic measured in each replicate run
    pub replicate_values: Vec<f64>,
    /// Mean over the replicates, compared against the target
    pub aggregate_s: f64,
    /// Whether the aggregate meets the target
    pub feasible: bool,
}

/// Search result for one desk pool
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StationSolution {
    /// Desk pool
    pub station: StationKey,
    /// Minimal feasible capacity, or the upper bound when infeasible
    pub capacity: usize,
    /// Whether the target is met at `capacity`
    pub feasible: bool,
    /// Aggregated statistic at `capacity`
    pub statistic_s: f64,
}

/// Everything a capacity search produced
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PassboxReport {
    /// Search outcome
    pub status: PassboxStatus,
    /// Capacities of all desk pools after the search
    pub capacities: BTreeMap<StationKey, usize>,
    /// Latest solution per solved pool
    pub solutions: Vec<StationSolution>,
    /// Every evaluated candidate, in evaluation order
    pub probes: Vec<ProbeRecord>,
    /// Run at the resulting capacities with the base seed
    pub final_run: RunResult,
}

impl PassboxReport {
    /// Whether a usable capacity set was found
    pub fn is_converged(&self) -> bool {
        self.status == PassboxStatus::Converged
    }

    /// Solution of one desk pool
    pub fn solution(&self, station: StationKey) -> Option<&StationSolution> {
        self.solutions.iter().find(|solution| solution.station == station)
    }

    /// Generate a summary of the search
    pub fn generate_summary_report(&self) -> String {
        let mut report = String::new();

        report.push_str("=== Passbox Capacity Search ===\n\n");
        let status = match &self.status {
            PassboxStatus::Converged => "converged".to_string(),
            PassboxStatus::Infeasible { stations } => format!(
                "infeasible ({})",
                stations.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
            ),
            PassboxStatus::NotConverged { rounds } => format!("not converged after {} rounds", rounds),
        };
        report.push_str(&format!("Status: {}\n", status));
        report.push_str(&format!("Runs evaluated: {}\n\n", self.probes.len()));

        report.push_str("Capacities:\n");
        for solution in &self.solutions {
            report.push_str(&format!(
                "  • {:<9} {:>3} desks  statistic {:.1} min{}\n",
                solution.station.to_string(),
                solution.capacity,
                solution.statistic_s / 60.0,
                if solution.feasible { "" } else { "  (target missed)" }
            ));
        }

        report
    }
}

impl fmt::Display for PassboxReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.generate_summary_report())
    }
}

/// Minimal-capacity search over full simulation runs
#[derive(Debug)]
pub struct CapacitySolver<'a> {
    config: SimulationConfig,
    lookup: &'a dyn AirportLookup,
}

impl<'a> CapacitySolver<'a> {
    /// Validate a configuration and prepare a search
    pub fn new(config: SimulationConfig, lookup: &'a dyn AirportLookup) -> SimulationResult<Self> {
        config.validate()?;
        Ok(Self { config, lookup })
    }

    /// Station kinds the search varies
    pub fn stations(&self) -> Vec<StationKind> {
        if self.config.passbox.stations.is_empty() {
            self.config.used_stations()
        } else {
            self.config.passbox.stations.clone()
        }
    }

    /// Desk pools the search varies: the station kinds at every terminal whose
    /// passengers are routed through them
    pub fn pools(&self, expansions: &[Expansion]) -> Vec<StationKey> {
        let demand: BTreeSet<(Terminal, PassengerGroup)> = expansions
            .iter()
            .flat_map(|expansion| &expansion.passengers)
            .map(|p| (p.terminal, p.group))
            .collect();
        let kinds = self.stations();

        Terminal::ALL
            .into_iter()
            .flat_map(|terminal| kinds.iter().map(move |kind| StationKey::new(terminal, *kind)))
            .filter(|key| {
                demand.iter().any(|(terminal, group)| {
                    *terminal == key.terminal && self.config.terminal_path(*terminal, *group).contains(&key.station)
                })
            })
            .collect()
    }

    /// Search the minimal capacities for a flight schedule
    #[instrument(
        name = "passbox_solve",
        skip_all,
        fields(mode = ?self.config.passbox.mode, flights = flights.len(), workers = self.config.passbox.workers)
    )]
    pub fn solve(&self, flights: &[Flight], until_s: Option<f64>) -> SimulationResult<PassboxReport> {
        let passbox = &self.config.passbox;
        let pool = ThreadPoolBuilder::new().num_threads(passbox.workers).build()?;

        let expansions = (0..passbox.probes_per_capacity)
            .map(|replicate| {
                let config = self.config.with_seed(replicate_seed(self.config.seed, replicate));
                PassengerFactory::new(&config, self.lookup).expand(flights)
            })
            .collect::<SimulationResult<Vec<_>>>()?;

        let stations = self.pools(&expansions);
        let mut search = Search {
            config: &self.config,
            lookup: self.lookup,
            expansions,
            until_s,
            pool,
            probes: Vec::new(),
        };

        info!(
            stations = %stations.iter().map(ToString::to_string).collect::<Vec<_>>().join(","),
            lower = passbox.lower_bound,
            upper = passbox.upper_bound,
            "Starting capacity search"
        );

        let mut capacities = self.config.capacities();
        let mut solutions: BTreeMap<StationKey, StationSolution> = BTreeMap::new();
        let status = match passbox.mode {
            SolveMode::Independent => {
                let base = capacities.clone();
                for station in &stations {
                    let solution = search.station(1, &base, *station)?;
                    capacities.insert(*station, solution.capacity);
                    solutions.insert(*station, solution);
                }
                outcome(&solutions)
            }
            SolveMode::RoundRobin => {
                let mut fixed_point = None;
                for round in 1..=passbox.max_rounds {
                    let mut changed = false;
                    for station in &stations {
                        let solution = search.station(round, &capacities, *station)?;
                        if capacities.insert(*station, solution.capacity) != Some(solution.capacity) {
                            changed = true;
                        }
                        solutions.insert(*station, solution);
                    }
                    debug!(round, changed, capacities = ?capacities, "Round-robin pass finished");
                    if !changed {
                        fixed_point = Some(outcome(&solutions));
                        break;
                    }
                }
                fixed_point.unwrap_or(PassboxStatus::NotConverged { rounds: passbox.max_rounds })
            }
        };

        match &status {
            PassboxStatus::Converged => info!(capacities = ?capacities, "Capacity search converged"),
            PassboxStatus::Infeasible { stations } => {
                warn!(stations = ?stations, "Target not met at the upper bound")
            }
            PassboxStatus::NotConverged { rounds } => {
                warn!(rounds, capacities = ?capacities, "Capacity search did not reach a fixed point")
            }
        }

        let final_run = search.run(&capacities, 0)?;
        Ok(PassboxReport {
            status,
            capacities,
            solutions: stations.iter().filter_map(|station| solutions.get(station).copied()).collect(),
            probes: search.probes,
            final_run,
        })
    }
}

/// Seed of a noise replicate
fn replicate_seed(seed: u64, replicate: usize) -> u64 {
    seed.wrapping_add(replicate as u64)
}

fn outcome(solutions: &BTreeMap<StationKey, StationSolution>) -> PassboxStatus {
    let infeasible: Vec<StationKey> =
        solutions.values().filter(|solution| !solution.feasible).map(|solution| solution.station).collect();
    if infeasible.is_empty() {
        PassboxStatus::Converged
    } else {
        PassboxStatus::Infeasible { stations: infeasible }
    }
}

/// Capacities strictly between `lo` and `hi`, at most `width` of them, evenly spaced
fn interior_candidates(lo: usize, hi: usize, width: usize) -> Vec<usize> {
    let gap = hi - lo;
    let count = width.clamp(1, gap - 1);
    let mut candidates: Vec<usize> = (1..=count).map(|i| lo + i * gap / (count + 1)).collect();
    candidates.dedup();
    candidates
}

struct Search<'s> {
    config: &'s SimulationConfig,
    lookup: &'s dyn AirportLookup,
    expansions: Vec<Expansion>,
    until_s: Option<f64>,
    pool: ThreadPool,
    probes: Vec<ProbeRecord>,
}

impl Search<'_> {
    /// Apply `f` to every item, on the worker pool unless it has a single worker
    fn map<T, R, F>(&self, items: &[T], f: F) -> Vec<R>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> R + Sync + Send,
    {
        if self.pool.current_num_threads() <= 1 {
            items.iter().map(f).collect()
        } else {
            self.pool.install(|| items.par_iter().map(f).collect())
        }
    }

    /// One full run at the given capacities with a replicate's passengers
    fn run(&self, capacities: &BTreeMap<StationKey, usize>, replicate: usize) -> SimulationResult<RunResult> {
        let mut config = self.config.with_seed(replicate_seed(self.config.seed, replicate));
        for (station, capacity) in capacities {
            config.set_capacity(*station, *capacity);
        }
        let expansion = self.expansions[replicate].clone();
        Simulation::new(config, self.lookup)?.run_expansion(expansion, self.until_s)
    }

    /// Evaluate candidate capacities of one pool, results in candidate order
    fn probe(
        &mut self,
        round: usize,
        base: &BTreeMap<StationKey, usize>,
        station: StationKey,
        candidates: &[usize],
    ) -> SimulationResult<Vec<ProbeRecord>> {
        let statistic = self.config.service_level.statistic;
        let target = &self.config.service_level;
        let replicates: Vec<usize> = (0..self.expansions.len()).collect();

        let records = self
            .map(candidates, |capacity| -> SimulationResult<ProbeRecord> {
                let mut capacities = base.clone();
                capacities.insert(station, *capacity);
                let replicate_values = self
                    .map(&replicates, |replicate| {
                        self.run(&capacities, *replicate)
                            .map(|result| statistics::pool_statistic(&result, station, statistic))
                    })
                    .into_iter()
                    .collect::<SimulationResult<Vec<f64>>>()?;
                let aggregate_s = statistics::mean(&replicate_values).unwrap_or(0.0);
                Ok(ProbeRecord {
                    round,
                    station,
                    capacity: *capacity,
                    feasible: target.is_met_by(aggregate_s),
                    replicate_values,
                    aggregate_s,
                })
            })
            .into_iter()
            .collect::<SimulationResult<Vec<_>>>()?;

        for record in &records {
            debug!(
                station = %record.station,
                capacity = record.capacity,
                statistic_s = record.aggregate_s,
                feasible = record.feasible,
                "Probe evaluated"
            );
        }
        self.probes.extend(records.iter().cloned());
        Ok(records)
    }

    fn probe_one(
        &mut self,
        round: usize,
        base: &BTreeMap<StationKey, usize>,
        station: StationKey,
        capacity: usize,
    ) -> SimulationResult<ProbeRecord> {
        let mut records = self.probe(round, base, station, &[capacity])?;
        Ok(records.remove(0))
    }

    /// Smallest feasible capacity of one pool with the others held at `base`
    fn station(
        &mut self,
        round: usize,
        base: &BTreeMap<StationKey, usize>,
        station: StationKey,
    ) -> SimulationResult<StationSolution> {
        let mut hi = self.config.passbox.upper_bound_for(station);
        let width = self.config.passbox.workers;

        let top = self.probe_one(round, base, station, hi)?;
        if !top.feasible {
            return Ok(StationSolution { station, capacity: hi, feasible: false, statistic_s: top.aggregate_s });
        }
        let mut best = top;

        // lower_bound >= 1, so lo never underflows; lo itself is never run
        let mut lo = self.config.passbox.lower_bound - 1;
        while hi - lo > 1 {
            let records = self.probe(round, base, station, &interior_candidates(lo, hi, width))?;
            check_monotonic(station, &records);

            if let Some(first) = records.iter().find(|record| record.feasible) {
                hi = first.capacity;
                best = first.clone();
            }
            lo = records
                .iter()
                .filter(|record| !record.feasible && record.capacity < hi)
                .map(|record| record.capacity)
                .max()
                .unwrap_or(lo)
                .max(lo);
        }

        debug!(station = %station, capacity = hi, "Station search narrowed");
        Ok(solution(&best))
    }
}

fn solution(record: &ProbeRecord) -> StationSolution {
    StationSolution {
        station: record.station,
        capacity: record.capacity,
        feasible: record.feasible,
        statistic_s: record.aggregate_s,
    }
}

/// Warn when a larger capacity performed worse than a smaller one
fn check_monotonic(station: StationKey, records: &[ProbeRecord]) {
    for pair in records.windows(2) {
        if pair[0].feasible && !pair[1].feasible {
            warn!(
                station = %station,
                feasible_at = pair[0].capacity,
                infeasible_at = pair[1].capacity,
                "Wait statistic not monotonic in capacity; consider more probes per capacity"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flight::StaticAirportLookup;
    use crate::types::{GroupMix, ServiceTimeParams, WaitStatistic};
    use chrono::{TimeZone, Utc};

    fn eu_only_config() -> SimulationConfig {
        let mut config = SimulationConfig::default();
        config.mix = GroupMix { easypass: 0.0, eu_manual: 1.0, tcn_at: 0.0, tcn_v: 0.0 };
        config.station_mut(StationKind::Eu).service_time = ServiceTimeParams::Fixed { seconds: 60.0 };
        config.service_level.statistic = WaitStatistic::Max;
        config.service_level.max_wait_s = 300.0;
        config.passbox.stations = vec![StationKind::Eu];
        config.passbox.mode = SolveMode::Independent;
        config
    }

    fn t2_eu() -> StationKey {
        StationKey::new(Terminal::T2, StationKind::Eu)
    }

    fn flights(pax: u32) -> (StaticAirportLookup, Vec<Flight>) {
        let mut lookup = StaticAirportLookup::new();
        lookup.insert_distance("A1", 100.0);
        let block_in = Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap();
        (lookup, vec![Flight::new("LH100", block_in, "A1", "A320").with_actual_pax(pax)])
    }

    #[test]
    fn test_interior_candidates() {
        assert_eq!(interior_candidates(1, 10, 1), vec![5]);
        assert_eq!(interior_candidates(1, 3, 4), vec![2]);
        assert_eq!(interior_candidates(0, 8, 3), vec![2, 4, 6]);
    }

    #[test]
    fn test_finds_minimal_capacity() {
        let (lookup, flights) = flights(120);
        let solver = CapacitySolver::new(eu_only_config(), &lookup).unwrap();
        let report = solver.solve(&flights, None).unwrap();

        assert!(report.is_converged());
        let capacity = report.capacities[&t2_eu()];
        assert!((1..=10).contains(&capacity));
        assert!(report.solution(t2_eu()).unwrap().statistic_s <= 300.0);

        if capacity > 1 {
            let below = report
                .probes
                .iter()
                .find(|probe| probe.capacity == capacity - 1)
                .expect("capacity below the solution was probed");
            assert!(!below.feasible);
        }
    }

    #[test]
    fn test_infeasible_at_upper_bound() {
        let (lookup, flights) = flights(150);
        let mut config = eu_only_config();
        config.passbox.upper_bound = 2;
        config.service_level.max_wait_s = 10.0;
        let report = CapacitySolver::new(config, &lookup).unwrap().solve(&flights, None).unwrap();

        assert_eq!(report.status, PassboxStatus::Infeasible { stations: vec![t2_eu()] });
        assert_eq!(report.probes.len(), 1);
        assert_eq!(report.capacities[&t2_eu()], 2);
    }

    #[test]
    fn test_single_capacity_range_runs_once() {
        let (lookup, flights) = flights(40);
        let mut config = eu_only_config();
        config.passbox.lower_bound = 4;
        config.passbox.upper_bound = 4;
        let report = CapacitySolver::new(config, &lookup).unwrap().solve(&flights, None).unwrap();

        assert_eq!(report.probes.len(), 1);
        assert_eq!(report.capacities[&t2_eu()], 4);
    }

    #[test]
    fn test_bisection_never_runs_below_lower_bound() {
        let (lookup, flights) = flights(40);
        let mut config = eu_only_config();
        config.passbox.lower_bound = 3;
        config.service_level.max_wait_s = 1.0e6;
        let report = CapacitySolver::new(config, &lookup).unwrap().solve(&flights, None).unwrap();

        assert!(report.is_converged());
        assert_eq!(report.capacities[&t2_eu()], 3);
        assert!(report.probes.iter().all(|probe| probe.capacity >= 3));
        // upper bound, then bisection of (2, 10]
        assert_eq!(report.probes[0].capacity, 10);
        assert!(report.probes.len() <= 1 + 3);
        assert!(report.probes.iter().any(|probe| probe.capacity == 3));
    }

    #[test]
    fn test_worker_count_does_not_change_result() {
        let (lookup, flights) = flights(120);
        let sequential = CapacitySolver::new(eu_only_config(), &lookup).unwrap().solve(&flights, None).unwrap();

        let mut config = eu_only_config();
        config.passbox.workers = 3;
        let parallel = CapacitySolver::new(config, &lookup).unwrap().solve(&flights, None).unwrap();

        assert_eq!(sequential.capacities, parallel.capacities);
        assert_eq!(sequential.final_run, parallel.final_run);
    }

    #[test]
    fn test_round_robin_reaches_fixed_point() {
        let (lookup, flights) = flights(80);
        let mut config = eu_only_config();
        config.mix = GroupMix { easypass: 0.5, eu_manual: 0.5, tcn_at: 0.0, tcn_v: 0.0 };
        config.passbox.stations = Vec::new();
        config.passbox.mode = SolveMode::RoundRobin;
        let solver = CapacitySolver::new(config, &lookup).unwrap();
        let report = solver.solve(&flights, None).unwrap();

        assert!(report.is_converged());
        // only pools with routed passengers are searched
        let pools: Vec<StationKey> = report.solutions.iter().map(|solution| solution.station).collect();
        assert_eq!(
            pools,
            vec![StationKey::new(Terminal::T2, StationKind::Easypass), t2_eu()]
        );
        assert!(solver.stations().contains(&StationKind::Tcn));
        assert_eq!(report.probes.last().map(|probe| probe.round), Some(2));
        assert_eq!(report.final_run.passengers.len(), 80);
        assert!(report.final_run.passengers.iter().all(|p| p.group != PassengerGroup::TcnV));
    }

    #[test]
    fn test_replicates_use_consecutive_seeds() {
        let (lookup, flights) = flights(60);
        let mut config = eu_only_config();
        config.station_mut(StationKind::Eu).service_time = ServiceTimeParams::Exponential { mean_s: 60.0 };
        config.passbox.probes_per_capacity = 3;
        let report = CapacitySolver::new(config, &lookup).unwrap().solve(&flights, None).unwrap();

        for probe in &report.probes {
            assert_eq!(probe.replicate_values.len(), 3);
            let mean = probe.replicate_values.iter().sum::<f64>() / 3.0;
            assert!((probe.aggregate_s - mean).abs() < 1e-9);
        }
    }
}
