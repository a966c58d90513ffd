//! Single-run simulation engine
//!
//! A [`Simulation`] expands flights into passengers, builds the stations of the
//! configuration and drives every passenger through its process path on one
//! virtual timeline. Each terminal runs its own desk pools: a passenger only
//! ever queues at the stations of the terminal its flight is processed at.
//! Nothing is shared between runs: each call to [`Simulation::run`] owns its
//! passengers, stations, queue and metrics.

use crate::flight::{AirportLookup, Flight};
use crate::passenger::{Expansion, Passenger, PassengerFactory, PassengerState, ProcessPaths};
use crate::simulation::error::{SimulationError, SimulationResult};
use crate::simulation::metrics::{MetricsCollector, RunResult, RunStatus};
use crate::simulation::progress::RunProgress;
use crate::simulation::random::RandomStreamProvider;
use crate::simulation::scheduler::{EventKind, Scheduler};
use crate::station::{AcquireOutcome, ResourceStation};
use crate::types::{ConfigValidationError, PassengerId, SimulationConfig, StationKey, Terminal};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, instrument, warn};

/// A configured checkpoint ready to simulate flight schedules
#[derive(Debug)]
pub struct Simulation<'a> {
    config: SimulationConfig,
    lookup: &'a dyn AirportLookup,
    progress: RunProgress,
}

impl<'a> Simulation<'a> {
    /// Validate a configuration and prepare a simulation
    pub fn new(config: SimulationConfig, lookup: &'a dyn AirportLookup) -> SimulationResult<Self> {
        config.validate()?;
        Ok(Self { config, lookup, progress: RunProgress::new() })
    }

    /// Report progress through an existing handle
    pub fn with_progress(mut self, progress: RunProgress) -> Self {
        self.progress = progress;
        self
    }

    /// Handle for observing run progress from another thread
    pub fn progress(&self) -> RunProgress {
        self.progress.clone()
    }

    /// Configuration this simulation runs with
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Simulate a flight schedule
    ///
    /// `until_s` cuts the run at a horizon (seconds after the earliest block-in);
    /// passengers still in the process are then reported as incomplete.
    #[instrument(name = "simulation_run", skip_all, fields(seed = self.config.seed, flights = flights.len()))]
    pub fn run(&self, flights: &[Flight], until_s: Option<f64>) -> SimulationResult<RunResult> {
        let expansion = PassengerFactory::new(&self.config, self.lookup).expand(flights)?;
        self.run_expansion(expansion, until_s)
    }

    /// Simulate an already expanded passenger set
    pub fn run_expansion(&self, expansion: Expansion, until_s: Option<f64>) -> SimulationResult<RunResult> {
        if let Some(until) = until_s {
            if !(until.is_finite() && until >= 0.0) {
                return Err(ConfigValidationError::InvalidDuration { field: "until".to_string(), value: until }.into());
            }
        }
        for (index, passenger) in expansion.passengers.iter().enumerate() {
            if passenger.id.index() != index {
                return Err(SimulationError::input_error(format!(
                    "passenger {} stored at position {}",
                    passenger.id, index
                )));
            }
        }

        let paths = [
            ProcessPaths::for_terminal(&self.config, Terminal::T1)?,
            ProcessPaths::for_terminal(&self.config, Terminal::T2)?,
        ];
        let stations = StationKey::all()
            .map(|key| {
                ResourceStation::from_config(key.station, self.config.station(key.station))
                    .map(|station| station.with_capacity(self.config.capacity(key)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        check_liveness(&paths, &stations, &expansion.passengers)?;

        crate::sim_event!(
            info,
            "Starting checkpoint run",
            passengers = expansion.passengers.len(),
            fallback_flights = expansion.fallback_flights,
            horizon_s = until_s.unwrap_or(f64::INFINITY),
        );

        let metrics = MetricsCollector::new(expansion.t0, &expansion.passengers, &self.config.capacities());
        let mut run = CheckpointRun {
            passengers: &expansion.passengers,
            paths: &paths,
            stations,
            states: vec![PassengerState::NotArrived; expansion.passengers.len()],
            steps: vec![0; expansion.passengers.len()],
            service_rngs: vec![None; expansion.passengers.len()],
            streams: RandomStreamProvider::new(self.config.seed),
            changeover_s: self.config.changeover_s,
            scheduler: Scheduler::new(),
            metrics,
            progress: &self.progress,
        };
        run.execute(until_s)?;
        let result = run.finish(until_s);

        match result.status {
            RunStatus::Completed => {
                crate::sim_event!(
                    info,
                    "Checkpoint run completed",
                    passengers = result.passengers.len(),
                    events = result.events_processed,
                );
            }
            RunStatus::Incomplete { passengers } => {
                warn!(incomplete = passengers, horizon_s = ?until_s, "Horizon reached before all passengers finished")
            }
        }
        Ok(result)
    }
}

/// Fail when a desk pool that cannot serve anyone has passengers routed to it
fn check_liveness(
    paths: &[ProcessPaths; 2],
    stations: &[ResourceStation],
    passengers: &[Passenger],
) -> SimulationResult<()> {
    let empty = StationKey::all().zip(stations).filter(|(_, station)| station.capacity() == 0);
    for (key, _) in empty {
        let paths = &paths[key.terminal.index()];
        let routed: Vec<&Passenger> = passengers
            .iter()
            .filter(|p| p.terminal == key.terminal && paths.get(p.group).visits(key.station))
            .collect();
        if let Some(first) = routed.first() {
            let group = paths
                .groups_visiting(key.station)
                .find(|group| routed.iter().any(|p| p.group == *group))
                .unwrap_or(first.group);
            return Err(SimulationError::liveness_error(key, group, routed.len()));
        }
    }
    Ok(())
}

/// Mutable state of one run
struct CheckpointRun<'r> {
    passengers: &'r [Passenger],
    paths: &'r [ProcessPaths; 2],
    stations: Vec<ResourceStation>,
    states: Vec<PassengerState>,
    steps: Vec<usize>,
    service_rngs: Vec<Option<ChaCha8Rng>>,
    streams: RandomStreamProvider,
    changeover_s: f64,
    scheduler: Scheduler,
    metrics: MetricsCollector,
    progress: &'r RunProgress,
}

impl CheckpointRun<'_> {
    fn execute(&mut self, until_s: Option<f64>) -> SimulationResult<()> {
        let _span = crate::perf_span!("checkpoint_events", passengers = self.passengers.len()).entered();
        self.progress.start(self.passengers.len());

        for passenger in self.passengers {
            if until_s.is_some_and(|until| passenger.checkpoint_arrival_s > until) {
                continue;
            }
            self.states[passenger.id.index()] = PassengerState::Walking;
            self.scheduler.schedule(
                passenger.checkpoint_arrival_s,
                EventKind::PassengerArrival { passenger: passenger.id },
            );
        }

        while let Some(event) = self.scheduler.pop_until(until_s) {
            self.progress.advance_to(event.time);
            self.progress.event_processed();
            match event.kind {
                EventKind::PassengerArrival { passenger } => self.enter_station(passenger, 0),
                EventKind::ServiceStart { passenger, station } => self.start_service(passenger, station),
                EventKind::ServiceCompletion { passenger, station } => {
                    self.complete_service(passenger, station)
                }
                EventKind::QueueAdvance { station } => self.advance_queue(station),
            }
        }

        if self.scheduler.is_empty() {
            // Nothing left to fire: anyone still queued would wait forever
            let stuck = StationKey::all().zip(&self.stations).find(|(_, station)| station.queue_len() > 0);
            if let Some((key, station)) = stuck {
                let head = station.queued().next().map(|id| self.passengers[id.index()].group);
                if let Some(group) = head {
                    return Err(SimulationError::liveness_error(key, group, station.queue_len()));
                }
            }
        }
        debug!(events = self.scheduler.processed(), now = self.scheduler.now(), "Event loop finished");
        Ok(())
    }

    fn finish(mut self, until_s: Option<f64>) -> RunResult {
        for state in self.states.iter_mut().filter(|state| **state != PassengerState::Completed) {
            *state = PassengerState::Incomplete;
        }
        let events = self.scheduler.processed();
        self.metrics.finish(&self.states, until_s, events)
    }

    fn station(&mut self, key: StationKey) -> &mut ResourceStation {
        &mut self.stations[key.index()]
    }

    fn sample(&mut self, key: StationKey) {
        let now = self.scheduler.now();
        let station = &self.stations[key.index()];
        self.metrics.sample(key, now, station.queue_len(), station.in_service());
    }

    fn enter_station(&mut self, passenger: PassengerId, step: usize) {
        let (group, terminal) = {
            let p = &self.passengers[passenger.index()];
            (p.group, p.terminal)
        };
        let Some(kind) = self.paths[terminal.index()].get(group).step(step) else {
            return self.leave_checkpoint(passenger);
        };
        let key = StationKey::new(terminal, kind);
        let now = self.scheduler.now();
        self.steps[passenger.index()] = step;
        self.metrics.queue_join(passenger, kind, now);

        match self.station(key).try_acquire(passenger) {
            AcquireOutcome::Started => {
                self.states[passenger.index()] = PassengerState::InService(kind);
                self.scheduler.schedule_now(EventKind::ServiceStart { passenger, station: key });
            }
            AcquireOutcome::Queued => {
                self.states[passenger.index()] = PassengerState::Queued(kind);
            }
        }
        self.sample(key);
    }

    fn start_service(&mut self, passenger: PassengerId, key: StationKey) {
        let now = self.scheduler.now();
        let (group, ees) = {
            let p = &self.passengers[passenger.index()];
            (p.group, p.ees)
        };
        let streams = self.streams;
        let rng = self.service_rngs[passenger.index()]
            .get_or_insert_with(|| streams.service_stream(passenger.index()));
        let service_s = self.stations[key.index()].sample_service_time(group, ees, rng);

        self.states[passenger.index()] = PassengerState::InService(key.station);
        self.metrics.service_start(passenger, key.station, now, service_s);
        self.scheduler.schedule(
            now + service_s + self.changeover_s,
            EventKind::ServiceCompletion { passenger, station: key },
        );
    }

    fn complete_service(&mut self, passenger: PassengerId, key: StationKey) {
        let now = self.scheduler.now();
        self.station(key).release(passenger);
        self.metrics.service_end(passenger, key.station, now);
        self.sample(key);
        self.scheduler.schedule_now(EventKind::QueueAdvance { station: key });

        self.states[passenger.index()] = PassengerState::Walking;
        let next_step = self.steps[passenger.index()] + 1;
        self.enter_station(passenger, next_step);
    }

    fn advance_queue(&mut self, key: StationKey) {
        while let Some(next) = self.station(key).admit_next() {
            self.states[next.index()] = PassengerState::InService(key.station);
            self.scheduler.schedule_now(EventKind::ServiceStart { passenger: next, station: key });
        }
        self.sample(key);
    }

    fn leave_checkpoint(&mut self, passenger: PassengerId) {
        let now = self.scheduler.now();
        self.states[passenger.index()] = PassengerState::Completed;
        self.metrics.passenger_completed(passenger, now);
        self.progress.passenger_completed();
    }
}
