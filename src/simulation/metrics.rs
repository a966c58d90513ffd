//! Run metrics collection
//!
//! The [`MetricsCollector`] is written to while a run executes and consumed by
//! [`MetricsCollector::finish`], which hands out the read-only [`RunResult`].
//! Timestamps are appended as passengers progress and never overwritten.

use crate::passenger::{Passenger, PassengerState};
use crate::types::{
    EesStatus, FlightId, PassengerGroup, PassengerId, StationKey, StationKind, Terminal, TransportMode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One station visit of a passenger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationVisit {
    /// Station visited
    pub station: StationKind,
    /// Time the passenger reached the station
    pub queue_join_s: f64,
    /// Time service began
    pub service_start_s: Option<f64>,
    /// Time the passenger left the desk (service plus changeover)
    pub service_end_s: Option<f64>,
    /// Drawn service duration, without changeover
    pub service_s: Option<f64>,
}

impl StationVisit {
    /// Time spent waiting in the queue, once service has started
    pub fn wait_s(&self) -> Option<f64> {
        self.service_start_s.map(|start| start - self.queue_join_s)
    }
}

/// How a passenger's run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PassengerOutcome {
    /// Every station of the path done
    Completed,
    /// Still in the process at the horizon
    Incomplete,
}

/// Timing record of one passenger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassengerRecord {
    /// Passenger id
    pub id: PassengerId,
    /// Flight the passenger arrived with
    pub flight_id: FlightId,
    /// Index within the flight
    pub pax_index: u32,
    /// Processing group
    pub group: PassengerGroup,
    /// EES status (third-country groups only)
    pub ees: Option<EesStatus>,
    /// Walk or bus
    pub transport: TransportMode,
    /// Terminal
    pub terminal: Terminal,
    /// Time the passenger reached the checkpoint
    pub checkpoint_arrival_s: f64,
    /// Station visits in path order
    pub visits: Vec<StationVisit>,
    /// Final state
    pub outcome: PassengerOutcome,
    /// Time the last station was left
    pub exit_s: Option<f64>,
}

impl PassengerRecord {
    /// Time from checkpoint arrival to leaving the last station
    pub fn transit_s(&self) -> Option<f64> {
        self.exit_s.map(|exit| exit - self.checkpoint_arrival_s)
    }

    /// Sum of completed waits across all stations
    pub fn total_wait_s(&self) -> f64 {
        self.visits.iter().filter_map(StationVisit::wait_s).sum()
    }

    /// Visit of a given station, if any
    pub fn visit(&self, station: StationKind) -> Option<&StationVisit> {
        self.visits.iter().find(|visit| visit.station == station)
    }
}

/// Queue state of a station right after a state change
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QueueSample {
    /// Time of the change
    pub t_s: f64,
    /// Passengers waiting
    pub queue_len: usize,
    /// Desks occupied
    pub in_service: usize,
}

/// Event-driven queue series of one desk pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationSeries {
    /// Capacity the station ran with
    pub capacity: usize,
    /// One sample per instant at which the station changed
    pub samples: Vec<QueueSample>,
}

/// Whether every passenger finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunStatus {
    /// All passengers completed their path
    Completed,
    /// The horizon was reached first
    Incomplete {
        /// Passengers not done at the horizon
        passengers: usize,
    },
}

/// Everything a run produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    /// Absolute time of virtual time zero (earliest block-in)
    pub t0: Option<DateTime<Utc>>,
    /// Horizon the run was cut at, seconds after t0
    pub horizon_s: Option<f64>,
    /// Passenger records in creation order
    pub passengers: Vec<PassengerRecord>,
    /// Queue series per desk pool
    pub stations: BTreeMap<StationKey, StationSeries>,
    /// Completion status
    pub status: RunStatus,
    /// Events processed by the scheduler
    pub events_processed: u64,
}

impl RunResult {
    /// Passengers that completed their path
    pub fn completed_count(&self) -> usize {
        self.passengers.iter().filter(|p| p.outcome == PassengerOutcome::Completed).count()
    }

    /// Passengers cut off by the horizon
    pub fn incomplete_count(&self) -> usize {
        self.passengers.len() - self.completed_count()
    }

    /// Series of a desk pool
    pub fn series(&self, station: StationKey) -> Option<&StationSeries> {
        self.stations.get(&station)
    }

    /// Capacities the run used
    pub fn capacities(&self) -> BTreeMap<StationKey, usize> {
        self.stations.iter().map(|(key, series)| (*key, series.capacity)).collect()
    }
}

/// Write-only recorder used while a run executes
#[derive(Debug)]
pub struct MetricsCollector {
    t0: Option<DateTime<Utc>>,
    records: Vec<PassengerRecord>,
    stations: BTreeMap<StationKey, StationSeries>,
}

impl MetricsCollector {
    /// Start recording for a set of passengers and station capacities
    pub fn new(
        t0: Option<DateTime<Utc>>,
        passengers: &[Passenger],
        capacities: &BTreeMap<StationKey, usize>,
    ) -> Self {
        let records = passengers
            .iter()
            .map(|p| PassengerRecord {
                id: p.id,
                flight_id: p.flight_id.clone(),
                pax_index: p.pax_index,
                group: p.group,
                ees: p.ees,
                transport: p.transport,
                terminal: p.terminal,
                checkpoint_arrival_s: p.checkpoint_arrival_s,
                visits: Vec::new(),
                outcome: PassengerOutcome::Incomplete,
                exit_s: None,
            })
            .collect();
        let stations = capacities
            .iter()
            .map(|(key, capacity)| (*key, StationSeries { capacity: *capacity, samples: Vec::new() }))
            .collect();
        Self { t0, records, stations }
    }

    /// Passenger reached a station
    pub fn queue_join(&mut self, passenger: PassengerId, station: StationKind, t_s: f64) {
        if let Some(record) = self.records.get_mut(passenger.index()) {
            record.visits.push(StationVisit {
                station,
                queue_join_s: t_s,
                service_start_s: None,
                service_end_s: None,
                service_s: None,
            });
        }
    }

    /// Passenger began service with a drawn duration
    pub fn service_start(&mut self, passenger: PassengerId, station: StationKind, t_s: f64, service_s: f64) {
        if let Some(visit) = self.open_visit(passenger, station) {
            visit.service_start_s = Some(t_s);
            visit.service_s = Some(service_s);
        }
    }

    /// Passenger left the desk
    pub fn service_end(&mut self, passenger: PassengerId, station: StationKind, t_s: f64) {
        if let Some(visit) = self.open_visit(passenger, station) {
            visit.service_end_s = Some(t_s);
        }
    }

    /// Passenger finished its whole path
    pub fn passenger_completed(&mut self, passenger: PassengerId, t_s: f64) {
        if let Some(record) = self.records.get_mut(passenger.index()) {
            record.outcome = PassengerOutcome::Completed;
            record.exit_s = Some(t_s);
        }
    }

    /// Record the state of a desk pool after a change
    ///
    /// A later change at the same instant replaces the earlier sample, so each
    /// instant carries the state the station settled in.
    pub fn sample(&mut self, station: StationKey, t_s: f64, queue_len: usize, in_service: usize) {
        let Some(series) = self.stations.get_mut(&station) else {
            return;
        };
        let sample = QueueSample { t_s, queue_len, in_service };
        match series.samples.last_mut() {
            Some(last) if last.t_s == t_s => *last = sample,
            _ => series.samples.push(sample),
        }
    }

    fn open_visit(&mut self, passenger: PassengerId, station: StationKind) -> Option<&mut StationVisit> {
        self.records
            .get_mut(passenger.index())?
            .visits
            .last_mut()
            .filter(|visit| visit.station == station)
    }

    /// Close the collector and produce the run result
    pub fn finish(self, states: &[PassengerState], horizon_s: Option<f64>, events_processed: u64) -> RunResult {
        let mut passengers = self.records;
        for (record, state) in passengers.iter_mut().zip(states) {
            if *state != PassengerState::Completed {
                record.outcome = PassengerOutcome::Incomplete;
            }
        }
        let incomplete = passengers.iter().filter(|p| p.outcome == PassengerOutcome::Incomplete).count();
        let status = if incomplete == 0 {
            RunStatus::Completed
        } else {
            RunStatus::Incomplete { passengers: incomplete }
        };

        RunResult { t0: self.t0, horizon_s, passengers, stations: self.stations, status, events_processed }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passenger(id: u32) -> Passenger {
        Passenger {
            id: PassengerId(id),
            flight_id: FlightId::new("LH1"),
            pax_index: id,
            group: PassengerGroup::TcnV,
            ees: Some(EesStatus::Registered),
            transport: TransportMode::Walk,
            terminal: Terminal::T2,
            checkpoint_arrival_s: 100.0,
        }
    }

    fn capacities() -> BTreeMap<StationKey, usize> {
        StationKey::all().map(|key| (key, 1)).collect()
    }

    #[test]
    fn test_visit_timestamps_are_appended() {
        let mut metrics = MetricsCollector::new(None, &[passenger(0)], &capacities());
        let id = PassengerId(0);
        metrics.queue_join(id, StationKind::Sss, 100.0);
        metrics.service_start(id, StationKind::Sss, 130.0, 20.0);
        metrics.service_end(id, StationKind::Sss, 150.0);
        metrics.queue_join(id, StationKind::Tcn, 150.0);
        metrics.service_start(id, StationKind::Tcn, 150.0, 60.0);
        metrics.service_end(id, StationKind::Tcn, 210.0);
        metrics.passenger_completed(id, 210.0);

        let result = metrics.finish(&[PassengerState::Completed], None, 7);
        let record = &result.passengers[0];
        assert_eq!(record.visits.len(), 2);
        assert_eq!(record.visits[0].wait_s(), Some(30.0));
        assert_eq!(record.visits[1].wait_s(), Some(0.0));
        assert_eq!(record.transit_s(), Some(110.0));
        assert_eq!(record.total_wait_s(), 30.0);
        assert_eq!(result.status, RunStatus::Completed);
        assert_eq!(result.events_processed, 7);
    }

    #[test]
    fn test_unfinished_passengers_are_incomplete() {
        let mut metrics = MetricsCollector::new(None, &[passenger(0), passenger(1)], &capacities());
        metrics.queue_join(PassengerId(0), StationKind::Sss, 100.0);
        metrics.passenger_completed(PassengerId(1), 300.0);

        let states = [PassengerState::Queued(StationKind::Sss), PassengerState::Completed];
        let result = metrics.finish(&states, Some(200.0), 3);
        assert_eq!(result.status, RunStatus::Incomplete { passengers: 1 });
        assert_eq!(result.passengers[0].outcome, PassengerOutcome::Incomplete);
        assert_eq!(result.passengers[0].visits[0].service_start_s, None);
        assert_eq!(result.completed_count(), 1);
        assert_eq!(result.incomplete_count(), 1);
    }

    #[test]
    fn test_same_instant_samples_collapse() {
        let t1_eu = StationKey::new(Terminal::T1, StationKind::Eu);
        let t2_eu = StationKey::new(Terminal::T2, StationKind::Eu);
        let mut metrics = MetricsCollector::new(None, &[], &capacities());
        metrics.sample(t1_eu, 10.0, 1, 1);
        metrics.sample(t1_eu, 10.0, 2, 1);
        metrics.sample(t1_eu, 12.0, 1, 1);
        metrics.sample(t2_eu, 10.0, 5, 1);

        let result = metrics.finish(&[], None, 0);
        let samples = &result.series(t1_eu).unwrap().samples;
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].queue_len, 2);
        assert_eq!(result.series(t2_eu).unwrap().samples.len(), 1);
        assert_eq!(result.capacities()[&t1_eu], 1);
        assert_eq!(result.capacities().len(), StationKey::COUNT);
    }
}
