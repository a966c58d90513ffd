//! Integration tests for the single-run engine
//!
//! These tests drive complete runs through the public API and check the
//! properties every run has to satisfy: timestamp ordering, path conformance,
//! strict FIFO service, the capacity bound and passenger conservation.

use chrono::{DateTime, TimeZone, Utc};
use ees_border_sim::flight::{Flight, StaticAirportLookup};
use ees_border_sim::simulation::{
    PassengerOutcome, RunProgress, RunResult, RunStatus, Simulation, SimulationError,
};
use ees_border_sim::types::{PassengerGroup, ServiceTimeParams, SimulationConfig, StationKind};

fn block_in(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 7, 4, hour, minute, 0).unwrap()
}

fn lookup() -> StaticAirportLookup {
    let mut lookup = StaticAirportLookup::new();
    lookup.insert_distance("A1", 120.0);
    lookup.insert_distance("B7", 450.0);
    lookup.add_t1_position("A1");
    lookup
}

fn schedule() -> Vec<Flight> {
    vec![
        Flight::new("LH400", block_in(7, 0), "A1", "A320").with_actual_pax(150),
        Flight::new("TK1635", block_in(7, 10), "B7", "A321").with_actual_pax(180),
        Flight::new("EK55", block_in(7, 25), "A1", "B77W").with_expected_pax(220),
    ]
}

fn busy_config() -> SimulationConfig {
    let mut config = SimulationConfig::default();
    config.station_mut(StationKind::Easypass).capacity = 3;
    config.station_mut(StationKind::Eu).capacity = 2;
    config.station_mut(StationKind::Tcn).capacity = 3;
    config.station_mut(StationKind::Sss).capacity = 4;
    config
}

fn run(config: SimulationConfig, until_s: Option<f64>) -> RunResult {
    let lookup = lookup();
    Simulation::new(config, &lookup).unwrap().run(&schedule(), until_s).unwrap()
}

/// Every visit is ordered and follows the group's path
#[test]
fn test_timestamps_follow_process_path() {
    let config = busy_config();
    let result = run(config.clone(), None);

    assert_eq!(result.status, RunStatus::Completed);
    for record in &result.passengers {
        let path = config.effective_path(record.group);
        let visited: Vec<StationKind> = record.visits.iter().map(|visit| visit.station).collect();
        assert_eq!(visited, path, "passenger {} left its path", record.id);

        let mut previous_end = record.checkpoint_arrival_s;
        for visit in &record.visits {
            let start = visit.service_start_s.unwrap();
            let end = visit.service_end_s.unwrap();
            assert_eq!(visit.queue_join_s, previous_end);
            assert!(visit.queue_join_s <= start);
            assert!(start <= end);
            previous_end = end;
        }
        assert_eq!(record.exit_s, Some(previous_end));
    }
}

/// Passengers that joined a queue earlier never start service later
#[test]
fn test_queues_are_strict_fifo() {
    let result = run(busy_config(), None);

    for station in StationKind::ALL {
        let mut visits: Vec<(f64, f64)> = result
            .passengers
            .iter()
            .filter_map(|record| record.visit(station))
            .map(|visit| (visit.queue_join_s, visit.service_start_s.unwrap()))
            .collect();
        visits.sort_by(|a, b| a.0.total_cmp(&b.0));
        for pair in visits.windows(2) {
            if pair[0].0 < pair[1].0 {
                assert!(pair[0].1 <= pair[1].1, "{} served out of order", station);
            }
        }
    }
}

/// In-service never exceeds capacity and somebody had to wait
#[test]
fn test_capacity_bound_holds() {
    let result = run(busy_config(), None);

    let mut saw_queue = false;
    for (station, series) in &result.stations {
        for sample in &series.samples {
            assert!(sample.in_service <= series.capacity, "{} over capacity", station);
            saw_queue |= sample.queue_len > 0;
        }
    }
    assert!(saw_queue);
}

/// Passengers produced equal passengers reported, split into completed and incomplete
#[test]
fn test_passenger_conservation_with_horizon() {
    let mut config = busy_config();
    config.station_mut(StationKind::Tcn).capacity = 1;
    let result = run(config, Some(20.0 * 60.0));

    // 150 + 180 + 220 expected passengers
    assert_eq!(result.passengers.len(), 550);
    assert_eq!(result.completed_count() + result.incomplete_count(), 550);
    assert_eq!(result.status, RunStatus::Incomplete { passengers: result.incomplete_count() });
    assert!(result.incomplete_count() > 0);

    for record in &result.passengers {
        match record.outcome {
            PassengerOutcome::Completed => {
                assert!(record.exit_s.unwrap() <= 20.0 * 60.0);
            }
            PassengerOutcome::Incomplete => {
                assert!(record.exit_s.is_none());
                // partial timestamps are kept
                for visit in &record.visits {
                    assert!(visit.queue_join_s <= 20.0 * 60.0);
                }
            }
        }
    }
}

#[test]
fn test_zero_capacity_with_demand_is_a_liveness_error() {
    let lookup = lookup();
    let mut config = SimulationConfig::default();
    config.station_mut(StationKind::Tcn).capacity = 0;

    let error = Simulation::new(config, &lookup).unwrap().run(&schedule(), None).unwrap_err();
    match error {
        SimulationError::LivenessError { station, demand, .. } => {
            assert_eq!(station, StationKind::Tcn);
            assert!(demand > 0);
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_zero_capacity_without_demand_runs() {
    let lookup = lookup();
    let mut config = SimulationConfig::default();
    config.mix.tcn_v = 0.0;
    config.mix.tcn_at = 0.3;
    config.station_mut(StationKind::Tcn).capacity = 0;
    config.station_mut(StationKind::Sss).capacity = 0;

    let result = Simulation::new(config, &lookup).unwrap().run(&schedule(), None).unwrap();
    assert_eq!(result.status, RunStatus::Completed);
    assert!(result.passengers.iter().all(|p| p.group != PassengerGroup::TcnV));
}

#[test]
fn test_zero_flights_produce_empty_result() {
    let lookup = lookup();
    let result = Simulation::new(SimulationConfig::default(), &lookup).unwrap().run(&[], None).unwrap();

    assert!(result.passengers.is_empty());
    assert_eq!(result.status, RunStatus::Completed);
    assert_eq!(result.t0, None);
    assert!(result.stations.values().all(|series| series.samples.is_empty()));
}

#[test]
fn test_progress_reports_final_state() {
    let lookup = lookup();
    let progress = RunProgress::new();
    let simulation =
        Simulation::new(busy_config(), &lookup).unwrap().with_progress(progress.clone());
    let result = simulation.run(&schedule(), None).unwrap();

    let snapshot = progress.snapshot();
    assert_eq!(snapshot.total, 550);
    assert_eq!(snapshot.completed, 550);
    assert_eq!(snapshot.fraction_complete(), 1.0);
    assert_eq!(snapshot.events, result.events_processed);
    let last_exit = result.passengers.iter().filter_map(|p| p.exit_s).fold(0.0, f64::max);
    assert_eq!(snapshot.virtual_time_s, last_exit);
}

#[test]
fn test_changeover_extends_desk_occupation() {
    let lookup = lookup();
    let mut config = SimulationConfig::default();
    for kind in StationKind::ALL {
        config.station_mut(kind).service_time = ServiceTimeParams::Fixed { seconds: 30.0 };
        config.station_mut(kind).unregistered_service_time = None;
    }
    config.changeover_s = 10.0;

    let result = Simulation::new(config, &lookup).unwrap().run(&schedule(), None).unwrap();
    for visit in result.passengers.iter().flat_map(|p| p.visits.iter()) {
        assert_eq!(visit.service_s, Some(30.0));
        let occupied = visit.service_end_s.unwrap() - visit.service_start_s.unwrap();
        assert!((occupied - 40.0).abs() < 1e-9);
    }
}
