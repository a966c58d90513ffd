//! Passenger generation from flights
//!
//! This module expands a flight schedule into individual passengers: group
//! assignment, EES status, deboarding order and the time each passenger reaches
//! the checkpoint, on foot or by apron bus.

use crate::flight::{AirportLookup, Flight, LookupError};
use crate::passenger::passenger::Passenger;
use crate::simulation::error::{SimulationError, SimulationResult};
use crate::simulation::random::RandomStreamProvider;
use crate::types::{
    ConfigValidationError, EesStatus, PassengerGroup, PassengerId, SimulationConfig, Terminal,
    TransportMode, UnknownPositionHandling,
};
use chrono::{DateTime, Utc};
use rand::distributions::WeightedIndex;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use tracing::{debug, warn};

/// Passengers of one run together with the time origin
#[derive(Debug, Clone, PartialEq)]
pub struct Expansion {
    /// Earliest block-in among the active flights (`None` without flights)
    pub t0: Option<DateTime<Utc>>,
    /// Passengers ordered by (block-in, flight id, index within flight)
    pub passengers: Vec<Passenger>,
    /// Flights whose passenger count came from a fallback
    pub fallback_flights: usize,
    /// Flights whose parking position had no known walking distance
    pub unknown_positions: usize,
}

/// Expands flights into passengers
#[derive(Debug)]
pub struct PassengerFactory<'a> {
    config: &'a SimulationConfig,
    lookup: &'a dyn AirportLookup,
    streams: RandomStreamProvider,
}

/// How the passengers of one flight get to the checkpoint
#[derive(Debug, Clone, Copy, PartialEq)]
enum Access {
    Walk { distance_m: f64 },
    Bus,
}

impl<'a> PassengerFactory<'a> {
    /// Create a factory drawing from the configuration's seed
    pub fn new(config: &'a SimulationConfig, lookup: &'a dyn AirportLookup) -> Self {
        Self { config, lookup, streams: RandomStreamProvider::new(config.seed) }
    }

    /// Expand the active flights into passengers
    pub fn expand(&self, flights: &[Flight]) -> SimulationResult<Expansion> {
        let mut active: Vec<&Flight> = flights.iter().filter(|flight| flight.active).collect();
        active.sort_by(|a, b| a.block_in.cmp(&b.block_in).then_with(|| a.id.cmp(&b.id)));

        let t0 = active.first().map(|flight| flight.block_in);
        let mut expansion =
            Expansion { t0, passengers: Vec::new(), fallback_flights: 0, unknown_positions: 0 };
        let Some(t0) = t0 else {
            return Ok(expansion);
        };

        for (flight_index, flight) in active.into_iter().enumerate() {
            if flight.uses_fallback_pax() {
                expansion.fallback_flights += 1;
            }
            let access = match self.lookup.walking_distance_m(&flight.parking_position) {
                Ok(distance_m) => Access::Walk { distance_m },
                Err(LookupError::UnknownPosition(position)) => {
                    expansion.unknown_positions += 1;
                    warn!(flight = %flight.id, position = %position, "Unknown parking position");
                    match self.config.walking.unknown_position {
                        UnknownPositionHandling::DefaultDistance => {
                            Access::Walk { distance_m: self.config.walking.default_distance_m }
                        }
                        UnknownPositionHandling::Bus => Access::Bus,
                    }
                }
            };

            let block_in_s = (flight.block_in - t0).num_milliseconds() as f64 / 1000.0;
            let mut rng = self.streams.flight_stream(flight_index);
            let passengers = self.expand_flight(flight, block_in_s, access, &mut rng, expansion.passengers.len())?;
            debug!(flight = %flight.id, pax = passengers.len(), ?access, "Expanded flight");
            expansion.passengers.extend(passengers);
        }

        Ok(expansion)
    }

    fn expand_flight(
        &self,
        flight: &Flight,
        block_in_s: f64,
        access: Access,
        rng: &mut ChaCha8Rng,
        first_id: usize,
    ) -> SimulationResult<Vec<Passenger>> {
        let pax = flight.resolved_pax(self.lookup) as usize;
        let terminal = flight.resolved_terminal(self.lookup);
        let groups = if self.config.randomized_group_assignment {
            self.random_groups(pax, rng)?
        } else {
            spread_groups(&allocate_groups(pax, &self.config.mix.shares()))
        };

        let arrivals = match access {
            Access::Walk { distance_m } => self.walking_arrivals(pax, distance_m, terminal, rng)?,
            Access::Bus => self.bus_arrivals(pax),
        };
        let transport = match access {
            Access::Walk { .. } => TransportMode::Walk,
            Access::Bus => TransportMode::Bus,
        };

        let passengers = groups
            .into_iter()
            .zip(arrivals)
            .enumerate()
            .map(|(pax_index, (group, offset_s))| {
                let ees = group.is_third_country().then(|| {
                    if rng.gen_bool(self.config.ees_registered_share) {
                        EesStatus::Registered
                    } else {
                        EesStatus::Unregistered
                    }
                });
                Passenger {
                    id: PassengerId::from(first_id + pax_index),
                    flight_id: flight.id.clone(),
                    pax_index: pax_index as u32,
                    group,
                    ees,
                    transport,
                    terminal,
                    checkpoint_arrival_s: block_in_s + offset_s + self.config.walking.dwell_for(group),
                }
            })
            .collect();
        Ok(passengers)
    }

    fn random_groups(&self, pax: usize, rng: &mut ChaCha8Rng) -> SimulationResult<Vec<PassengerGroup>> {
        let weights = WeightedIndex::new(self.config.mix.shares()).map_err(|_| {
            SimulationError::from(ConfigValidationError::InvalidMixSum { sum: self.config.mix.sum() })
        })?;
        Ok((0..pax).map(|_| PassengerGroup::ALL[weights.sample(rng)]).collect())
    }

    /// Offsets from block-in for passengers leaving the aircraft one by one and walking
    fn walking_arrivals(
        &self,
        pax: usize,
        distance_m: f64,
        terminal: Terminal,
        rng: &mut ChaCha8Rng,
    ) -> SimulationResult<Vec<f64>> {
        let deboarding = &self.config.deboarding;
        let speed = self.config.walking.speed_for(terminal);
        let speed_dist = Normal::new(speed.mean_mps, speed.sd_mps).map_err(|_| {
            SimulationError::from(ConfigValidationError::InvalidWalkSpeed {
                field: "sd_mps".to_string(),
                value: speed.sd_mps,
            })
        })?;

        let mut left_aircraft_s = deboarding.offset_s;
        let mut arrivals = Vec::with_capacity(pax);
        for i in 0..pax {
            if i > 0 {
                left_aircraft_s += f64::from(rng.gen_range(deboarding.delay_min_s..=deboarding.delay_max_s));
            }
            let walk_speed = speed_dist.sample(rng).max(speed.floor_mps);
            arrivals.push(left_aircraft_s + distance_m / walk_speed);
        }
        Ok(arrivals)
    }

    /// Offsets from block-in for passengers taken to the checkpoint by bus
    ///
    /// Buses are filled in deboarding order; a bus leaves once loaded (fill time
    /// proportional to its load) and everyone on it arrives together.
    fn bus_arrivals(&self, pax: usize) -> Vec<f64> {
        let bus = &self.config.bus;
        let mut arrivals = Vec::with_capacity(pax);
        let mut departure_s = self.config.deboarding.offset_s;
        let mut remaining = pax;
        while remaining > 0 {
            let load = remaining.min(bus.capacity);
            departure_s += load as f64 / bus.capacity as f64 * bus.fill_time_s;
            arrivals.extend(std::iter::repeat(departure_s + bus.travel_time_s).take(load));
            remaining -= load;
        }
        arrivals
    }
}

/// Split `pax` passengers over the groups in proportion to `shares`
///
/// Each group gets the floor of its quota; leftover passengers go to the largest
/// fractional remainders, ties resolved in group order.
pub fn allocate_groups(pax: usize, shares: &[f64; 4]) -> [usize; 4] {
    let total: f64 = shares.iter().sum();
    if pax == 0 || total <= 0.0 {
        return [0; 4];
    }

    let quotas = shares.map(|share| pax as f64 * share / total);
    let mut counts = quotas.map(|quota| quota.floor() as usize);
    let assigned: usize = counts.iter().sum();

    let mut by_remainder: Vec<usize> = (0..4).collect();
    by_remainder.sort_by(|&a, &b| {
        let ra = quotas[a] - quotas[a].floor();
        let rb = quotas[b] - quotas[b].floor();
        rb.total_cmp(&ra).then(a.cmp(&b))
    });
    for &group in by_remainder.iter().cycle().take(pax.saturating_sub(assigned)) {
        counts[group] += 1;
    }
    counts
}

/// Interleave group counts into a deboarding sequence
///
/// The k-th passenger of a group is placed at (k + 0.5) / count along the flight,
/// so every group is spread evenly instead of leaving the aircraft in blocks.
pub fn spread_groups(counts: &[usize; 4]) -> Vec<PassengerGroup> {
    let mut slots: Vec<(f64, usize)> = counts
        .iter()
        .enumerate()
        .flat_map(|(group, &count)| (0..count).map(move |k| ((k as f64 + 0.5) / count as f64, group)))
        .collect();
    slots.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
    slots.into_iter().map(|(_, group)| PassengerGroup::ALL[group]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flight::StaticAirportLookup;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, hour, minute, 0).unwrap()
    }

    #[test]
    fn test_allocate_groups_largest_remainder() {
        // 0.49/0.21/0.15/0.15 of 10 -> quotas 4.9/2.1/1.5/1.5
        let counts = allocate_groups(10, &[0.49, 0.21, 0.15, 0.15]);
        assert_eq!(counts, [5, 2, 2, 1]);
        assert_eq!(counts.iter().sum::<usize>(), 10);
    }

    #[test]
    fn test_allocate_groups_exact_totals() {
        for pax in [0, 1, 7, 99, 100, 366] {
            let counts = allocate_groups(pax, &[0.49, 0.21, 0.15, 0.15]);
            assert_eq!(counts.iter().sum::<usize>(), pax);
        }
        assert_eq!(allocate_groups(100, &[0.6, 0.4, 0.0, 0.0]), [60, 40, 0, 0]);
    }

    #[test]
    fn test_spread_groups_interleaves() {
        let sequence = spread_groups(&[2, 2, 0, 0]);
        assert_eq!(
            sequence,
            vec![
                PassengerGroup::Easypass,
                PassengerGroup::EuManual,
                PassengerGroup::Easypass,
                PassengerGroup::EuManual
            ]
        );
    }

    #[test]
    fn test_expand_orders_flights_by_block_in_then_id() {
        let config = SimulationConfig::default();
        let lookup = StaticAirportLookup::standard();
        let flights = vec![
            Flight::new("B2", at(9, 0), "05", "A320").with_actual_pax(2),
            Flight::new("A1", at(9, 0), "05", "A320").with_actual_pax(2),
            Flight::new("C3", at(8, 30), "01", "A320").with_actual_pax(2),
        ];

        let expansion = PassengerFactory::new(&config, &lookup).expand(&flights).unwrap();
        assert_eq!(expansion.t0, Some(at(8, 30)));
        let order: Vec<&str> = expansion.passengers.iter().map(|p| p.flight_id.as_str()).collect();
        assert_eq!(order, vec!["C3", "C3", "A1", "A1", "B2", "B2"]);
        for (i, passenger) in expansion.passengers.iter().enumerate() {
            assert_eq!(passenger.id.index(), i);
        }
    }

    #[test]
    fn test_inactive_flights_are_skipped() {
        let config = SimulationConfig::default();
        let lookup = StaticAirportLookup::standard();
        let mut flight = Flight::new("X1", at(8, 0), "05", "A320").with_actual_pax(10);
        flight.active = false;

        let expansion = PassengerFactory::new(&config, &lookup).expand(&[flight]).unwrap();
        assert!(expansion.passengers.is_empty());
        assert!(expansion.t0.is_none());
    }

    #[test]
    fn test_walking_arrival_bounds() {
        let config = SimulationConfig::default();
        let lookup = StaticAirportLookup::standard();
        let flight = Flight::new("LH1", at(8, 0), "08", "A320").with_actual_pax(50);

        let expansion = PassengerFactory::new(&config, &lookup).expand(&[flight]).unwrap();
        let max_walk = 290.0 / config.walking.default_speed.floor_mps;
        let max_deboard = 300.0 + 49.0 * 8.0;
        for passenger in &expansion.passengers {
            assert_eq!(passenger.transport, TransportMode::Walk);
            assert!(passenger.checkpoint_arrival_s >= 300.0);
            assert!(passenger.checkpoint_arrival_s <= max_deboard + max_walk);
        }
    }

    #[test]
    fn test_bus_transfer_for_unknown_position() {
        let mut config = SimulationConfig::default();
        config.walking.unknown_position = UnknownPositionHandling::Bus;
        let lookup = StaticAirportLookup::standard();
        let flight = Flight::new("LH1", at(8, 0), "V99", "A320").with_actual_pax(100);

        let expansion = PassengerFactory::new(&config, &lookup).expand(&[flight]).unwrap();
        assert_eq!(expansion.unknown_positions, 1);

        // Bus 1: 80 pax, leaves 300 + 420; bus 2: 20 pax, leaves 720 + 105
        let first = 300.0 + 420.0 + 150.0;
        let second = 720.0 + 105.0 + 150.0;
        let arrivals: Vec<f64> = expansion.passengers.iter().map(|p| p.checkpoint_arrival_s).collect();
        assert!(arrivals[..80].iter().all(|&t| (t - first).abs() < 1e-9));
        assert!(arrivals[80..].iter().all(|&t| (t - second).abs() < 1e-9));
        assert!(expansion.passengers.iter().all(|p| p.transport == TransportMode::Bus));
    }

    #[test]
    fn test_ees_status_only_for_third_country() {
        let config = SimulationConfig::default();
        let lookup = StaticAirportLookup::standard();
        let flight = Flight::new("LH1", at(8, 0), "05", "A320").with_actual_pax(200);

        let expansion = PassengerFactory::new(&config, &lookup).expand(&[flight]).unwrap();
        for passenger in &expansion.passengers {
            assert_eq!(passenger.ees.is_some(), passenger.group.is_third_country());
        }
    }

    #[test]
    fn test_group_dwell_offset() {
        let mut config = SimulationConfig::default();
        config.deboarding.delay_min_s = 0;
        config.deboarding.delay_max_s = 0;
        config.walking.default_speed.sd_mps = 0.0;
        config.walking.group_dwell_s.insert(PassengerGroup::EuManual, 60.0);
        let lookup = StaticAirportLookup::standard();
        let flight = Flight::new("LH1", at(8, 0), "05", "A320").with_actual_pax(10);

        let expansion = PassengerFactory::new(&config, &lookup).expand(&[flight]).unwrap();
        let walk_only = 300.0 + 110.0 / 1.25;
        for passenger in &expansion.passengers {
            let expected = match passenger.group {
                PassengerGroup::EuManual => walk_only + 60.0,
                _ => walk_only,
            };
            assert!((passenger.checkpoint_arrival_s - expected).abs() < 1e-9);
        }
    }
}
