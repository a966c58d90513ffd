//! Capacity-bounded processing stations
//!
//! A [`ResourceStation`] is a pool of identical desks (or gates, or kiosks) with a
//! single FIFO queue in front of it. It knows nothing about time: the scheduler
//! decides when to call [`ResourceStation::try_acquire`], [`ResourceStation::release`]
//! and [`ResourceStation::admit_next`].

use crate::station::distribution::ServiceTimeDistribution;
use crate::types::{
    ConfigValidationError, EesStatus, PassengerGroup, PassengerId, StationConfig, StationKind,
};
use rand::Rng;
use std::collections::VecDeque;

/// Result of asking a station for service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireOutcome {
    /// A desk was free and nobody was waiting; service starts now
    Started,
    /// The passenger joined the back of the queue
    Queued,
}

/// A processing station with bounded concurrent service and a FIFO queue
#[derive(Debug, Clone)]
pub struct ResourceStation {
    kind: StationKind,
    capacity: usize,
    in_service: usize,
    queue: VecDeque<PassengerId>,
    default_time: ServiceTimeDistribution,
    group_times: [Option<ServiceTimeDistribution>; 4],
    unregistered_time: Option<ServiceTimeDistribution>,
}

impl ResourceStation {
    /// Build a station from its configuration
    pub fn from_config(kind: StationKind, config: &StationConfig) -> Result<Self, ConfigValidationError> {
        let mut group_times = [None; 4];
        for (group, params) in &config.group_service_times {
            group_times[group.index()] = Some(ServiceTimeDistribution::from_params(kind, params)?);
        }
        let unregistered_time = config
            .unregistered_service_time
            .as_ref()
            .map(|params| ServiceTimeDistribution::from_params(kind, params))
            .transpose()?;

        Ok(Self {
            kind,
            capacity: config.capacity,
            in_service: 0,
            queue: VecDeque::new(),
            default_time: ServiceTimeDistribution::from_params(kind, &config.service_time)?,
            group_times,
            unregistered_time,
        })
    }

    /// Replace the desk count, e.g. with one terminal's own value
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Which station this is
    pub fn kind(&self) -> StationKind {
        self.kind
    }

    /// Number of concurrent services
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Passengers currently being served (or occupying a desk during changeover)
    pub fn in_service(&self) -> usize {
        self.in_service
    }

    /// Passengers waiting
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Passengers waiting, front first
    pub fn queued(&self) -> impl Iterator<Item = PassengerId> + '_ {
        self.queue.iter().copied()
    }

    /// Nobody in service and nobody waiting
    pub fn is_idle(&self) -> bool {
        self.in_service == 0 && self.queue.is_empty()
    }

    /// Start service immediately or join the queue
    ///
    /// Service only starts when a desk is free and the queue is empty, so a
    /// newcomer never overtakes someone already waiting.
    pub fn try_acquire(&mut self, passenger: PassengerId) -> AcquireOutcome {
        if self.in_service < self.capacity && self.queue.is_empty() {
            self.in_service += 1;
            AcquireOutcome::Started
        } else {
            self.queue.push_back(passenger);
            AcquireOutcome::Queued
        }
    }

    /// Free the desk held by a passenger whose service (and changeover) is over
    pub fn release(&mut self, passenger: PassengerId) {
        debug_assert!(self.in_service > 0, "release of {} at idle station {}", passenger, self.kind);
        debug_assert!(!self.queue.contains(&passenger), "release of queued passenger {}", passenger);
        self.in_service = self.in_service.saturating_sub(1);
    }

    /// Move the head of the queue into service if a desk is free
    pub fn admit_next(&mut self) -> Option<PassengerId> {
        if self.in_service >= self.capacity {
            return None;
        }
        let next = self.queue.pop_front()?;
        self.in_service += 1;
        Some(next)
    }

    /// Draw a service time for a passenger
    ///
    /// The EES-unregistered override wins over a group override, which wins over
    /// the station default.
    pub fn sample_service_time<R: Rng + ?Sized>(
        &self,
        group: PassengerGroup,
        ees: Option<EesStatus>,
        rng: &mut R,
    ) -> f64 {
        let dist = match (ees, self.unregistered_time.as_ref()) {
            (Some(EesStatus::Unregistered), Some(dist)) => dist,
            _ => self.group_times[group.index()].as_ref().unwrap_or(&self.default_time),
        };
        dist.sample(rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::random::RandomStreamProvider;
    use crate::types::ServiceTimeParams;

    fn station(capacity: usize) -> ResourceStation {
        let config = StationConfig::new(capacity, ServiceTimeParams::Fixed { seconds: 10.0 });
        ResourceStation::from_config(StationKind::Eu, &config).unwrap()
    }

    #[test]
    fn test_acquire_until_full_then_queue() {
        let mut station = station(2);
        assert_eq!(station.try_acquire(PassengerId(0)), AcquireOutcome::Started);
        assert_eq!(station.try_acquire(PassengerId(1)), AcquireOutcome::Started);
        assert_eq!(station.try_acquire(PassengerId(2)), AcquireOutcome::Queued);
        assert_eq!(station.in_service(), 2);
        assert_eq!(station.queue_len(), 1);
    }

    #[test]
    fn test_release_then_admit_in_fifo_order() {
        let mut station = station(1);
        station.try_acquire(PassengerId(0));
        station.try_acquire(PassengerId(1));
        station.try_acquire(PassengerId(2));

        station.release(PassengerId(0));
        assert_eq!(station.admit_next(), Some(PassengerId(1)));
        assert_eq!(station.admit_next(), None);

        station.release(PassengerId(1));
        assert_eq!(station.admit_next(), Some(PassengerId(2)));
        station.release(PassengerId(2));
        assert!(station.is_idle());
    }

    #[test]
    fn test_no_overtaking_while_queue_drains() {
        let mut station = station(1);
        station.try_acquire(PassengerId(0));
        station.try_acquire(PassengerId(1));
        station.release(PassengerId(0));

        // A desk is free but passenger 1 is still queued
        assert_eq!(station.try_acquire(PassengerId(2)), AcquireOutcome::Queued);
        assert_eq!(station.admit_next(), Some(PassengerId(1)));
        assert_eq!(station.queued().collect::<Vec<_>>(), vec![PassengerId(2)]);
    }

    #[test]
    fn test_zero_capacity_never_serves() {
        let mut station = station(3).with_capacity(0);
        assert_eq!(station.capacity(), 0);
        assert_eq!(station.try_acquire(PassengerId(0)), AcquireOutcome::Queued);
        assert_eq!(station.admit_next(), None);
    }

    #[test]
    fn test_service_time_overrides() {
        let mut config = StationConfig::new(1, ServiceTimeParams::Fixed { seconds: 10.0 });
        config
            .group_service_times
            .insert(PassengerGroup::TcnV, ServiceTimeParams::Fixed { seconds: 30.0 });
        config.unregistered_service_time = Some(ServiceTimeParams::Fixed { seconds: 90.0 });
        let station = ResourceStation::from_config(StationKind::Tcn, &config).unwrap();
        let mut rng = RandomStreamProvider::new(0).service_stream(0);

        assert_eq!(station.sample_service_time(PassengerGroup::TcnAt, Some(EesStatus::Registered), &mut rng), 10.0);
        assert_eq!(station.sample_service_time(PassengerGroup::TcnV, Some(EesStatus::Registered), &mut rng), 30.0);
        assert_eq!(station.sample_service_time(PassengerGroup::TcnV, Some(EesStatus::Unregistered), &mut rng), 90.0);
        assert_eq!(station.sample_service_time(PassengerGroup::EuManual, None, &mut rng), 10.0);
    }
}
