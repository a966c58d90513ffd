//! Virtual clock and event queue
//!
//! Events are executed in non-decreasing virtual time. Events scheduled for the
//! same instant run in the order they were scheduled, which keeps every run fully
//! deterministic.

use crate::types::{PassengerId, StationKey};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// What happens when an event fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// A passenger reaches the checkpoint and heads for the first station
    PassengerArrival {
        /// Arriving passenger
        passenger: PassengerId,
    },
    /// A passenger holding a desk begins service
    ServiceStart {
        /// Passenger being served
        passenger: PassengerId,
        /// Station serving
        station: StationKey,
    },
    /// Service (and desk changeover) is over
    ServiceCompletion {
        /// Passenger leaving the desk
        passenger: PassengerId,
        /// Station released
        station: StationKey,
    },
    /// Free desks at a station take passengers from the queue
    QueueAdvance {
        /// Station whose queue moves
        station: StationKey,
    },
}

/// An event with its firing time and scheduling sequence number
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledEvent {
    /// Virtual time in seconds after t0
    pub time: f64,
    /// Monotonic insertion counter used to break ties
    pub seq: u64,
    /// Event payload
    pub kind: EventKind,
}

impl Eq for ScheduledEvent {}

impl Ord for ScheduledEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap: reverse so the earliest (then first scheduled) pops first
        other.time.total_cmp(&self.time).then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for ScheduledEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Virtual clock plus pending events
#[derive(Debug, Default)]
pub struct Scheduler {
    queue: BinaryHeap<ScheduledEvent>,
    next_seq: u64,
    now: f64,
    processed: u64,
}

impl Scheduler {
    /// Create an empty scheduler at time zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Events popped so far
    pub fn processed(&self) -> u64 {
        self.processed
    }

    /// Number of pending events
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Whether no events are pending
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Schedule an event; times in the past are clamped to now
    pub fn schedule(&mut self, time: f64, kind: EventKind) {
        debug_assert!(time >= self.now, "event {:?} scheduled in the past ({} < {})", kind, time, self.now);
        let event = ScheduledEvent { time: time.max(self.now), seq: self.next_seq, kind };
        self.next_seq += 1;
        self.queue.push(event);
    }

    /// Schedule an event at the current time
    pub fn schedule_now(&mut self, kind: EventKind) {
        self.schedule(self.now, kind);
    }

    /// Time of the next pending event
    pub fn peek_time(&self) -> Option<f64> {
        self.queue.peek().map(|event| event.time)
    }

    /// Pop the next event if it fires no later than `until`, advancing the clock
    pub fn pop_until(&mut self, until: Option<f64>) -> Option<ScheduledEvent> {
        let next_time = self.peek_time()?;
        if until.is_some_and(|limit| next_time > limit) {
            return None;
        }
        let event = self.queue.pop()?;
        self.now = event.time;
        self.processed += 1;
        Some(event)
    }

    /// Pop the next event, advancing the clock
    pub fn pop(&mut self) -> Option<ScheduledEvent> {
        self.pop_until(None)
    }
}
