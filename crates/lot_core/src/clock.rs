use std::cmp::Ordering;
use std::collections::BinaryHeap;

use bevy_ecs::prelude::{Entity, Resource};

use crate::error::ClockError;

/// Simulated time. Units are arbitrary; scenarios use minutes.
pub type SimTime = f64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EventKind {
    /// Starts the arrival scheduler's run.
    ArrivalsStarted,
    /// Wakes the arrival scheduler after an interarrival delay.
    ArrivalDue,
    /// First lifecycle step of a freshly spawned vehicle.
    VehicleArrived,
    /// A vehicle finished parking or charging and leaves.
    DwellComplete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSubject {
    Vehicle(Entity),
}

#[derive(Debug, Clone, Copy)]
pub struct Event {
    pub timestamp: SimTime,
    /// Insertion order; breaks timestamp ties so equal-time events run FIFO.
    pub seq: u64,
    pub kind: EventKind,
    pub subject: Option<EventSubject>,
}

impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering to make BinaryHeap a min-heap by (timestamp, seq).
        other
            .timestamp
            .total_cmp(&self.timestamp)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Event {}

/// The event currently being processed by the schedule.
#[derive(Debug, Clone, Copy, Resource)]
pub struct CurrentEvent(pub Event);

#[derive(Debug, Default, Resource)]
pub struct SimulationClock {
    now: SimTime,
    next_seq: u64,
    events: BinaryHeap<Event>,
}

impl SimulationClock {
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// Schedule an event at an absolute simulation time. Returns the event's
    /// sequence number.
    pub fn schedule_at(
        &mut self,
        at: SimTime,
        kind: EventKind,
        subject: Option<EventSubject>,
    ) -> Result<u64, ClockError> {
        if !at.is_finite() {
            return Err(ClockError::NonFinite(at));
        }
        if at < self.now {
            return Err(ClockError::InPast { at, now: self.now });
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.events.push(Event {
            timestamp: at,
            seq,
            kind,
            subject,
        });
        Ok(seq)
    }

    /// Schedule an event `delay` time units from now.
    pub fn schedule_in(
        &mut self,
        delay: SimTime,
        kind: EventKind,
        subject: Option<EventSubject>,
    ) -> Result<u64, ClockError> {
        if !delay.is_finite() {
            return Err(ClockError::NonFinite(delay));
        }
        if delay < 0.0 {
            return Err(ClockError::NegativeDelay { delay });
        }
        self.schedule_at(self.now + delay, kind, subject)
    }

    pub fn pop_next(&mut self) -> Option<Event> {
        let event = self.events.pop()?;
        self.now = event.timestamp;
        Some(event)
    }

    pub fn next_event_time(&self) -> Option<SimTime> {
        self.events.peek().map(|e| e.timestamp)
    }

    /// Number of events still queued.
    pub fn pending(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
