//! Event sink: where vehicle lifecycles report what happened to them.
//!
//! Sinks are shared (`Arc`) and handed to every vehicle untouched by the
//! arrival scheduler.

use std::fmt;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::clock::SimTime;
use crate::ecs::{VehicleId, VehicleKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LotAction {
    Arrived,
    Queued,
    Acquired,
    Departed,
}

impl fmt::Display for LotAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LotAction::Arrived => "arrived",
            LotAction::Queued => "queued",
            LotAction::Acquired => "acquired",
            LotAction::Departed => "departed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LotEvent {
    pub time: SimTime,
    pub vehicle: VehicleId,
    pub kind: VehicleKind,
    pub action: LotAction,
}

pub trait EventSink: Send + Sync + fmt::Debug {
    fn record(&self, event: LotEvent);
}

pub type SharedSink = Arc<dyn EventSink>;

/// In-memory sink that keeps every event in arrival order.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Mutex<Vec<LotEvent>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of all events recorded so far.
    pub fn snapshot(&self) -> Vec<LotEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn len(&self) -> usize {
        match self.events.lock() {
            Ok(events) => events.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Events with the given action, in recording order.
    pub fn with_action(&self, action: LotAction) -> Vec<LotEvent> {
        self.snapshot()
            .into_iter()
            .filter(|e| e.action == action)
            .collect()
    }
}

impl EventSink for EventLog {
    fn record(&self, event: LotEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

/// Forwards events to `tracing` at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn record(&self, event: LotEvent) {
        tracing::info!(
            time = event.time,
            vehicle = event.vehicle.0,
            kind = %event.kind,
            action = %event.action,
            "lot event"
        );
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn record(&self, _event: LotEvent) {}
}
