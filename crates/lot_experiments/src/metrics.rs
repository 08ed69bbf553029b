//! Per-run summary of the arrival stream, derived from the lifecycle event log.

use lot_core::ecs::VehicleKind;
use lot_core::events::{LotAction, LotEvent};
use serde::{Deserialize, Serialize};

/// Counts and arrival window of a single replication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub seed: u64,
    /// Normal vehicles that reached the lot.
    pub spawned_normal: usize,
    /// EVs that reached the lot.
    pub spawned_ev: usize,
    /// Time of the first arrival, if any vehicle arrived.
    pub first_arrival: Option<f64>,
    pub last_arrival: Option<f64>,
    /// Simulation steps executed.
    pub steps: usize,
    /// Lifecycle events recorded.
    pub events: usize,
}

/// Build the summary for one run from its recorded events.
pub fn summarize(seed: u64, steps: usize, events: &[LotEvent]) -> RunSummary {
    let arrivals: Vec<&LotEvent> = events
        .iter()
        .filter(|e| e.action == LotAction::Arrived)
        .collect();
    let spawned_ev = arrivals.iter().filter(|e| e.kind == VehicleKind::Ev).count();

    RunSummary {
        seed,
        spawned_normal: arrivals.len() - spawned_ev,
        spawned_ev,
        first_arrival: arrivals.first().map(|e| e.time),
        last_arrival: arrivals.last().map(|e| e.time),
        steps,
        events: events.len(),
    }
}
