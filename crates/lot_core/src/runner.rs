//! Simulation runner: advances the clock and routes events into the ECS.
//!
//! Clock progression and event routing happen here, outside systems. Each step
//! pops the next event from [SimulationClock], inserts it as [CurrentEvent],
//! then runs the schedule. Systems that fail park their error in
//! [SimulationFault]; the runner hands it back to the caller after the step.

use bevy_ecs::prelude::{Res, Resource, Schedule, World};
use bevy_ecs::schedule::{apply_deferred, IntoSystemConfigs};

use crate::clock::{CurrentEvent, Event, EventKind, SimulationClock};
use crate::error::SimError;
use crate::scenario::SimulationEndTime;
use crate::systems::{
    arrivals::{arrival_due_system, arrivals_started_system},
    lifecycle::{dwell_complete_system, vehicle_arrived_system},
};

/// First error raised by a system during the current step.
#[derive(Debug, Default, Resource)]
pub struct SimulationFault(Option<SimError>);

impl SimulationFault {
    /// Keep the first error of a step; later ones are logged and dropped.
    pub fn raise(&mut self, error: SimError) {
        if self.0.is_some() {
            tracing::warn!(%error, "additional fault in the same step");
            return;
        }
        self.0 = Some(error);
    }

    pub fn take(&mut self) -> Option<SimError> {
        self.0.take()
    }

    pub fn is_set(&self) -> bool {
        self.0.is_some()
    }
}

fn is_event(event: Option<Res<CurrentEvent>>, kind: EventKind) -> bool {
    event.map(|e| e.0.kind == kind).unwrap_or(false)
}

fn is_arrivals_started(event: Option<Res<CurrentEvent>>) -> bool {
    is_event(event, EventKind::ArrivalsStarted)
}

fn is_arrival_due(event: Option<Res<CurrentEvent>>) -> bool {
    is_event(event, EventKind::ArrivalDue)
}

fn is_vehicle_arrived(event: Option<Res<CurrentEvent>>) -> bool {
    is_event(event, EventKind::VehicleArrived)
}

fn is_dwell_complete(event: Option<Res<CurrentEvent>>) -> bool {
    is_event(event, EventKind::DwellComplete)
}

/// Runs one simulation step and invokes `hook` after the schedule completes.
/// Returns `Ok(false)` when the clock is empty or the next event is at or past
/// [SimulationEndTime].
pub fn run_next_event_with_hook<F>(
    world: &mut World,
    schedule: &mut Schedule,
    mut hook: F,
) -> Result<bool, SimError>
where
    F: FnMut(&World, &Event),
{
    let stop_at = world.get_resource::<SimulationEndTime>().map(|e| e.0);
    let next_ts = world
        .get_resource::<SimulationClock>()
        .and_then(|c| c.next_event_time());
    if let (Some(end), Some(ts)) = (stop_at, next_ts) {
        if ts >= end {
            return Ok(false);
        }
    }

    let event = {
        let Some(mut clock) = world.get_resource_mut::<SimulationClock>() else {
            return Err(SimError::MissingResource("SimulationClock"));
        };
        clock.pop_next()
    };
    let Some(event) = event else {
        return Ok(false);
    };
    world.insert_resource(CurrentEvent(event));
    world.init_resource::<SimulationFault>();

    schedule.run(world);

    if let Some(error) = world.resource_mut::<SimulationFault>().take() {
        tracing::warn!(%error, at = event.timestamp, kind = ?event.kind, "simulation step failed");
        return Err(error);
    }
    hook(world, &event);
    Ok(true)
}

/// Runs one simulation step: pops the next event, inserts it as [CurrentEvent], then runs the schedule.
pub fn run_next_event(world: &mut World, schedule: &mut Schedule) -> Result<bool, SimError> {
    run_next_event_with_hook(world, schedule, |_, _| {})
}

/// Runs simulation steps until the event queue is empty or `max_steps` is reached.
/// Returns the number of steps executed.
pub fn run_until_empty(
    world: &mut World,
    schedule: &mut Schedule,
    max_steps: usize,
) -> Result<usize, SimError> {
    run_until_empty_with_hook(world, schedule, max_steps, |_, _| {})
}

/// Runs simulation steps until empty and invokes `hook` after each step.
pub fn run_until_empty_with_hook<F>(
    world: &mut World,
    schedule: &mut Schedule,
    max_steps: usize,
    mut hook: F,
) -> Result<usize, SimError>
where
    F: FnMut(&World, &Event),
{
    let mut steps = 0;
    while steps < max_steps && run_next_event_with_hook(world, schedule, &mut hook)? {
        steps += 1;
    }
    Ok(steps)
}

/// Builds the default simulation schedule: the event-gated arrival and
/// lifecycle systems plus [apply_deferred] so vehicles spawned through
/// `Commands` exist before their first event is processed.
pub fn simulation_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.add_systems(
        (
            arrivals_started_system.run_if(is_arrivals_started),
            arrival_due_system.run_if(is_arrival_due),
            vehicle_arrived_system.run_if(is_vehicle_arrived),
            dwell_complete_system.run_if(is_dwell_complete),
            apply_deferred,
        )
            .chain(),
    );
    schedule
}

/// Starts the arrival scheduler's run at time 0.
/// Call this after building the scenario and before running events.
pub fn initialize_simulation(world: &mut World) -> Result<(), SimError> {
    world.init_resource::<SimulationFault>();
    let Some(mut clock) = world.get_resource_mut::<SimulationClock>() else {
        return Err(SimError::MissingResource("SimulationClock"));
    };
    let now = clock.now();
    clock.schedule_at(now, EventKind::ArrivalsStarted, None)?;
    Ok(())
}
