//! Arrival systems: drive the [ArrivalScheduler] from clock events.

use bevy_ecs::prelude::{Commands, Res, ResMut};

use crate::arrivals::ArrivalScheduler;
use crate::clock::{CurrentEvent, EventKind, SimulationClock};
use crate::runner::SimulationFault;

/// Reacts to `ArrivalsStarted`: builds the plan and schedules the first wake-up.
pub fn arrivals_started_system(
    mut clock: ResMut<SimulationClock>,
    scheduler: Option<ResMut<ArrivalScheduler>>,
    mut fault: ResMut<SimulationFault>,
    event: Res<CurrentEvent>,
) {
    if event.0.kind != EventKind::ArrivalsStarted {
        return;
    }
    let Some(mut scheduler) = scheduler else {
        return;
    };

    if let Err(error) = scheduler.begin_run(&mut clock) {
        fault.raise(error.into());
    }
}

/// Reacts to `ArrivalDue`: spawns the next planned vehicle and waits for the
/// following gap.
pub fn arrival_due_system(
    mut commands: Commands,
    mut clock: ResMut<SimulationClock>,
    scheduler: Option<ResMut<ArrivalScheduler>>,
    mut fault: ResMut<SimulationFault>,
    event: Res<CurrentEvent>,
) {
    if event.0.kind != EventKind::ArrivalDue {
        return;
    }
    let Some(mut scheduler) = scheduler else {
        return;
    };

    let wakeup = event.0.seq;
    if let Err(error) = scheduler.resume(&mut clock, wakeup, |vehicle| commands.spawn(vehicle).id()) {
        fault.raise(error.into());
    }
}
