//! Vehicle lifecycle: arrive, wait for a slot in the matching pool, dwell, leave.
//!
//! Deliberately plain: one pool per kind, FIFO waiting, no balking.

use bevy_ecs::prelude::{Entity, Query, Res, ResMut};

use crate::clock::{CurrentEvent, EventKind, EventSubject, SimTime, SimulationClock};
use crate::ecs::{Vehicle, VehicleKind, VehicleState};
use crate::error::SimError;
use crate::events::{LotAction, LotEvent};
use crate::pools::ResourcePool;
use crate::runner::SimulationFault;
use crate::scenario::DwellConfig;

fn record(vehicle: &Vehicle, time: SimTime, action: LotAction) {
    vehicle.sink.record(LotEvent {
        time,
        vehicle: vehicle.id,
        kind: vehicle.kind,
        action,
    });
}

/// Mark the vehicle as holding its slot and schedule its departure.
fn start_dwell(
    entity: Entity,
    vehicle: &mut Vehicle,
    dwell: &DwellConfig,
    clock: &mut SimulationClock,
) -> Result<(), SimError> {
    let now = clock.now();
    vehicle.state = match vehicle.kind {
        VehicleKind::Normal => VehicleState::Parked,
        VehicleKind::Ev => VehicleState::Charging,
    };
    vehicle.acquired_at = Some(now);
    record(vehicle, now, LotAction::Acquired);

    let duration = dwell
        .sample(vehicle.id, vehicle.kind)
        .map_err(|e| SimError::Lifecycle {
            vehicle: vehicle.id,
            reason: e.to_string(),
        })?;
    clock.schedule_in(
        duration,
        EventKind::DwellComplete,
        Some(EventSubject::Vehicle(entity)),
    )?;
    tracing::trace!(vehicle = vehicle.id.0, at = now, duration, "dwell started");
    Ok(())
}

fn subject_vehicle(event: &CurrentEvent) -> Option<Entity> {
    match event.0.subject {
        Some(EventSubject::Vehicle(entity)) => Some(entity),
        None => None,
    }
}

/// First lifecycle step: take a slot or join the queue.
pub fn vehicle_arrived_system(
    mut clock: ResMut<SimulationClock>,
    dwell: Option<Res<DwellConfig>>,
    mut fault: ResMut<SimulationFault>,
    event: Res<CurrentEvent>,
    mut vehicles: Query<&mut Vehicle>,
    mut pools: Query<&mut ResourcePool>,
) {
    if event.0.kind != EventKind::VehicleArrived {
        return;
    }
    let Some(entity) = subject_vehicle(&event) else {
        return;
    };
    let Ok(mut vehicle) = vehicles.get_mut(entity) else {
        fault.raise(SimError::UnknownVehicle(entity));
        return;
    };
    let dwell = dwell.map(|d| *d).unwrap_or_default();
    let now = clock.now();
    record(&vehicle, now, LotAction::Arrived);

    let pool_entity = vehicle.pools.for_kind(vehicle.kind);
    let Ok(mut pool) = pools.get_mut(pool_entity) else {
        fault.raise(SimError::Lifecycle {
            vehicle: vehicle.id,
            reason: format!("no pool on entity {pool_entity:?}"),
        });
        return;
    };

    if pool.try_acquire() {
        if let Err(error) = start_dwell(entity, &mut vehicle, &dwell, &mut clock) {
            fault.raise(error);
        }
    } else {
        pool.enqueue(entity);
        vehicle.state = VehicleState::Queued;
        record(&vehicle, now, LotAction::Queued);
    }
}

/// Departure: free the slot, handing it to the next waiter if any.
pub fn dwell_complete_system(
    mut clock: ResMut<SimulationClock>,
    dwell: Option<Res<DwellConfig>>,
    mut fault: ResMut<SimulationFault>,
    event: Res<CurrentEvent>,
    mut vehicles: Query<&mut Vehicle>,
    mut pools: Query<&mut ResourcePool>,
) {
    if event.0.kind != EventKind::DwellComplete {
        return;
    }
    let Some(entity) = subject_vehicle(&event) else {
        return;
    };
    let now = clock.now();

    let (pool_entity, vehicle_id) = {
        let Ok(mut vehicle) = vehicles.get_mut(entity) else {
            fault.raise(SimError::UnknownVehicle(entity));
            return;
        };
        vehicle.state = VehicleState::Departed;
        vehicle.departed_at = Some(now);
        record(&vehicle, now, LotAction::Departed);
        (vehicle.pools.for_kind(vehicle.kind), vehicle.id)
    };

    let Ok(mut pool) = pools.get_mut(pool_entity) else {
        fault.raise(SimError::Lifecycle {
            vehicle: vehicle_id,
            reason: format!("no pool on entity {pool_entity:?}"),
        });
        return;
    };
    let Some(next) = pool.release() else {
        return;
    };

    let Ok(mut waiter) = vehicles.get_mut(next) else {
        fault.raise(SimError::UnknownVehicle(next));
        return;
    };
    let dwell = dwell.map(|d| *d).unwrap_or_default();
    if let Err(error) = start_dwell(next, &mut waiter, &dwell, &mut clock) {
        fault.raise(error);
    }
}
