//! Vehicle construction hook used by the arrival scheduler.

use std::fmt;

use crate::clock::SimTime;
use crate::ecs::{PoolHandles, Vehicle, VehicleId, VehicleKind, VehicleState};
use crate::error::SpawnError;
use crate::events::SharedSink;

/// Everything a factory gets to build one vehicle.
#[derive(Debug, Clone)]
pub struct VehicleRequest {
    pub id: VehicleId,
    pub kind: VehicleKind,
    pub pools: PoolHandles,
    pub sink: SharedSink,
    pub now: SimTime,
}

pub trait VehicleFactory: Send + Sync + fmt::Debug {
    fn build(&self, request: VehicleRequest) -> Result<Vehicle, SpawnError>;
}

/// Builds a plain arriving vehicle; never fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardVehicleFactory;

impl VehicleFactory for StandardVehicleFactory {
    fn build(&self, request: VehicleRequest) -> Result<Vehicle, SpawnError> {
        Ok(Vehicle {
            id: request.id,
            kind: request.kind,
            state: VehicleState::Arriving,
            pools: request.pools,
            sink: request.sink,
            spawned_at: request.now,
            acquired_at: None,
            departed_at: None,
        })
    }
}

/// Refuses to build more than `limit` vehicles (ids `0..limit`).
#[derive(Debug, Clone, Copy)]
pub struct CappedVehicleFactory {
    pub limit: u64,
}

impl VehicleFactory for CappedVehicleFactory {
    fn build(&self, request: VehicleRequest) -> Result<Vehicle, SpawnError> {
        if request.id.0 >= self.limit {
            return Err(SpawnError::LimitReached(self.limit));
        }
        StandardVehicleFactory.build(request)
    }
}
