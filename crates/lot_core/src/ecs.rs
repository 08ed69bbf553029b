use std::fmt;

use bevy_ecs::prelude::{Component, Entity};
use serde::{Deserialize, Serialize};

use crate::clock::SimTime;
use crate::events::SharedSink;

/// Identifier handed out by the arrival scheduler, in creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VehicleId(pub u64);

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which pool a vehicle ultimately needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleKind {
    Normal,
    Ev,
}

impl fmt::Display for VehicleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VehicleKind::Normal => f.write_str("normal"),
            VehicleKind::Ev => f.write_str("ev"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehicleState {
    Arriving,
    Queued,
    Parked,
    Charging,
    Departed,
}

/// Pair of pool entities every vehicle receives at spawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolHandles {
    /// General parking spaces.
    pub general: Entity,
    /// EV chargers.
    pub dedicated: Entity,
}

impl PoolHandles {
    pub fn for_kind(&self, kind: VehicleKind) -> Entity {
        match kind {
            VehicleKind::Normal => self.general,
            VehicleKind::Ev => self.dedicated,
        }
    }
}

#[derive(Debug, Clone, Component)]
pub struct Vehicle {
    pub id: VehicleId,
    pub kind: VehicleKind,
    pub state: VehicleState,
    pub pools: PoolHandles,
    pub sink: SharedSink,
    /// Simulation time at which the arrival scheduler created the vehicle.
    pub spawned_at: SimTime,
    /// Set once the vehicle holds a slot in its pool.
    pub acquired_at: Option<SimTime>,
    pub departed_at: Option<SimTime>,
}

impl Vehicle {
    /// Time spent queued before acquiring a slot; `None` until acquired.
    pub fn wait_time(&self) -> Option<SimTime> {
        self.acquired_at.map(|at| at - self.spawned_at)
    }
}
