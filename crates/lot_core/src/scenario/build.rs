use std::sync::Arc;

use bevy_ecs::prelude::{Resource, World};

use crate::arrivals::ArrivalScheduler;
use crate::clock::SimulationClock;
use crate::distributions::StreamSeeds;
use crate::ecs::PoolHandles;
use crate::error::SimError;
use crate::events::{EventLog, SharedSink};
use crate::pools::spawn_pools;
use crate::runner::SimulationFault;
use crate::scenario::params::{DwellConfig, ScenarioParams, SimulationEndTime};

/// What callers need to inspect a built scenario.
#[derive(Debug, Clone, Resource)]
pub struct ScenarioHandles {
    pub pools: PoolHandles,
    /// The sink every vehicle records into.
    pub event_log: Arc<EventLog>,
}

/// Populate `world` with the clock, pools, dwell model and arrival scheduler.
///
/// The plan shuffle, interarrival gaps and dwell times each get their own
/// [StreamSeeds] sub-seed of `params.seed`.
pub fn build_scenario(world: &mut World, params: ScenarioParams) -> Result<ScenarioHandles, SimError> {
    params.validate()?;

    world.insert_resource(SimulationClock::default());
    world.insert_resource(SimulationFault::default());
    world.insert_resource(DwellConfig {
        mean_parking_time: params.mean_parking_time,
        mean_charging_time: params.mean_charging_time,
        seed: params
            .seed
            .map_or_else(rand::random::<u64>, |seed| StreamSeeds::derive(seed).dwell),
    });
    if let Some(end) = params.simulation_end_time {
        world.insert_resource(SimulationEndTime(end));
    }

    let pools = spawn_pools(world, params.parking_capacity, params.charger_capacity);
    let event_log = Arc::new(EventLog::new());
    let sink: SharedSink = event_log.clone();

    let scheduler = ArrivalScheduler::new(
        &params.arrival_config(),
        &params.arrival_defaults(),
        pools,
        sink,
    )?;
    world.insert_resource(scheduler);

    let handles = ScenarioHandles { pools, event_log };
    world.insert_resource(handles.clone());
    tracing::debug!(
        parking = params.parking_capacity,
        chargers = params.charger_capacity,
        seed = ?params.seed,
        "scenario built"
    );
    Ok(handles)
}
