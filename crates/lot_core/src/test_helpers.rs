//! Test helpers for common test setup and utilities.
//!
//! This module provides shared test utilities to reduce duplication across test files.

use std::sync::{Arc, Mutex};

use bevy_ecs::prelude::World;

use crate::arrivals::{ArrivalConfig, ArrivalScheduler};
use crate::clock::{SimTime, SimulationClock};
use crate::distributions::DelaySampler;
use crate::ecs::PoolHandles;
use crate::error::{ArrivalError, SamplerError};
use crate::events::{EventLog, SharedSink};
use crate::pools::spawn_pools;
use crate::runner::SimulationFault;
use crate::scenario::{ArrivalDefaults, DwellConfig};

/// Wraps a sampler and remembers every delay it hands out.
#[derive(Debug)]
pub struct RecordingSampler<S> {
    inner: S,
    seen: Arc<Mutex<Vec<SimTime>>>,
}

impl<S: DelaySampler> RecordingSampler<S> {
    /// Returns the sampler and a handle to the delays it will record.
    pub fn new(inner: S) -> (Self, Arc<Mutex<Vec<SimTime>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                inner,
                seen: seen.clone(),
            },
            seen,
        )
    }
}

impl<S: DelaySampler> DelaySampler for RecordingSampler<S> {
    fn sample(&mut self) -> Result<SimTime, SamplerError> {
        let delay = self.inner.sample()?;
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(delay);
        }
        Ok(delay)
    }
}

/// Create a basic test world with the clock, fault slot and dwell model.
///
/// For full scenarios use [crate::scenario::build_scenario].
pub fn create_test_world() -> World {
    let mut world = World::new();
    world.insert_resource(SimulationClock::default());
    world.insert_resource(SimulationFault::default());
    world.insert_resource(DwellConfig {
        seed: 42,
        ..DwellConfig::default()
    });
    world
}

/// Spawn pools and an arrival scheduler with the given counts and plan seed,
/// recording into a fresh [EventLog].
pub fn insert_test_scheduler(
    world: &mut World,
    normal: i64,
    ev: i64,
    seed: u64,
    parking_capacity: usize,
    charger_capacity: usize,
) -> Result<(PoolHandles, Arc<EventLog>), ArrivalError> {
    let pools = spawn_pools(world, parking_capacity, charger_capacity);
    let log = Arc::new(EventLog::new());
    let sink: SharedSink = log.clone();
    let scheduler = ArrivalScheduler::new(
        &ArrivalConfig::with_counts(normal, ev).with_seed(seed),
        &ArrivalDefaults::default(),
        pools,
        sink,
    )?;
    world.insert_resource(scheduler);
    Ok((pools, log))
}
