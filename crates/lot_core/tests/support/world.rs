#![allow(dead_code)]

use std::sync::Arc;

use bevy_ecs::prelude::World;
use lot_core::arrivals::ArrivalScheduler;
use lot_core::distributions::{DelaySampler, FixedInterArrival};
use lot_core::ecs::{PoolHandles, Vehicle};
use lot_core::events::EventLog;
use lot_core::factory::VehicleFactory;
use lot_core::runner::initialize_simulation;
use lot_core::scenario::DwellConfig;
use lot_core::test_helpers::{create_test_world, insert_test_scheduler};

/// A world with pools and an arrival scheduler, plus the handles tests inspect.
pub struct TestWorld {
    pub world: World,
    pub pools: PoolHandles,
    pub log: Arc<EventLog>,
}

impl TestWorld {
    /// All vehicles currently in the world, ordered by id.
    pub fn vehicles(&mut self) -> Vec<Vehicle> {
        let mut vehicles: Vec<Vehicle> = self
            .world
            .query::<&Vehicle>()
            .iter(&self.world)
            .cloned()
            .collect();
        vehicles.sort_by_key(|v| v.id);
        vehicles
    }

    pub fn scheduler(&self) -> &ArrivalScheduler {
        self.world.resource::<ArrivalScheduler>()
    }
}

/// Builder for reproducible arrival test worlds.
pub struct TestWorldBuilder {
    seed: u64,
    normal: i64,
    ev: i64,
    parking_capacity: usize,
    charger_capacity: usize,
    dwell: Option<DwellConfig>,
    interarrival: Option<Box<dyn FnOnce(&mut ArrivalScheduler)>>,
    factory: Option<Box<dyn FnOnce(&mut ArrivalScheduler)>>,
}

impl Default for TestWorldBuilder {
    fn default() -> Self {
        Self {
            seed: 42,
            normal: 3,
            ev: 2,
            parking_capacity: 100,
            charger_capacity: 100,
            dwell: None,
            interarrival: None,
            factory: None,
        }
    }
}

impl TestWorldBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the plan seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_counts(mut self, normal: i64, ev: i64) -> Self {
        self.normal = normal;
        self.ev = ev;
        self
    }

    pub fn with_capacities(mut self, parking: usize, chargers: usize) -> Self {
        self.parking_capacity = parking;
        self.charger_capacity = chargers;
        self
    }

    pub fn with_dwell(mut self, dwell: DwellConfig) -> Self {
        self.dwell = Some(dwell);
        self
    }

    /// Use a constant interarrival gap.
    pub fn with_fixed_gap(self, gap: f64) -> Self {
        self.with_interarrival(FixedInterArrival::new(gap))
    }

    pub fn with_interarrival(mut self, sampler: impl DelaySampler + 'static) -> Self {
        self.interarrival = Some(Box::new(move |s: &mut ArrivalScheduler| {
            s.set_interarrival(sampler)
        }));
        self
    }

    pub fn with_factory(mut self, factory: impl VehicleFactory + 'static) -> Self {
        self.factory = Some(Box::new(move |s: &mut ArrivalScheduler| {
            s.set_factory(factory)
        }));
        self
    }

    /// Build the world without starting the arrival run.
    pub fn build(self) -> TestWorld {
        let mut world = create_test_world();
        if let Some(dwell) = self.dwell {
            world.insert_resource(dwell);
        }
        let (pools, log) = insert_test_scheduler(
            &mut world,
            self.normal,
            self.ev,
            self.seed,
            self.parking_capacity,
            self.charger_capacity,
        )
        .expect("valid test scheduler");
        {
            let mut scheduler = world.resource_mut::<ArrivalScheduler>();
            if let Some(apply) = self.interarrival {
                apply(&mut *scheduler);
            }
            if let Some(apply) = self.factory {
                apply(&mut *scheduler);
            }
        }
        TestWorld { world, pools, log }
    }

    /// Build the world and schedule the arrival run at time 0.
    pub fn build_started(self) -> TestWorld {
        let mut test_world = self.build();
        initialize_simulation(&mut test_world.world).expect("initialize");
        test_world
    }
}
