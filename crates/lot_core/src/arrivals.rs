//! Arrival scheduler: decides when vehicles enter the facility and in what mix.
//!
//! A run shuffles a fixed multiset of vehicle kinds into an [ArrivalPlan], then
//! alternates between waiting one sampled interarrival gap (an `ArrivalDue`
//! wake-up on the clock) and spawning exactly one vehicle. Spawned vehicles get
//! their own `VehicleArrived` event and are never looked at again here.

use bevy_ecs::prelude::{Entity, Mut, Resource, World};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::clock::{EventKind, EventSubject, SimTime, SimulationClock};
use crate::distributions::{checked_delay, DelaySampler, ExponentialInterArrival, StreamSeeds};
use crate::ecs::{PoolHandles, Vehicle, VehicleId, VehicleKind};
use crate::error::{ArrivalError, SamplerError, SimError, SpawnError};
use crate::events::SharedSink;
use crate::factory::{StandardVehicleFactory, VehicleFactory, VehicleRequest};
use crate::scenario::ArrivalDefaults;

/// Shuffled sequence of vehicle kinds for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrivalPlan {
    kinds: Vec<VehicleKind>,
}

impl ArrivalPlan {
    /// `normal` Normals followed by `ev` EVs, uniformly permuted.
    pub fn shuffled<R: Rng + ?Sized>(normal: usize, ev: usize, rng: &mut R) -> Self {
        let mut kinds = Vec::with_capacity(normal + ev);
        kinds.extend(std::iter::repeat(VehicleKind::Normal).take(normal));
        kinds.extend(std::iter::repeat(VehicleKind::Ev).take(ev));
        kinds.shuffle(rng);
        Self { kinds }
    }

    pub fn kinds(&self) -> &[VehicleKind] {
        &self.kinds
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    pub fn count(&self, kind: VehicleKind) -> usize {
        self.kinds.iter().filter(|k| **k == kind).count()
    }
}

/// Requested counts and seed. Counts are signed because they usually come
/// straight from a config file; negatives are rejected by [ArrivalScheduler::new].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArrivalConfig {
    /// Falls back to [ArrivalDefaults::normal_count] when `None`.
    pub normal_count: Option<i64>,
    /// Falls back to [ArrivalDefaults::ev_count] when `None`.
    pub ev_count: Option<i64>,
    /// Seeds the plan shuffle and the default sampler, through [StreamSeeds].
    /// `None` uses entropy.
    pub plan_seed: Option<u64>,
}

impl ArrivalConfig {
    pub fn with_counts(normal: i64, ev: i64) -> Self {
        Self {
            normal_count: Some(normal),
            ev_count: Some(ev),
            plan_seed: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.plan_seed = Some(seed);
        self
    }
}

fn resolve_count(field: &str, requested: Option<i64>, default: usize) -> Result<usize, ArrivalError> {
    match requested {
        None => Ok(default),
        Some(n) => usize::try_from(n).map_err(|_| {
            ArrivalError::Configuration(format!("{field} must be non-negative, got {n}"))
        }),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrivalStatus {
    /// Constructed, run not started.
    Idle,
    /// Waiting on an `ArrivalDue` wake-up.
    Running,
    /// Every planned vehicle was spawned.
    Finished,
    /// A spawn or sampler failure stopped the run.
    Aborted,
}

#[derive(Debug, Resource)]
pub struct ArrivalScheduler {
    normal_count: usize,
    ev_count: usize,
    pools: PoolHandles,
    sink: SharedSink,
    interarrival: Box<dyn DelaySampler>,
    factory: Box<dyn VehicleFactory>,
    plan_rng: StdRng,
    plan: Option<ArrivalPlan>,
    /// Index of the next plan entry to spawn.
    cursor: usize,
    /// Clock sequence number of the one `ArrivalDue` this run is waiting on.
    pending_wakeup: Option<u64>,
    next_id: u64,
    status: ArrivalStatus,
}

impl ArrivalScheduler {
    /// Validate counts and set up the default exponential sampler.
    pub fn new(
        config: &ArrivalConfig,
        defaults: &ArrivalDefaults,
        pools: PoolHandles,
        sink: SharedSink,
    ) -> Result<Self, ArrivalError> {
        let normal_count = resolve_count("normal_count", config.normal_count, defaults.normal_count)?;
        let ev_count = resolve_count("ev_count", config.ev_count, defaults.ev_count)?;

        let (plan_rng, interarrival) = match config.plan_seed {
            Some(seed) => {
                let streams = StreamSeeds::derive(seed);
                (
                    StdRng::seed_from_u64(streams.plan),
                    ExponentialInterArrival::with_seed(
                        defaults.mean_interarrival,
                        streams.interarrival,
                    )?,
                )
            }
            None => (
                StdRng::from_entropy(),
                ExponentialInterArrival::from_entropy(defaults.mean_interarrival)?,
            ),
        };

        Ok(Self {
            normal_count,
            ev_count,
            pools,
            sink,
            interarrival: Box::new(interarrival),
            factory: Box::new(StandardVehicleFactory),
            plan_rng,
            plan: None,
            cursor: 0,
            pending_wakeup: None,
            next_id: 0,
            status: ArrivalStatus::Idle,
        })
    }

    /// Replace the interarrival sampler.
    pub fn with_interarrival(mut self, sampler: impl DelaySampler + 'static) -> Self {
        self.set_interarrival(sampler);
        self
    }

    pub fn with_factory(mut self, factory: impl VehicleFactory + 'static) -> Self {
        self.set_factory(factory);
        self
    }

    pub fn set_interarrival(&mut self, sampler: impl DelaySampler + 'static) {
        self.interarrival = Box::new(sampler);
    }

    pub fn set_factory(&mut self, factory: impl VehicleFactory + 'static) {
        self.factory = Box::new(factory);
    }

    pub fn normal_count(&self) -> usize {
        self.normal_count
    }

    pub fn ev_count(&self) -> usize {
        self.ev_count
    }

    pub fn status(&self) -> ArrivalStatus {
        self.status
    }

    /// Plan of the current (or last) run.
    pub fn plan(&self) -> Option<&ArrivalPlan> {
        self.plan.as_ref()
    }

    /// Vehicles created so far, planned and injected.
    pub fn spawned_count(&self) -> u64 {
        self.next_id
    }

    /// Planned vehicles not yet spawned in the current run.
    pub fn remaining(&self) -> usize {
        self.plan
            .as_ref()
            .map_or(0, |plan| plan.len().saturating_sub(self.cursor))
    }

    pub fn pools(&self) -> PoolHandles {
        self.pools
    }

    /// Build this run's plan and schedule the first wake-up.
    ///
    /// An empty plan finishes immediately without touching the clock.
    pub fn begin_run(&mut self, clock: &mut SimulationClock) -> Result<(), ArrivalError> {
        if self.status == ArrivalStatus::Running {
            return Err(ArrivalError::Configuration(
                "arrival run already in progress".to_string(),
            ));
        }

        let plan = ArrivalPlan::shuffled(self.normal_count, self.ev_count, &mut self.plan_rng);
        tracing::debug!(
            normal = self.normal_count,
            ev = self.ev_count,
            at = clock.now(),
            "arrival plan built"
        );
        let empty = plan.is_empty();
        self.plan = Some(plan);
        self.cursor = 0;
        self.pending_wakeup = None;

        if empty {
            self.status = ArrivalStatus::Finished;
            return Ok(());
        }
        self.status = ArrivalStatus::Running;
        self.suspend(clock)
    }

    /// Handle an `ArrivalDue` wake-up: spawn the next planned vehicle and, if
    /// the plan is not exhausted, wait for the next gap.
    ///
    /// `wakeup` is the clock sequence number of the event being handled. Only
    /// the wake-up this scheduler scheduled itself advances the plan; any other
    /// `ArrivalDue`, or one outside a running plan, returns `None`.
    pub fn resume<F>(
        &mut self,
        clock: &mut SimulationClock,
        wakeup: u64,
        spawn: F,
    ) -> Result<Option<Entity>, ArrivalError>
    where
        F: FnOnce(Vehicle) -> Entity,
    {
        if self.status != ArrivalStatus::Running {
            return Ok(None);
        }
        if self.pending_wakeup != Some(wakeup) {
            tracing::debug!(wakeup, expected = ?self.pending_wakeup, "ignoring foreign arrival wake-up");
            return Ok(None);
        }
        self.pending_wakeup = None;
        let Some(kind) = self
            .plan
            .as_ref()
            .and_then(|plan| plan.kinds().get(self.cursor).copied())
        else {
            self.status = ArrivalStatus::Finished;
            return Ok(None);
        };
        self.cursor += 1;

        let entity = self.spawn_vehicle(kind, clock, spawn)?;

        if self.remaining() == 0 {
            self.status = ArrivalStatus::Finished;
            tracing::debug!(spawned = self.next_id, at = clock.now(), "arrival plan exhausted");
        } else {
            self.suspend(clock)?;
        }
        Ok(Some(entity))
    }

    /// Create one vehicle of `kind` now and start its lifecycle.
    ///
    /// `spawn` inserts the vehicle into the world and returns its entity;
    /// inside a system that is `Commands::spawn`, outside it `World::spawn`.
    /// A failure aborts any run in progress.
    pub fn spawn_vehicle<F>(
        &mut self,
        kind: VehicleKind,
        clock: &mut SimulationClock,
        spawn: F,
    ) -> Result<Entity, ArrivalError>
    where
        F: FnOnce(Vehicle) -> Entity,
    {
        let id = VehicleId(self.next_id);
        let now = clock.now();
        let request = VehicleRequest {
            id,
            kind,
            pools: self.pools,
            sink: self.sink.clone(),
            now,
        };
        let vehicle = self
            .factory
            .build(request)
            .map_err(|source| self.abort(ArrivalError::Spawn { id, kind, source }))?;

        let entity = spawn(vehicle);
        clock
            .schedule_at(now, EventKind::VehicleArrived, Some(EventSubject::Vehicle(entity)))
            .map_err(|e| {
                self.abort(ArrivalError::Spawn {
                    id,
                    kind,
                    source: SpawnError::NotStarted(e.to_string()),
                })
            })?;

        self.next_id += 1;
        tracing::trace!(id = id.0, %kind, at = now, "vehicle spawned");
        Ok(entity)
    }

    /// Sample the next gap and schedule the wake-up. Sole suspension point.
    fn suspend(&mut self, clock: &mut SimulationClock) -> Result<(), ArrivalError> {
        let delay = self
            .interarrival
            .sample()
            .and_then(checked_delay)
            .map_err(|e| self.abort(e.into()))?;
        let seq = clock
            .schedule_in(delay, EventKind::ArrivalDue, None)
            .map_err(|_| self.abort(SamplerError::NotFinite(delay).into()))?;
        self.pending_wakeup = Some(seq);
        Ok(())
    }

    fn abort(&mut self, error: ArrivalError) -> ArrivalError {
        if self.status == ArrivalStatus::Running {
            self.status = ArrivalStatus::Aborted;
        }
        error
    }
}

/// Inject one vehicle of `kind` outside the arrival plan, at the current time.
pub fn inject_vehicle(world: &mut World, kind: VehicleKind) -> Result<Entity, SimError> {
    if !world.contains_resource::<SimulationClock>() {
        return Err(SimError::MissingResource("SimulationClock"));
    }
    if !world.contains_resource::<ArrivalScheduler>() {
        return Err(SimError::MissingResource("ArrivalScheduler"));
    }
    world.resource_scope(|world, mut clock: Mut<SimulationClock>| {
        world.resource_scope(|world, mut scheduler: Mut<ArrivalScheduler>| {
            scheduler
                .spawn_vehicle(kind, &mut clock, |vehicle| world.spawn(vehicle).id())
                .map_err(SimError::from)
        })
    })
}

/// Sum of the given delays: the time at which the k-th planned vehicle spawns
/// when the run starts at `start`.
pub fn spawn_times(start: SimTime, delays: &[SimTime]) -> Vec<SimTime> {
    delays
        .iter()
        .scan(start, |t, d| {
            *t += d;
            Some(*t)
        })
        .collect()
}
