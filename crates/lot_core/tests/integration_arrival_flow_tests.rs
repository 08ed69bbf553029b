mod support;

use bevy_ecs::prelude::World;
use lot_core::arrivals::{inject_vehicle, spawn_times, ArrivalScheduler, ArrivalStatus};
use lot_core::clock::{EventKind, SimulationClock};
use lot_core::distributions::{ExponentialInterArrival, ReplayInterArrival};
use lot_core::ecs::{VehicleId, VehicleKind};
use lot_core::error::{ArrivalError, SamplerError, SimError, SpawnError};
use lot_core::events::LotAction;
use lot_core::factory::CappedVehicleFactory;
use lot_core::runner::initialize_simulation;
use lot_core::scenario::{build_scenario, ScenarioParams};
use lot_core::test_helpers::{create_test_world, insert_test_scheduler, RecordingSampler};
use support::schedule::ScheduleRunner;
use support::world::TestWorldBuilder;

#[test]
fn constant_gap_spawns_one_vehicle_per_time_unit() {
    let mut tw = TestWorldBuilder::new()
        .with_counts(3, 2)
        .with_fixed_gap(1.0)
        .build_started();

    let mut runner = ScheduleRunner::new();
    runner.run_full(&mut tw.world).expect("run");

    let vehicles = tw.vehicles();
    assert_eq!(vehicles.len(), 5);
    let ids: Vec<u64> = vehicles.iter().map(|v| v.id.0).collect();
    assert_eq!(ids, vec![0, 1, 2, 3, 4]);
    let times: Vec<f64> = vehicles.iter().map(|v| v.spawned_at).collect();
    assert_eq!(times, vec![1.0, 2.0, 3.0, 4.0, 5.0]);

    let normals = vehicles
        .iter()
        .filter(|v| v.kind == VehicleKind::Normal)
        .count();
    let evs = vehicles.iter().filter(|v| v.kind == VehicleKind::Ev).count();
    assert_eq!((normals, evs), (3, 2));

    // Spawn order follows the plan.
    let plan = tw.scheduler().plan().expect("plan").kinds().to_vec();
    let spawned: Vec<VehicleKind> = vehicles.iter().map(|v| v.kind).collect();
    assert_eq!(plan, spawned);
    assert_eq!(tw.scheduler().status(), ArrivalStatus::Finished);

    let arrivals = tw.log.with_action(LotAction::Arrived);
    let arrival_times: Vec<f64> = arrivals.iter().map(|e| e.time).collect();
    assert_eq!(arrival_times, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
}

#[test]
fn spawn_times_are_prefix_sums_of_sampled_delays() {
    let (sampler, seen) =
        RecordingSampler::new(ExponentialInterArrival::with_seed(1.5, 17).expect("sampler"));
    let mut tw = TestWorldBuilder::new()
        .with_counts(12, 8)
        .with_interarrival(sampler)
        .build_started();

    ScheduleRunner::new().run_full(&mut tw.world).expect("run");

    let delays = seen.lock().expect("lock").clone();
    assert_eq!(delays.len(), 20);
    assert!(delays.iter().all(|d| *d >= 0.0));

    let spawned: Vec<f64> = tw.vehicles().iter().map(|v| v.spawned_at).collect();
    assert_eq!(spawned, spawn_times(0.0, &delays));
}

#[test]
fn empty_plan_finishes_without_waiting() {
    let mut tw = TestWorldBuilder::new().with_counts(0, 0).build_started();

    let steps = ScheduleRunner::new().run_full(&mut tw.world).expect("run");
    assert_eq!(steps, 1, "only ArrivalsStarted is processed");
    assert!(tw.vehicles().is_empty());
    assert_eq!(tw.scheduler().status(), ArrivalStatus::Finished);
    let clock = tw.world.resource::<SimulationClock>();
    assert_eq!(clock.now(), 0.0);
    assert!(clock.is_empty());
}

#[test]
fn direct_injection_uses_consecutive_ids_without_delay() {
    let mut tw = TestWorldBuilder::new().build();

    let first = inject_vehicle(&mut tw.world, VehicleKind::Ev).expect("first");
    let second = inject_vehicle(&mut tw.world, VehicleKind::Ev).expect("second");
    assert_ne!(first, second);

    let vehicles = tw.vehicles();
    assert_eq!(vehicles.len(), 2);
    assert_eq!(vehicles[0].id, VehicleId(0));
    assert_eq!(vehicles[1].id, VehicleId(1));
    assert!(vehicles.iter().all(|v| v.kind == VehicleKind::Ev));
    assert!(vehicles.iter().all(|v| v.spawned_at == 0.0));
    assert_eq!(vehicles[0].pools, tw.pools);

    // Each injected vehicle's lifecycle is queued at the current time.
    let clock = tw.world.resource::<SimulationClock>();
    assert_eq!(clock.pending(), 2);
    assert_eq!(clock.next_event_time(), Some(0.0));
    assert_eq!(tw.scheduler().spawned_count(), 2);
    assert_eq!(tw.scheduler().status(), ArrivalStatus::Idle);
}

#[test]
fn injected_vehicles_share_the_identity_counter_with_the_plan() {
    let mut tw = TestWorldBuilder::new()
        .with_counts(2, 2)
        .with_fixed_gap(1.0)
        .build_started();
    let mut runner = ScheduleRunner::new();

    // ArrivalsStarted, then the first ArrivalDue at t=1.
    runner.run_one(&mut tw.world).expect("start");
    runner.run_one(&mut tw.world).expect("first arrival");
    inject_vehicle(&mut tw.world, VehicleKind::Normal).expect("inject");
    runner.run_full(&mut tw.world).expect("rest");

    let vehicles = tw.vehicles();
    let ids: Vec<u64> = vehicles.iter().map(|v| v.id.0).collect();
    assert_eq!(ids, vec![0, 1, 2, 3, 4]);
    assert_eq!(vehicles[1].spawned_at, 1.0, "injected at the current time");
    assert_eq!(vehicles[2].spawned_at, 2.0);
}

#[test]
fn factory_failure_aborts_the_remaining_plan() {
    let mut tw = TestWorldBuilder::new()
        .with_counts(3, 2)
        .with_fixed_gap(1.0)
        .with_factory(CappedVehicleFactory { limit: 2 })
        .build_started();
    let mut runner = ScheduleRunner::new();

    let err = runner.run_full(&mut tw.world).expect_err("third spawn fails");
    assert!(matches!(
        err,
        SimError::Arrival(ArrivalError::Spawn {
            id: VehicleId(2),
            source: SpawnError::LimitReached(2),
            ..
        })
    ));
    assert_eq!(tw.scheduler().status(), ArrivalStatus::Aborted);
    assert_eq!(tw.world.resource::<SimulationClock>().now(), 3.0);

    // Draining the rest only finishes the lifecycles already started.
    runner.run_full(&mut tw.world).expect("drain");
    assert_eq!(tw.vehicles().len(), 2);
    assert_eq!(tw.scheduler().spawned_count(), 2);
}

#[test]
fn negative_delay_is_surfaced_immediately() {
    let mut tw = TestWorldBuilder::new()
        .with_counts(3, 0)
        .with_interarrival(ReplayInterArrival::new([1.0, -2.0]))
        .build_started();

    let err = ScheduleRunner::new()
        .run_full(&mut tw.world)
        .expect_err("negative delay");
    assert!(matches!(
        err,
        SimError::Arrival(ArrivalError::Sampler(SamplerError::Negative(d))) if d == -2.0
    ));
    assert_eq!(tw.scheduler().status(), ArrivalStatus::Aborted);
    // The vehicle spawned before the bad sample still exists.
    assert_eq!(tw.vehicles().len(), 1);
}

#[test]
fn exhausted_sampler_is_fatal() {
    let mut tw = TestWorldBuilder::new()
        .with_counts(1, 1)
        .with_interarrival(ReplayInterArrival::new([0.5]))
        .build_started();

    let err = ScheduleRunner::new()
        .run_full(&mut tw.world)
        .expect_err("sampler runs dry");
    assert!(matches!(
        err,
        SimError::Arrival(ArrivalError::Sampler(SamplerError::Exhausted))
    ));
}

#[test]
fn negative_count_is_rejected_before_anything_runs() {
    let mut world = create_test_world();
    let err = insert_test_scheduler(&mut world, -1, 2, 1, 1, 1).expect_err("negative count");
    assert!(matches!(err, ArrivalError::Configuration(_)));

    let mut world = World::new();
    let err = build_scenario(&mut world, ScenarioParams::default().with_counts(4, -3))
        .expect_err("negative ev count");
    assert!(matches!(
        err,
        SimError::Arrival(ArrivalError::Configuration(_))
    ));
    assert!(!world.contains_resource::<ArrivalScheduler>());
    assert!(world.resource::<SimulationClock>().is_empty());
}

#[test]
fn same_seed_reproduces_plan_and_delays() {
    let run = |seed: u64| {
        let mut world = World::new();
        let params = ScenarioParams::default()
            .with_counts(15, 6)
            .with_seed(seed);
        let handles = build_scenario(&mut world, params).expect("scenario");
        initialize_simulation(&mut world).expect("init");
        ScheduleRunner::new().run_full(&mut world).expect("run");
        handles
            .event_log
            .with_action(LotAction::Arrived)
            .into_iter()
            .map(|e| (e.vehicle, e.kind, e.time))
            .collect::<Vec<_>>()
    };

    let a = run(2024);
    let b = run(2024);
    assert_eq!(a.len(), 21);
    assert_eq!(a, b);
    assert_ne!(a, run(2025));
}

#[test]
fn starting_a_second_run_while_running_faults() {
    let mut tw = TestWorldBuilder::new()
        .with_counts(2, 0)
        .with_fixed_gap(1.0)
        .build_started();
    let mut runner = ScheduleRunner::new();
    runner.run_one(&mut tw.world).expect("start");

    tw.world
        .resource_mut::<SimulationClock>()
        .schedule_in(0.0, EventKind::ArrivalsStarted, None)
        .expect("schedule");
    let err = runner.run_one(&mut tw.world).expect_err("double start");
    assert!(matches!(
        err,
        SimError::Arrival(ArrivalError::Configuration(_))
    ));
    // The first run is untouched.
    runner.run_full(&mut tw.world).expect("finish");
    assert_eq!(tw.vehicles().len(), 2);
}

#[test]
fn external_arrival_due_does_not_start_a_second_chain() {
    let mut tw = TestWorldBuilder::new()
        .with_counts(3, 0)
        .with_fixed_gap(1.0)
        .build_started();
    let mut runner = ScheduleRunner::new();
    runner.run_one(&mut tw.world).expect("start");

    tw.world
        .resource_mut::<SimulationClock>()
        .schedule_in(0.5, EventKind::ArrivalDue, None)
        .expect("schedule");
    runner.run_full(&mut tw.world).expect("run");

    let times: Vec<f64> = tw.vehicles().iter().map(|v| v.spawned_at).collect();
    assert_eq!(times, vec![1.0, 2.0, 3.0]);
    assert_eq!(tw.scheduler().spawned_count(), 3);
    assert_eq!(tw.scheduler().status(), ArrivalStatus::Finished);
}
