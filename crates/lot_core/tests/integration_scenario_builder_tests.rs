mod support;

use std::io::Write;

use bevy_ecs::prelude::World;
use lot_core::arrivals::{ArrivalScheduler, ArrivalStatus};
use lot_core::clock::SimulationClock;
use lot_core::distributions::StreamSeeds;
use lot_core::error::{ConfigError, SimError};
use lot_core::events::LotAction;
use lot_core::pools::ResourcePool;
use lot_core::runner::initialize_simulation;
use lot_core::scenario::{
    build_scenario, load_params, DwellConfig, ScenarioHandles, ScenarioParams, SimulationEndTime,
    DEFAULT_EV_COUNT, DEFAULT_NORMAL_COUNT,
};
use support::schedule::ScheduleRunner;

#[test]
fn build_scenario_configures_scheduler_and_pools() {
    let mut world = World::new();
    let handles = build_scenario(
        &mut world,
        ScenarioParams::default()
            .with_counts(10, 3)
            .with_capacities(4, 2)
            .with_seed(42),
    )
    .expect("scenario");

    let scheduler = world.resource::<ArrivalScheduler>();
    assert_eq!(scheduler.normal_count(), 10);
    assert_eq!(scheduler.ev_count(), 3);
    assert_eq!(scheduler.spawned_count(), 0);
    assert_eq!(scheduler.status(), ArrivalStatus::Idle);
    assert_eq!(scheduler.pools(), handles.pools);

    let parking = world.get::<ResourcePool>(handles.pools.general).expect("parking");
    assert_eq!((parking.label.as_str(), parking.capacity()), ("parking", 4));
    let chargers = world
        .get::<ResourcePool>(handles.pools.dedicated)
        .expect("chargers");
    assert_eq!((chargers.label.as_str(), chargers.capacity()), ("charger", 2));

    assert_eq!(
        world.resource::<DwellConfig>().seed,
        StreamSeeds::derive(42).dwell
    );
    assert!(world.contains_resource::<ScenarioHandles>());
    assert!(!world.contains_resource::<SimulationEndTime>());
}

#[test]
fn missing_counts_fall_back_to_defaults() {
    let mut world = World::new();
    build_scenario(&mut world, ScenarioParams::default().with_seed(1)).expect("scenario");
    let scheduler = world.resource::<ArrivalScheduler>();
    assert_eq!(scheduler.normal_count(), DEFAULT_NORMAL_COUNT);
    assert_eq!(scheduler.ev_count(), DEFAULT_EV_COUNT);
}

#[test]
fn default_scenario_runs_to_completion() {
    let mut world = World::new();
    let handles =
        build_scenario(&mut world, ScenarioParams::default().with_seed(7)).expect("scenario");
    initialize_simulation(&mut world).expect("init");
    ScheduleRunner::new().run_full(&mut world).expect("run");

    let total = DEFAULT_NORMAL_COUNT + DEFAULT_EV_COUNT;
    assert_eq!(handles.event_log.with_action(LotAction::Arrived).len(), total);
    assert_eq!(handles.event_log.with_action(LotAction::Departed).len(), total);
    assert_eq!(
        world.resource::<ArrivalScheduler>().status(),
        ArrivalStatus::Finished
    );
    assert!(world.resource::<SimulationClock>().is_empty());
}

#[test]
fn end_time_stops_the_run_early() {
    let mut world = World::new();
    let handles = build_scenario(
        &mut world,
        ScenarioParams::default()
            .with_counts(50, 10)
            .with_mean_interarrival(1.0)
            .with_seed(3)
            .with_simulation_end_time(10.0),
    )
    .expect("scenario");
    initialize_simulation(&mut world).expect("init");
    ScheduleRunner::new().run_full(&mut world).expect("run");

    let clock = world.resource::<SimulationClock>();
    assert!(clock.now() < 10.0);
    assert!(!clock.is_empty(), "later events stay queued");
    assert!(handles.event_log.snapshot().iter().all(|e| e.time < 10.0));
    assert!(world.resource::<ArrivalScheduler>().spawned_count() < 60);
}

#[test]
fn invalid_params_are_rejected() {
    let mut world = World::new();
    let err = build_scenario(
        &mut world,
        ScenarioParams::default().with_mean_interarrival(0.0),
    )
    .expect_err("zero mean");
    assert!(matches!(
        err,
        SimError::Config(ConfigError::Invalid {
            field: "mean_interarrival",
            ..
        })
    ));

    let err = build_scenario(
        &mut World::new(),
        ScenarioParams::default().with_simulation_end_time(f64::NAN),
    )
    .expect_err("nan end time");
    assert!(matches!(err, SimError::Config(_)));
}

#[test]
fn params_round_trip_through_a_json_file() {
    let params = ScenarioParams::default()
        .with_counts(12, 4)
        .with_capacities(6, 1)
        .with_seed(99);
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(serde_json::to_string_pretty(&params).expect("json").as_bytes())
        .expect("write");

    let loaded = load_params(file.path()).expect("load");
    assert_eq!(loaded, params);
}

#[test]
fn malformed_json_is_a_config_error() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    write!(file, "{{ \"normal_count\": \"many\" }}").expect("write");
    assert!(matches!(
        load_params(file.path()),
        Err(ConfigError::Json(_))
    ));
}
