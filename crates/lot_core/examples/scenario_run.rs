//! Run the default parking lot scenario (or one loaded from JSON) and print
//! a summary of the lifecycle events.
//!
//! Run with: cargo run -p lot_core --example scenario_run [-- params.json]
//! Set RUST_LOG=lot_core=debug for scheduler logs.

use std::process::ExitCode;

use bevy_ecs::prelude::World;
use lot_core::clock::SimulationClock;
use lot_core::events::LotAction;
use lot_core::runner::{initialize_simulation, run_until_empty, simulation_schedule};
use lot_core::scenario::{build_scenario, load_params, ScenarioParams};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let params = match std::env::args().nth(1) {
        Some(path) => match load_params(&path) {
            Ok(params) => params,
            Err(err) => {
                eprintln!("failed to load {path}: {err}");
                return ExitCode::FAILURE;
            }
        },
        None => ScenarioParams::default().with_seed(123),
    };

    let mut world = World::new();
    let handles = match build_scenario(&mut world, params.clone()) {
        Ok(handles) => handles,
        Err(err) => {
            eprintln!("invalid scenario: {err}");
            return ExitCode::FAILURE;
        }
    };

    let mut schedule = simulation_schedule();
    let steps = initialize_simulation(&mut world)
        .and_then(|()| run_until_empty(&mut world, &mut schedule, 5_000_000));
    let steps = match steps {
        Ok(steps) => steps,
        Err(err) => {
            eprintln!("simulation failed: {err}");
            return ExitCode::FAILURE;
        }
    };

    let log = &handles.event_log;
    let now = world.resource::<SimulationClock>().now();
    println!(
        "--- Parking lot run ({} parking, {} chargers, seed {:?}) ---",
        params.parking_capacity, params.charger_capacity, params.seed
    );
    println!("Steps executed: {steps}");
    println!("Simulation time: {now:.1} min");
    for action in [
        LotAction::Arrived,
        LotAction::Queued,
        LotAction::Acquired,
        LotAction::Departed,
    ] {
        println!("{:>9}: {}", action.to_string(), log.with_action(action).len());
    }

    const SAMPLE: usize = 20;
    println!("\nFirst {SAMPLE} events:");
    for event in log.snapshot().iter().take(SAMPLE) {
        println!(
            "  t={:>8.2}  vehicle={:>4}  {:<6}  {}",
            event.time,
            event.vehicle.to_string(),
            event.kind.to_string(),
            event.action
        );
    }
    ExitCode::SUCCESS
}
