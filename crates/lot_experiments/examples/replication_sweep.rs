//! Run a scenario under a range of seeds and export the per-seed summaries.
//!
//! Run with: cargo run -p lot_experiments --example replication_sweep [-- <replications> <out_dir>]

use std::path::PathBuf;
use std::process::ExitCode;

use lot_core::scenario::ScenarioParams;
use lot_experiments::{
    export_events_csv, export_summaries_csv, export_summaries_json, run_replications, RunSummary,
    ReplicationSet,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut args = std::env::args().skip(1);
    let replications: u64 = args.next().and_then(|n| n.parse().ok()).unwrap_or(16);
    let out_dir = PathBuf::from(args.next().unwrap_or_else(|| "replications".to_string()));
    if let Err(err) = std::fs::create_dir_all(&out_dir) {
        eprintln!("cannot create {}: {err}", out_dir.display());
        return ExitCode::FAILURE;
    }

    let set = ReplicationSet::with_seed_range(ScenarioParams::default(), 1, replications);
    println!("Running {} replications...", set.len());
    let outcomes = match run_replications(&set, None) {
        Ok(outcomes) => outcomes,
        Err(err) => {
            eprintln!("replication failed: {err}");
            return ExitCode::FAILURE;
        }
    };

    let summaries: Vec<RunSummary> = outcomes.iter().map(|o| o.summary.clone()).collect();

    let exported = export_summaries_csv(&summaries, out_dir.join("summaries.csv"))
        .and_then(|()| export_summaries_json(&summaries, out_dir.join("summaries.json")))
        .and_then(|()| match outcomes.first() {
            Some(first) => export_events_csv(&first.events, out_dir.join("events_first_seed.csv")),
            None => Ok(()),
        });
    if let Err(err) = exported {
        eprintln!("export failed: {err}");
        return ExitCode::FAILURE;
    }
    println!("Results written to {}", out_dir.display());
    ExitCode::SUCCESS
}
