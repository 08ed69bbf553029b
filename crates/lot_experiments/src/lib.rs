//! Replication runs for the parking lot simulation.
//!
//! A replication set is one scenario run under several seeds. Each run is
//! independent, so the set is executed in parallel with rayon and summarised
//! per seed.
//!
//! ```no_run
//! use lot_core::scenario::ScenarioParams;
//! use lot_experiments::{export_summaries_csv, run_replications, ReplicationSet};
//!
//! let set = ReplicationSet::with_seed_range(ScenarioParams::default(), 1, 20);
//! let outcomes = run_replications(&set, None).unwrap();
//! let summaries: Vec<_> = outcomes.iter().map(|o| o.summary.clone()).collect();
//! export_summaries_csv(&summaries, "summaries.csv").unwrap();
//! ```

pub mod export;
pub mod metrics;
pub mod replications;

pub use export::{export_events_csv, export_summaries_csv, export_summaries_json};
pub use metrics::{summarize, RunSummary};
pub use replications::{
    run_replications, run_replications_with_progress, run_single_replication, ReplicationOutcome,
    ReplicationSet,
};
