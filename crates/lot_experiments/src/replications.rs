//! Parallel replication runs using rayon.

use bevy_ecs::prelude::World;
use indicatif::{ProgressBar, ProgressStyle};
use lot_core::error::SimError;
use lot_core::events::LotEvent;
use lot_core::runner::{initialize_simulation, run_until_empty, simulation_schedule};
use lot_core::scenario::{build_scenario, ScenarioParams};
use rayon::prelude::*;

use crate::metrics::{summarize, RunSummary};

const MAX_STEPS: usize = 5_000_000;

/// One scenario repeated under several seeds.
#[derive(Debug, Clone)]
pub struct ReplicationSet {
    pub base: ScenarioParams,
    pub seeds: Vec<u64>,
}

impl ReplicationSet {
    pub fn new(base: ScenarioParams, seeds: Vec<u64>) -> Self {
        Self { base, seeds }
    }

    /// Seeds `first..first + count`.
    pub fn with_seed_range(base: ScenarioParams, first: u64, count: u64) -> Self {
        Self::new(base, (first..first.saturating_add(count)).collect())
    }

    pub fn len(&self) -> usize {
        self.seeds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seeds.is_empty()
    }

    /// The base parameters with each seed applied.
    pub fn scenarios(&self) -> impl Iterator<Item = (u64, ScenarioParams)> + '_ {
        self.seeds
            .iter()
            .map(|&seed| (seed, self.base.clone().with_seed(seed)))
    }
}

/// Result of one replication: the summary plus the full event log.
#[derive(Debug, Clone)]
pub struct ReplicationOutcome {
    pub summary: RunSummary,
    pub events: Vec<LotEvent>,
}

/// Run one seeded scenario to completion.
pub fn run_single_replication(seed: u64, params: ScenarioParams) -> Result<ReplicationOutcome, SimError> {
    let mut world = World::new();
    let handles = build_scenario(&mut world, params.with_seed(seed))?;
    initialize_simulation(&mut world)?;

    let mut schedule = simulation_schedule();
    let steps = run_until_empty(&mut world, &mut schedule, MAX_STEPS)?;
    if steps == MAX_STEPS {
        tracing::warn!(seed, steps, "replication hit the step limit");
    }

    let events = handles.event_log.snapshot();
    let summary = summarize(seed, steps, &events);
    tracing::debug!(seed, steps, events = events.len(), "replication finished");
    Ok(ReplicationOutcome { summary, events })
}

/// Run every replication in parallel, in seed order.
pub fn run_replications(
    set: &ReplicationSet,
    num_threads: Option<usize>,
) -> Result<Vec<ReplicationOutcome>, Box<dyn std::error::Error + Send + Sync>> {
    run_replications_with_progress(set, num_threads, true)
}

/// Like [run_replications] with the progress bar optional.
///
/// The first failing replication fails the whole set.
pub fn run_replications_with_progress(
    set: &ReplicationSet,
    num_threads: Option<usize>,
    show_progress: bool,
) -> Result<Vec<ReplicationOutcome>, Box<dyn std::error::Error + Send + Sync>> {
    let total = set.len();
    let pb = if show_progress && total > 0 {
        let bar = ProgressBar::new(total as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
        {
            bar.set_style(style.progress_chars("#>-"));
        }
        Some(bar)
    } else {
        None
    };

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(threads) = num_threads {
        builder = builder.num_threads(threads);
    }
    let pool = builder.build()?;

    let scenarios: Vec<(u64, ScenarioParams)> = set.scenarios().collect();
    let pb_clone = pb.clone();
    let results: Result<Vec<ReplicationOutcome>, SimError> = pool.install(|| {
        scenarios
            .into_par_iter()
            .map(|(seed, params)| {
                let outcome = run_single_replication(seed, params);
                if let Some(ref progress_bar) = pb_clone {
                    progress_bar.inc(1);
                }
                outcome
            })
            .collect()
    });

    if let Some(ref progress_bar) = pb {
        progress_bar.finish_with_message("Completed");
    }
    Ok(results?)
}
