use std::path::Path;
use std::process::{exit, Command, ExitStatus};

use clap::{Parser, Subcommand, ValueEnum};

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "xtask",
    about = "Task runner for the parking lot simulation workspace",
    long_about = "A unified CLI for running scenarios, replication sweeps, benchmarks,\n\
                  and CI checks in the parking lot simulation workspace."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one scenario (defaults, or a JSON parameter file)
    Run {
        /// Scenario parameter file
        #[arg(long, env = "LOT_PARAMS")]
        params: Option<String>,
    },
    /// Run the default scenario under a range of seeds and export summaries
    Sweep {
        /// Number of replications
        #[arg(long, default_value_t = 16)]
        replications: u64,
        /// Output directory
        #[arg(long, default_value = "replications")]
        out_dir: String,
    },
    /// Run Criterion benchmarks
    Bench,
    /// Compare benchmarks: stash changes, create baseline, restore, compare
    BenchCompare,
    /// Run CI checks (fmt, clippy, tests, examples, benchmarks)
    Ci {
        /// Job to run
        #[arg(value_enum, default_value_t = CiJob::Check)]
        job: CiJob,
    },
    /// Run load tests (ignored tests in lot_core)
    LoadTest,
}

#[derive(Clone, ValueEnum)]
enum CiJob {
    /// Formatting, clippy, and tests
    Check,
    /// Build and run the examples
    Examples,
    /// Run benchmarks
    Bench,
    /// Run check + examples + bench
    All,
}

// ── helpers ────────────────────────────────────────────────────────

fn step(label: &str) {
    eprintln!("\n=== {label} ===");
}

fn spawn(program: &str, args: &[&str]) -> ExitStatus {
    eprintln!("+ {program} {}", args.join(" "));
    match Command::new(program).args(args).status() {
        Ok(status) => status,
        Err(err) => {
            eprintln!("failed to execute {program}: {err}");
            exit(1);
        }
    }
}

fn run_cargo(args: &[&str]) {
    let status = spawn("cargo", args);
    if !status.success() {
        exit(status.code().unwrap_or(1));
    }
}

fn run_git(args: &[&str]) {
    let status = spawn("git", args);
    if !status.success() {
        exit(status.code().unwrap_or(1));
    }
}

fn bench(extra: &[&str]) {
    let mut args = vec!["bench", "--package", "lot_core", "--bench", "performance"];
    if !extra.is_empty() {
        args.push("--");
        args.extend_from_slice(extra);
    }
    run_cargo(&args);
}

// ── CI jobs ────────────────────────────────────────────────────────

fn ci_check() {
    step("Check formatting");
    run_cargo(&["fmt", "--all", "--", "--check"]);

    step("Clippy");
    run_cargo(&[
        "clippy",
        "--all-targets",
        "--all-features",
        "--",
        "-D",
        "warnings",
    ]);

    step("Test lot_core");
    run_cargo(&["test", "-p", "lot_core"]);

    step("Test lot_experiments");
    run_cargo(&["test", "-p", "lot_experiments"]);
}

fn ci_examples() {
    step("Run scenario_run (default scenario)");
    run_cargo(&[
        "run",
        "-p",
        "lot_core",
        "--example",
        "scenario_run",
        "--release",
    ]);

    step("Run replication_sweep (4 seeds)");
    run_cargo(&[
        "run",
        "-p",
        "lot_experiments",
        "--example",
        "replication_sweep",
        "--release",
        "--",
        "4",
        "target/replications",
    ]);
}

fn ci_bench() {
    step("Run benchmarks");
    bench(&[]);
}

// ── main ───────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { params } => {
            let mut args = vec!["run", "-p", "lot_core", "--example", "scenario_run", "--release"];
            if let Some(path) = params.as_deref() {
                args.extend(["--", path]);
            }
            run_cargo(&args);
        }
        Commands::Sweep {
            replications,
            out_dir,
        } => {
            let count = replications.to_string();
            run_cargo(&[
                "run",
                "-p",
                "lot_experiments",
                "--example",
                "replication_sweep",
                "--release",
                "--",
                &count,
                &out_dir,
            ]);
        }
        Commands::Bench => bench(&[]),
        Commands::BenchCompare => {
            let baseline_dir = Path::new("target/criterion");
            if baseline_dir.exists() {
                step("Removing existing benchmark data");
                if let Err(err) = std::fs::remove_dir_all(baseline_dir) {
                    eprintln!("failed to remove target/criterion: {err}");
                    exit(1);
                }
            }

            step("Stashing current changes");
            run_git(&[
                "stash",
                "push",
                "-m",
                "Temporary stash for benchmark comparison",
            ]);

            step("Running benchmark to create baseline");
            bench(&["--save-baseline", "main"]);

            step("Reapplying changes");
            run_git(&["stash", "pop"]);

            step("Running benchmark comparing against baseline");
            bench(&["--baseline", "main"]);

            eprintln!("\nDone! Check the output above to see performance comparison.");
        }
        Commands::Ci { job } => {
            match job {
                CiJob::Check => ci_check(),
                CiJob::Examples => ci_examples(),
                CiJob::Bench => ci_bench(),
                CiJob::All => {
                    ci_check();
                    ci_examples();
                    ci_bench();
                }
            }
            eprintln!("\nCI job passed.");
        }
        Commands::LoadTest => {
            run_cargo(&[
                "test",
                "-p",
                "lot_core",
                "--test",
                "load_tests",
                "--",
                "--ignored",
            ]);
        }
    }
}
