//! hidden worker-process mode, spawned by `parallel::run_batch` rather than
//! invoked directly. Reads the batch's shared `WorkerConfig` so its sampling
//! behavior (epsilon schedule, pruning, rules) matches the coordinating
//! trainer exactly, then runs a disjoint slice of MCCFR iterations against a
//! fresh, empty `Store` and serializes its store and summary stats for the
//! coordinating process to read back and merge.

use clap::Parser;
use holdem_solver::bucket::{BucketFingerprint, IdentityBucketer};
use holdem_solver::parallel::{RawWorkerStats, WorkerConfig};
use holdem_solver::sampler::{self, SamplerConfig};
use holdem_solver::store::Store;
use rand::rngs::SmallRng;
use rand::SeedableRng;

#[derive(Parser)]
#[command(name = "worker")]
#[command(about = "runs one slice of MCCFR iterations, invoked by the parallel batch coordinator")]
struct Cli {
    #[arg(long)]
    worker_id: usize,

    /// global iteration number this worker's slice starts at
    #[arg(long)]
    start_iteration: u64,

    /// number of iterations in this worker's slice
    #[arg(long)]
    iterations: u64,

    /// RNG seed for this worker's slice, already mixed by the caller
    #[arg(long)]
    seed: u64,

    /// path to the batch's shared JSON-encoded `WorkerConfig`
    #[arg(long)]
    config: std::path::PathBuf,

    /// path to write the resulting bincode-encoded `Store`
    #[arg(long)]
    output: std::path::PathBuf,

    /// path to write this worker's JSON-encoded `RawWorkerStats`
    #[arg(long)]
    stats_output: std::path::PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    holdem_solver::init_logging(log::LevelFilter::Warn);

    let config_bytes = std::fs::read(&cli.config)?;
    let config: WorkerConfig = serde_json::from_slice(&config_bytes)?;
    let rules = config.rules;
    let bucketer = IdentityBucketer::new(BucketFingerprint::default());
    let sampler_cfg_at = |t: u64| SamplerConfig {
        epsilon: config.epsilon_schedule.at(t),
        linear_weighting: config.linear_weighting,
        pruning_enabled: config.pruning_enabled,
        pruning_threshold: config.pruning_threshold,
        pruning_probability: config.pruning_probability,
        pruning_start_iteration: config.pruning_start_iteration,
    };

    let mut rng = SmallRng::seed_from_u64(cli.seed);
    let mut store = Store::new();
    let mut clean_iterations = 0u64;
    let mut discarded_iterations = 0u64;
    let mut utility_sum = 0.0;

    for offset in 0..cli.iterations {
        let t = cli.start_iteration + offset;
        let cfg = sampler_cfg_at(t);
        let outcome = sampler::iterate(t, &mut rng, &bucketer, &rules, &cfg, &mut store);
        if outcome.pruned {
            discarded_iterations += 1;
        } else {
            clean_iterations += 1;
            utility_sum += outcome.traverser_utility as f64;
        }
    }

    let stats = RawWorkerStats {
        mean_utility: if clean_iterations > 0 { utility_sum / clean_iterations as f64 } else { 0.0 },
        clean_iterations,
        discarded_iterations,
    };

    if let Some(parent) = cli.output.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&cli.output, bincode::serialize(&store)?)?;
    std::fs::write(&cli.stats_output, serde_json::to_vec(&stats)?)?;

    log::info!(
        target: "worker",
        "worker {} finished {} clean + {} discarded iterations, {} infosets",
        cli.worker_id,
        clean_iterations,
        discarded_iterations,
        store.infoset_count(),
    );
    Ok(())
}
