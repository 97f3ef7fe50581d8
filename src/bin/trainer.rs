//! single-process blueprint trainer. Flags map directly onto `SolverConfig`;
//! nothing downstream of `main` touches `std::env::args`.

use clap::Parser;
use holdem_solver::bucket::{BucketFingerprint, IdentityBucketer};
use holdem_solver::config::{DiscountMode, EpsilonSchedule, RulesConfig, SolverConfig};
use holdem_solver::driver::Driver;

#[derive(Parser)]
#[command(name = "trainer")]
#[command(about = "MCCFR blueprint trainer for heads-up No-Limit Hold'em")]
struct Cli {
    /// number of iterations to run; mutually exclusive with --time-budget-seconds
    #[arg(long)]
    iterations: Option<u64>,

    /// wall-clock budget in seconds; mutually exclusive with --iterations
    #[arg(long)]
    time_budget_seconds: Option<u64>,

    /// checkpoint every N iterations
    #[arg(long)]
    checkpoint_interval_iterations: Option<u64>,

    /// checkpoint every N seconds, instead of by iteration count
    #[arg(long)]
    checkpoint_interval_seconds: Option<u64>,

    /// how often (in iterations) to reapply regret/strategy discounting
    #[arg(long, default_value_t = 100)]
    discount_interval: u64,

    /// write a blueprint snapshot every N iterations, in addition to checkpoints
    #[arg(long)]
    snapshot_interval: Option<u64>,

    /// discount schedule: "none", "static", or "dcfr"
    #[arg(long, default_value = "dcfr")]
    discount_mode: String,

    /// number of worker processes per batch (defaults to available cores)
    #[arg(long)]
    worker_count: Option<usize>,

    /// iterations per parallel batch when worker-count > 1
    #[arg(long, default_value_t = 256)]
    batch_size: u64,

    /// directory for checkpoint.bin, blueprint.bin, and logs
    #[arg(long, default_value = "./out")]
    output_dir: std::path::PathBuf,

    /// base RNG seed
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// resume from an existing checkpoint in --output-dir
    #[arg(long, default_value_t = false)]
    resume: bool,

    /// verbosity: -v, -vv for increasing detail
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn discount_mode_from_str(s: &str) -> anyhow::Result<DiscountMode> {
    match s {
        "none" => Ok(DiscountMode::None),
        "static" => Ok(DiscountMode::Static),
        "dcfr" => Ok(DiscountMode::Dcfr),
        other => anyhow::bail!("unrecognized discount mode '{other}', expected none|static|dcfr"),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let verbosity = match cli.verbose {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    holdem_solver::init_logging(verbosity);

    if cli.iterations.is_some() == cli.time_budget_seconds.is_some() {
        anyhow::bail!("exactly one of --iterations or --time-budget-seconds must be set");
    }

    let config = SolverConfig {
        iterations: cli.iterations,
        time_budget_seconds: cli.time_budget_seconds,
        checkpoint_interval_iterations: cli.checkpoint_interval_iterations.or(Some(10_000)),
        checkpoint_interval_seconds: cli.checkpoint_interval_seconds,
        discount_interval: cli.discount_interval,
        snapshot_interval: cli.snapshot_interval,
        epsilon_schedule: EpsilonSchedule::default(),
        discount_mode: discount_mode_from_str(&cli.discount_mode)?,
        discount_period: 10_000.0,
        worker_count: cli.worker_count.unwrap_or_else(num_cpus::get),
        batch_size: cli.batch_size,
        output_dir: cli.output_dir,
        seed: cli.seed,
        linear_weighting: true,
        pruning_enabled: true,
        pruning_threshold: holdem_solver::REGRET_MIN,
        pruning_probability: 0.95,
        pruning_start_iteration: 1_000_000,
    };
    let rules = RulesConfig::default();
    let bucketer = IdentityBucketer::new(BucketFingerprint::default());
    let shutdown = holdem_solver::install_shutdown_flag();

    let mut driver = Driver::new(&config, rules, &bucketer, shutdown);
    if cli.resume {
        match driver.resume() {
            Ok(true) => log::info!("resumed from checkpoint at iteration {}", driver.iteration()),
            Ok(false) => log::info!("no checkpoint found, starting fresh"),
            Err(e) => {
                log::error!("{e}");
                std::process::exit(1);
            }
        }
    }

    match driver.run() {
        Ok(stats) => {
            log::info!(
                "finished: {} iterations, {} pruned, {} infosets",
                stats.iterations_completed,
                stats.pruned_iterations,
                driver.store().infoset_count()
            );
            Ok(())
        }
        Err(e) => {
            log::error!("{e}");
            std::process::exit(1);
        }
    }
}
