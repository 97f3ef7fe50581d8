//! outer-loop coordinator CLI: wraps the two ways a long training run is
//! supervised across process boundaries. `chunk` re-execs the trainer once
//! per call so RSS never drifts upward over a multi-day run; `instances`
//! launches K independent, differently-seeded solvers side by side.

use clap::{Parser, Subcommand};
use holdem_solver::coordinator::chunked::{self, ChunkConfig};
use holdem_solver::coordinator::multi_instance::{self, InstanceConfig};

#[derive(Parser)]
#[command(name = "coordinate")]
#[command(about = "outer-loop supervision for chunked and multi-instance training runs")]
struct Cli {
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand)]
enum Mode {
    /// run exactly one chunk of the trainer, then exit with its exit code
    Chunk {
        #[arg(long)]
        chunk_iterations: u64,
        #[arg(long, default_value = "./out")]
        output_dir: std::path::PathBuf,
        /// any remaining flags are forwarded verbatim to `trainer`
        #[arg(trailing_var_arg = true)]
        trainer_args: Vec<String>,
    },
    /// launch N independent trainer instances, each seeded by its index
    Instances {
        #[arg(long)]
        instance_count: usize,
        #[arg(long, default_value = "./out")]
        base_output_dir: std::path::PathBuf,
        /// any remaining flags are forwarded verbatim to each `trainer` instance
        #[arg(trailing_var_arg = true)]
        trainer_args: Vec<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    holdem_solver::init_logging(log::LevelFilter::Info);

    match cli.mode {
        Mode::Chunk { chunk_iterations, output_dir, trainer_args } => {
            let config = ChunkConfig { chunk_iterations, output_dir, trainer_args };
            let status = chunked::run_one_chunk(&config)?;
            std::process::exit(status.code().unwrap_or(1));
        }
        Mode::Instances { instance_count, base_output_dir, trainer_args } => {
            let config = InstanceConfig { instance_count, base_output_dir, trainer_args };
            let mut children = multi_instance::launch(&config)?;
            let mut failed = false;
            for (instance_id, child) in &mut children {
                let status = child.wait()?;
                if !status.success() {
                    log::error!(target: "coordinate", "instance {instance_id} exited with {status}");
                    failed = true;
                }
            }
            if failed {
                std::process::exit(1);
            }
            Ok(())
        }
    }
}
