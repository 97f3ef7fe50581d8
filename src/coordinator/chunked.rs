//! releases all heap after each chunk so RSS never drifts upward over a
//! multi-day training run. The coordinator never "continues" in-process —
//! it spawns the `trainer` sibling binary with `--resume` and a clean
//! process image, and an outer shell loop (or this process itself,
//! re-invoked) is expected to keep calling it until the run's overall
//! budget is spent.

use crate::error::Result;
use std::path::PathBuf;
use std::process::Command;

#[derive(Debug, Clone)]
pub struct ChunkConfig {
    pub chunk_iterations: u64,
    pub output_dir: PathBuf,
    pub trainer_args: Vec<String>,
}

/// runs exactly one chunk by spawning the `trainer` sibling binary and
/// exiting this process with its child's exit code. A clean chunk boundary exits
/// 0; an outer loop (shell script, systemd, or a wrapper re-invoking this
/// function) is expected to call again to resume.
pub fn run_one_chunk(config: &ChunkConfig) -> Result<std::process::ExitStatus> {
    std::fs::create_dir_all(&config.output_dir)?;
    let trainer_exe = crate::sibling_binary("trainer")?;
    log::info!(target: "coordinator::chunked", "starting chunk of {} iterations", config.chunk_iterations);
    let status = Command::new(&trainer_exe)
        .args(&config.trainer_args)
        .arg("--iterations").arg(config.chunk_iterations.to_string())
        .arg("--resume")
        .arg("--output-dir").arg(&config.output_dir)
        .status()?;
    if !status.success() {
        log::error!(target: "coordinator::chunked", "chunk exited with {status}");
    }
    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_config_preserves_trainer_args() {
        let config = ChunkConfig {
            chunk_iterations: 1000,
            output_dir: PathBuf::from("/tmp/holdem-solver-chunk"),
            trainer_args: vec!["--seed".into(), "7".into()],
        };
        assert_eq!(config.trainer_args, vec!["--seed".to_string(), "7".to_string()]);
    }
}
