//! process-based parallel batches: N worker **processes**, not threads — a
//! sampler's RNG state and regret-table ownership are process-local by
//! design, matching the concurrency model's "no intra-process threads
//! share the regret/strategy store." Each batch writes the coordinating
//! trainer's sampler/rules configuration once to `worker-config.json`, then
//! spawns the `worker` sibling binary N times (each reading that file) and
//! merges the results back additively.

use crate::config::{EpsilonSchedule, RulesConfig};
use crate::error::{Result, SolverError};
use crate::store::Store;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct BatchPlan {
    pub worker_count: usize,
    pub batch_size: u64,
    pub global_seed: u64,
    pub start_iteration: u64,
    pub output_dir: PathBuf,
    pub worker_timeout: Duration,
    pub rules: RulesConfig,
    pub epsilon_schedule: EpsilonSchedule,
    pub linear_weighting: bool,
    pub pruning_enabled: bool,
    pub pruning_threshold: f64,
    pub pruning_probability: f64,
    pub pruning_start_iteration: u64,
}

/// the slice of a `SolverConfig` a worker process needs to reproduce the
/// coordinating trainer's sampling behavior exactly; written once per batch
/// and shared by every worker in it, rather than duplicated onto each
/// worker's command line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    pub rules: RulesConfig,
    pub epsilon_schedule: EpsilonSchedule,
    pub linear_weighting: bool,
    pub pruning_enabled: bool,
    pub pruning_threshold: f64,
    pub pruning_probability: f64,
    pub pruning_start_iteration: u64,
}

impl From<&BatchPlan> for WorkerConfig {
    fn from(plan: &BatchPlan) -> Self {
        Self {
            rules: plan.rules.clone(),
            epsilon_schedule: plan.epsilon_schedule.clone(),
            linear_weighting: plan.linear_weighting,
            pruning_enabled: plan.pruning_enabled,
            pruning_threshold: plan.pruning_threshold,
            pruning_probability: plan.pruning_probability,
            pruning_start_iteration: plan.pruning_start_iteration,
        }
    }
}

fn worker_config_path(output_dir: &Path) -> PathBuf {
    output_dir.join("worker-config.json")
}

#[derive(Debug, Clone)]
pub struct WorkerStats {
    pub worker_id: usize,
    pub mean_utility: f64,
    pub clean_iterations: u64,
    pub discarded_iterations: u64,
}

fn worker_output_path(output_dir: &Path, worker_id: usize) -> PathBuf {
    output_dir.join(format!("worker-{worker_id}.store.bin"))
}

fn worker_stats_path(output_dir: &Path, worker_id: usize) -> PathBuf {
    output_dir.join(format!("worker-{worker_id}.stats.json"))
}

/// spawns `plan.worker_count` copies of the `worker` sibling binary, each
/// covering a disjoint slice of `[start, start+batch)`,
/// joins them under a shared timeout, and merges their stores additively
/// into a fresh `Store`. Any worker death, non-zero exit, or timeout
/// aborts the whole batch with no partial merge.
pub fn run_batch(plan: &BatchPlan) -> Result<(Store, Vec<WorkerStats>)> {
    std::fs::create_dir_all(&plan.output_dir)?;
    let worker_exe = crate::sibling_binary("worker")?;
    let per_worker = (plan.batch_size / plan.worker_count.max(1) as u64).max(1);

    let config_path = worker_config_path(&plan.output_dir);
    let config_bytes = serde_json::to_vec(&WorkerConfig::from(plan)).expect("worker config serializes");
    std::fs::write(&config_path, config_bytes)?;

    let mut children = Vec::with_capacity(plan.worker_count);
    for worker_id in 0..plan.worker_count {
        let worker_start = plan.start_iteration + worker_id as u64 * per_worker;
        let seed = plan.global_seed ^ (worker_id as u64) ^ worker_start;
        let child = Command::new(&worker_exe)
            .arg("--worker-id").arg(worker_id.to_string())
            .arg("--start-iteration").arg(worker_start.to_string())
            .arg("--iterations").arg(per_worker.to_string())
            .arg("--seed").arg(seed.to_string())
            .arg("--config").arg(&config_path)
            .arg("--output").arg(worker_output_path(&plan.output_dir, worker_id))
            .arg("--stats-output").arg(worker_stats_path(&plan.output_dir, worker_id))
            .spawn()
            .map_err(|e| SolverError::WorkerFailure { worker_id, reason: format!("spawn failed: {e}") })?;
        children.push((worker_id, child));
    }

    let deadline = Instant::now() + plan.worker_timeout;
    let mut stats = Vec::with_capacity(children.len());
    let mut merged = Store::new();

    for (worker_id, mut child) in children {
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if Instant::now() >= deadline {
                let _ = child.kill();
                return Err(SolverError::WorkerFailure { worker_id, reason: "timed out".into() });
            }
            std::thread::sleep(Duration::from_millis(20));
        };
        if !status.success() {
            return Err(SolverError::WorkerFailure { worker_id, reason: format!("exited with {status}") });
        }

        let store_bytes = std::fs::read(worker_output_path(&plan.output_dir, worker_id))?;
        let store: Store = bincode::deserialize(&store_bytes)
            .map_err(|e| SolverError::WorkerFailure { worker_id, reason: format!("store decode failed: {e}") })?;
        merged.merge(&store);

        let stats_bytes = std::fs::read(worker_stats_path(&plan.output_dir, worker_id))?;
        let worker_stats: RawWorkerStats = serde_json::from_slice(&stats_bytes)
            .map_err(|e| SolverError::WorkerFailure { worker_id, reason: format!("stats decode failed: {e}") })?;
        stats.push(WorkerStats {
            worker_id,
            mean_utility: worker_stats.mean_utility,
            clean_iterations: worker_stats.clean_iterations,
            discarded_iterations: worker_stats.discarded_iterations,
        });
    }

    log::info!(target: "parallel", "batch [{}, {}) merged from {} workers", plan.start_iteration, plan.start_iteration + plan.batch_size, plan.worker_count);
    Ok((merged, stats))
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RawWorkerStats {
    pub mean_utility: f64,
    pub clean_iterations: u64,
    pub discarded_iterations: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worker_paths_are_disjoint_per_id() {
        let dir = PathBuf::from("/tmp/holdem-solver-plan");
        assert_ne!(worker_output_path(&dir, 0), worker_output_path(&dir, 1));
        assert_ne!(worker_stats_path(&dir, 0), worker_stats_path(&dir, 1));
    }
}
