//! the single-process solver driver: owns the iteration loop, epsilon and
//! discount schedules, checkpoint/snapshot cadence, and resume. Parallel
//! and chunked/multi-instance runs are outer loops around this one
//! (`parallel.rs`, `coordinator/`), not reimplementations of it.

use crate::bucket::Bucketer;
use crate::checkpoint::{self, BlueprintExport, Checkpoint};
use crate::config::{Budget, DiscountMode, SolverConfig};
use crate::error::Result;
use crate::parallel::{self, BatchPlan};
use crate::sampler::{self, SamplerConfig};
use crate::store::{factors_at, Store};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub struct Driver<'a> {
    config: &'a SolverConfig,
    rules: crate::config::RulesConfig,
    bucket_fingerprint: crate::bucket::BucketFingerprint,
    bucketer: &'a dyn Bucketer,
    store: Store,
    iteration: u64,
    started_at: Instant,
    last_checkpoint_at: Instant,
    shutdown: Arc<AtomicBool>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RunStats {
    pub iterations_completed: u64,
    pub pruned_iterations: u64,
}

impl<'a> Driver<'a> {
    pub fn new(
        config: &'a SolverConfig,
        rules: crate::config::RulesConfig,
        bucketer: &'a dyn Bucketer,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        Self {
            config,
            bucket_fingerprint: bucketer.fingerprint(),
            rules,
            bucketer,
            store: Store::new(),
            iteration: 0,
            started_at: Instant::now(),
            last_checkpoint_at: Instant::now(),
            shutdown,
        }
    }

    fn checkpoint_path(&self) -> std::path::PathBuf {
        self.config.output_dir.join("checkpoint.bin")
    }

    fn blueprint_path(&self) -> std::path::PathBuf {
        self.config.output_dir.join("blueprint.bin")
    }

    /// resumes from an on-disk checkpoint if one exists and matches this
    /// run's bucket fingerprint; a mismatch is propagated as a fatal error.
    pub fn resume(&mut self) -> Result<bool> {
        match checkpoint::load_checkpoint(&self.checkpoint_path(), self.bucket_fingerprint)? {
            Some(checkpoint) => {
                self.iteration = checkpoint.iteration;
                self.store = checkpoint.store;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn write_checkpoint(&mut self, epsilon: f64, factors: crate::store::DiscountFactors) -> Result<()> {
        std::fs::create_dir_all(&self.config.output_dir)?;
        let checkpoint = Checkpoint {
            iteration: self.iteration,
            elapsed_seconds: self.started_at.elapsed().as_secs_f64(),
            epsilon,
            regret_discount_alpha: factors.regret_alpha,
            strategy_discount_beta: factors.strategy_beta,
            bucket_fingerprint: self.bucket_fingerprint,
            store: self.store.clone(),
        };
        checkpoint::save_checkpoint(&self.checkpoint_path(), &checkpoint)?;
        self.last_checkpoint_at = Instant::now();
        Ok(())
    }

    fn write_snapshot(&self) -> Result<()> {
        std::fs::create_dir_all(&self.config.output_dir)?;
        let export = BlueprintExport { bucket_fingerprint: self.bucket_fingerprint, store: self.store.clone() };
        checkpoint::save_blueprint(&self.blueprint_path(), &export)
    }

    fn should_stop(&self) -> bool {
        if self.shutdown.load(Ordering::SeqCst) {
            return true;
        }
        match self.config.budget() {
            Budget::Iterations(n) => self.iteration >= n,
            Budget::Seconds(s) => self.started_at.elapsed().as_secs() >= s,
        }
    }

    fn checkpoint_due(&self) -> bool {
        match (self.config.checkpoint_interval_iterations, self.config.checkpoint_interval_seconds) {
            (Some(n), _) => self.iteration > 0 && self.iteration % n == 0,
            (None, Some(s)) => self.last_checkpoint_at.elapsed().as_secs() >= s,
            (None, None) => false,
        }
    }

    /// drives iterations until the configured budget is exhausted or a
    /// shutdown is requested; always attempts a final checkpoint on exit.
    /// Dispatches to the process-parallel batch loop when `worker_count > 1`.
    pub fn run(&mut self) -> Result<RunStats> {
        if self.config.worker_count > 1 {
            return self.run_parallel();
        }
        let mut rng = SmallRng::seed_from_u64(self.config.seed ^ self.iteration);
        let mut stats = RunStats::default();
        let mut factors = factors_at(self.config.discount_mode, self.iteration, self.config.discount_period);

        while !self.should_stop() {
            self.iteration += 1;
            let epsilon = self.config.epsilon_schedule.at(self.iteration);
            let sampler_cfg = SamplerConfig {
                epsilon,
                linear_weighting: self.config.linear_weighting,
                pruning_enabled: self.config.pruning_enabled,
                pruning_threshold: self.config.pruning_threshold,
                pruning_probability: self.config.pruning_probability,
                pruning_start_iteration: self.config.pruning_start_iteration,
            };
            let outcome = sampler::iterate(self.iteration, &mut rng, self.bucketer, &self.rules, &sampler_cfg, &mut self.store);
            stats.iterations_completed += 1;
            if outcome.pruned {
                stats.pruned_iterations += 1;
            }

            if self.iteration % self.config.discount_interval == 0 {
                factors = factors_at(self.config.discount_mode, self.iteration, self.config.discount_period);
                if self.config.discount_mode != DiscountMode::None {
                    self.store.discount(&factors);
                }
            }

            if self.checkpoint_due() {
                self.write_checkpoint(epsilon, factors)?;
            }

            if let Some(snapshot_interval) = self.config.snapshot_interval {
                if self.iteration % snapshot_interval == 0 {
                    self.write_snapshot()?;
                }
            }

            if self.iteration % 1000 == 0 {
                log::info!(
                    target: "driver",
                    "iteration={} eps={:.3} infosets={} pruned={}",
                    self.iteration,
                    epsilon,
                    self.store.infoset_count(),
                    stats.pruned_iterations,
                );
            }
        }

        self.write_checkpoint(self.config.epsilon_schedule.at(self.iteration), factors)?;
        self.write_snapshot()?;
        log::info!(target: "driver", "run finished at iteration {}", self.iteration);
        Ok(stats)
    }

    /// batch loop used when `worker_count > 1`: each batch spawns the
    /// `worker` sibling binary `worker_count` times via `parallel::run_batch`
    /// and merges the resulting stores additively. A batch that fails (worker death,
    /// non-zero exit, or timeout) is retried once; a second failure saves a
    /// checkpoint and propagates the error.
    fn run_parallel(&mut self) -> Result<RunStats> {
        let mut stats = RunStats::default();
        let mut factors = factors_at(self.config.discount_mode, self.iteration, self.config.discount_period);

        while !self.should_stop() {
            let remaining = match self.config.budget() {
                Budget::Iterations(n) => n.saturating_sub(self.iteration).max(1),
                Budget::Seconds(_) => self.config.batch_size,
            };
            let batch_size = self.config.batch_size.min(remaining);
            let plan = BatchPlan {
                worker_count: self.config.worker_count,
                batch_size,
                global_seed: self.config.seed,
                start_iteration: self.iteration,
                output_dir: self.config.output_dir.join("batches"),
                worker_timeout: batch_timeout(batch_size, self.config.worker_count),
                rules: self.rules.clone(),
                epsilon_schedule: self.config.epsilon_schedule.clone(),
                linear_weighting: self.config.linear_weighting,
                pruning_enabled: self.config.pruning_enabled,
                pruning_threshold: self.config.pruning_threshold,
                pruning_probability: self.config.pruning_probability,
                pruning_start_iteration: self.config.pruning_start_iteration,
            };

            let (merged, worker_stats) = match parallel::run_batch(&plan) {
                Ok(result) => result,
                Err(first_err) => {
                    log::warn!(target: "driver", "batch at iteration {} failed ({first_err}), retrying once", self.iteration);
                    match parallel::run_batch(&plan) {
                        Ok(result) => result,
                        Err(second_err) => {
                            log::error!(target: "driver", "batch at iteration {} failed twice: {second_err}", self.iteration);
                            self.write_checkpoint(self.config.epsilon_schedule.at(self.iteration), factors)?;
                            return Err(second_err);
                        }
                    }
                }
            };

            self.store.merge(&merged);
            let previous_iteration = self.iteration;
            self.iteration += batch_size;
            stats.iterations_completed += batch_size;
            stats.pruned_iterations += worker_stats.iter().map(|w| w.discarded_iterations).sum::<u64>();

            let crossed_discount_boundary =
                previous_iteration / self.config.discount_interval != self.iteration / self.config.discount_interval;
            if crossed_discount_boundary {
                factors = factors_at(self.config.discount_mode, self.iteration, self.config.discount_period);
                if self.config.discount_mode != DiscountMode::None {
                    self.store.discount(&factors);
                }
            }

            if self.checkpoint_due() {
                self.write_checkpoint(self.config.epsilon_schedule.at(self.iteration), factors)?;
            }
            if let Some(snapshot_interval) = self.config.snapshot_interval {
                if self.iteration % snapshot_interval == 0 {
                    self.write_snapshot()?;
                }
            }

            log::info!(
                target: "driver",
                "parallel batch merged: iteration={} infosets={} workers={}",
                self.iteration,
                self.store.infoset_count(),
                worker_stats.len(),
            );
        }

        self.write_checkpoint(self.config.epsilon_schedule.at(self.iteration), factors)?;
        self.write_snapshot()?;
        log::info!(target: "driver", "parallel run finished at iteration {}", self.iteration);
        Ok(stats)
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn iteration(&self) -> u64 {
        self.iteration
    }
}

/// a liberal per-batch join timeout: assumes at most 5ms per worker-local
/// iteration, floored at 5 seconds so small batches still give workers time
/// to fork and warm up.
fn batch_timeout(batch_size: u64, worker_count: usize) -> Duration {
    let per_worker_iterations = batch_size / worker_count.max(1) as u64;
    Duration::from_millis((per_worker_iterations * 5).max(5_000))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_timeout_has_a_floor() {
        assert_eq!(batch_timeout(4, 4), Duration::from_millis(5_000));
    }

    #[test]
    fn batch_timeout_scales_with_per_worker_iterations() {
        assert_eq!(batch_timeout(40_000, 4), Duration::from_millis(50_000));
    }
}
