//! layered, independently-serializable configuration. Each subsystem owns
//! its own struct; `clap` parses CLI flags into a `SolverConfig` at the
//! binary boundary and nothing downstream touches `std::env::args` directly.

use crate::bucket::BucketFingerprint;
use crate::cards::street::Street;
use crate::Chips;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DiscountMode {
    None,
    Static,
    Dcfr,
}

/// an epsilon (exploration) schedule: the largest `threshold_iteration <= t`
/// determines the epsilon in effect at iteration `t`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpsilonSchedule(pub Vec<(u64, f64)>);

impl Default for EpsilonSchedule {
    fn default() -> Self {
        Self(vec![(0, 0.6), (1_000, 0.4), (100_000, 0.1), (1_000_000, 0.05)])
    }
}

impl EpsilonSchedule {
    pub fn at(&self, t: u64) -> f64 {
        self.0
            .iter()
            .filter(|(threshold, _)| *threshold <= t)
            .max_by_key(|(threshold, _)| *threshold)
            .map(|(_, eps)| *eps)
            .unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Budget {
    Iterations(u64),
    Seconds(u64),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverConfig {
    pub iterations: Option<u64>,
    pub time_budget_seconds: Option<u64>,
    pub checkpoint_interval_iterations: Option<u64>,
    pub checkpoint_interval_seconds: Option<u64>,
    pub discount_interval: u64,
    pub snapshot_interval: Option<u64>,
    pub epsilon_schedule: EpsilonSchedule,
    pub discount_mode: DiscountMode,
    pub discount_period: f64,
    pub worker_count: usize,
    pub batch_size: u64,
    pub output_dir: std::path::PathBuf,
    pub seed: u64,
    pub linear_weighting: bool,
    pub pruning_enabled: bool,
    pub pruning_threshold: f64,
    pub pruning_probability: f64,
    pub pruning_start_iteration: u64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            iterations: Some(1_000_000),
            time_budget_seconds: None,
            checkpoint_interval_iterations: Some(10_000),
            checkpoint_interval_seconds: None,
            discount_interval: 100,
            snapshot_interval: None,
            epsilon_schedule: EpsilonSchedule::default(),
            discount_mode: DiscountMode::Dcfr,
            discount_period: 10_000.0,
            worker_count: 1,
            batch_size: 256,
            output_dir: std::path::PathBuf::from("./out"),
            seed: 0,
            linear_weighting: true,
            pruning_enabled: true,
            pruning_threshold: -3e8,
            pruning_probability: 0.95,
            pruning_start_iteration: 1_000_000,
        }
    }
}

impl SolverConfig {
    pub fn budget(&self) -> Budget {
        match (self.iterations, self.time_budget_seconds) {
            (Some(n), _) => Budget::Iterations(n),
            (None, Some(s)) => Budget::Seconds(s),
            (None, None) => Budget::Iterations(SolverConfig::default().iterations.unwrap()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LeafContinuation {
    PureBlueprint,
    FoldBiased,
    CallBiased,
    RaiseBiased,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    pub kl_weight_flop: f64,
    pub kl_weight_turn: f64,
    pub kl_weight_river: f64,
    pub kl_weight_preflop: f64,
    pub kl_oop_bonus: f64,
    pub blueprint_clip_min: f64,
    pub warm_start_scale: f64,
    pub time_budget_ms: u64,
    pub min_iterations: u64,
    pub public_card_samples: usize,
    pub public_card_sample_warn_threshold: usize,
    pub leaf_continuation: LeafContinuation,
    pub unsafe_resolve: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            kl_weight_flop: 0.30,
            kl_weight_turn: 0.50,
            kl_weight_river: 0.70,
            kl_weight_preflop: 0.30,
            kl_oop_bonus: 0.10,
            blueprint_clip_min: 1e-3,
            warm_start_scale: 10.0,
            time_budget_ms: 1_000,
            min_iterations: 100,
            public_card_samples: 4,
            public_card_sample_warn_threshold: 16,
            leaf_continuation: LeafContinuation::PureBlueprint,
            unsafe_resolve: false,
        }
    }
}

impl ResolverConfig {
    pub fn kl_weight(&self, street: Street, out_of_position: bool) -> f64 {
        let base = match street {
            Street::Pref => self.kl_weight_preflop,
            Street::Flop => self.kl_weight_flop,
            Street::Turn => self.kl_weight_turn,
            Street::Rive => self.kl_weight_river,
        };
        if out_of_position {
            base + self.kl_oop_bonus
        } else {
            base
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesConfig {
    pub big_blind: Chips,
    pub small_blind: Chips,
    pub starting_stack: Chips,
    pub min_chip_increment: Chips,
    pub max_raise_repeats: usize,
    pub all_in_threshold: f64,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            big_blind: crate::DEFAULT_BIG_BLIND,
            small_blind: crate::DEFAULT_SMALL_BLIND,
            starting_stack: crate::DEFAULT_STACK,
            min_chip_increment: crate::MIN_CHIP_INCREMENT,
            max_raise_repeats: crate::MAX_RAISE_REPEATS,
            all_in_threshold: crate::ALL_IN_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BucketConfig {
    pub fingerprint: BucketFingerprint,
}

impl Default for BucketConfig {
    fn default() -> Self {
        Self {
            fingerprint: BucketFingerprint::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epsilon_schedule_picks_largest_threshold_not_exceeding_t() {
        let schedule = EpsilonSchedule::default();
        assert_eq!(schedule.at(0), 0.6);
        assert_eq!(schedule.at(999), 0.6);
        assert_eq!(schedule.at(1_000), 0.4);
        assert_eq!(schedule.at(50_000_000), 0.05);
    }

    #[test]
    fn kl_weight_applies_oop_bonus() {
        let config = ResolverConfig::default();
        assert!(config.kl_weight(Street::Flop, true) > config.kl_weight(Street::Flop, false));
    }
}
