//! the real-time depth-limited subgame resolver. Consumes a read-only
//! blueprint, builds a fresh ephemeral regret table warm-started from it,
//! and runs a KL-regularized CFR loop local to the current subgame —
//! never mutating the blueprint itself.

use crate::abstraction::{self, AbstractAction};
use crate::bucket::Bucketer;
use crate::cards::board::Board;
use crate::cards::deck::Deck;
use crate::cards::evaluator::showdown_utility;
use crate::cards::hole::Hole;
use crate::cards::street::Street;
use crate::checkpoint::BlueprintExport;
use crate::config::{LeafContinuation, ResolverConfig};
use crate::error::{Result, SolverError};
use crate::game::engine::Engine;
use crate::game::table::TableState;
use crate::infoset::{ActionHistory, InfoSetKey};
use crate::store::{RegretRow, Store};
use crate::Utility;
use rand::rngs::SmallRng;
use rand::Rng;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Default)]
pub struct ResolveMetrics {
    pub iterations_completed: u64,
    pub elapsed_ms: u64,
    pub mean_kl_vs_blueprint: f64,
}

#[derive(Debug, Clone)]
pub struct ResolveResult {
    pub policy: BTreeMap<AbstractAction, crate::Probability>,
    pub metrics: ResolveMetrics,
}

/// resolves the hero's strategy at `table`/`hero` against `blueprint`,
/// honoring `config`'s time and iteration budget. Dispatches to
/// public-card sampling unless on the river or `public_card_samples <= 1`.
/// `config.unsafe_resolve` skips the KL regularizer against the blueprint,
/// trading off-policy safety for speed on the assumption play hasn't
/// diverged from the blueprint.
pub fn resolve(
    blueprint: &BlueprintExport,
    bucketer: &dyn Bucketer,
    rules: &crate::config::RulesConfig,
    table: &TableState,
    hero: usize,
    hero_hole: Hole,
    config: &ResolverConfig,
    rng: &mut SmallRng,
) -> Result<ResolveResult> {
    if table.street == Street::Rive || config.public_card_samples <= 1 {
        return resolve_single(blueprint, bucketer, rules, table, hero, hero_hole, None, config, rng);
    }

    let known: Vec<_> = table.board.cards().iter().copied().chain(hero_hole.cards()).collect();
    let mut boards = Vec::with_capacity(config.public_card_samples);
    let mut seen = std::collections::HashSet::new();
    for _ in 0..config.public_card_samples * 4 {
        if boards.len() == config.public_card_samples {
            break;
        }
        let mut deck = Deck::excluding(rng, &known);
        let remaining = 5 - table.board.len();
        let mut future: Vec<_> = table.board.cards().to_vec();
        for _ in 0..remaining {
            match deck.draw() {
                Some(card) => future.push(card),
                None => break,
            }
        }
        if future.len() != 5 {
            continue;
        }
        if seen.insert(future.clone()) {
            boards.push(Board::from_cards(future));
        }
    }

    if boards.is_empty() {
        log::warn!(target: "resolver", "public-card sampling found no distinct boards, falling back to single solve");
        return resolve_single(blueprint, bucketer, rules, table, hero, hero_hole, None, config, rng);
    }
    if boards.len() < config.public_card_samples {
        log::warn!(
            target: "resolver",
            "public-card sampling only found {} of {} requested boards",
            boards.len(),
            config.public_card_samples,
        );
    }
    if boards.len() > config.public_card_sample_warn_threshold {
        log::warn!(target: "resolver", "public-card sample count {} exceeds warn threshold {}", boards.len(), config.public_card_sample_warn_threshold);
    }

    let per_board_budget = config.time_budget_ms / boards.len() as u64;
    let mut per_board_config = config.clone();
    per_board_config.time_budget_ms = per_board_budget.max(1);

    let mut mean_policy: BTreeMap<AbstractAction, f64> = BTreeMap::new();
    let mut total_iterations = 0;
    let mut total_kl = 0.0;
    for board in &boards {
        let result = resolve_single(blueprint, bucketer, rules, table, hero, hero_hole, Some(board.clone()), &per_board_config, rng)?;
        for (action, p) in result.policy {
            *mean_policy.entry(action).or_insert(0.0) += p / boards.len() as f64;
        }
        total_iterations += result.metrics.iterations_completed;
        total_kl += result.metrics.mean_kl_vs_blueprint;
    }

    Ok(ResolveResult {
        policy: mean_policy,
        metrics: ResolveMetrics {
            iterations_completed: total_iterations,
            elapsed_ms: config.time_budget_ms,
            mean_kl_vs_blueprint: total_kl / boards.len() as f64,
        },
    })
}

fn resolve_single(
    blueprint: &BlueprintExport,
    bucketer: &dyn Bucketer,
    rules: &crate::config::RulesConfig,
    table: &TableState,
    hero: usize,
    hero_hole: Hole,
    future_board: Option<Board>,
    config: &ResolverConfig,
    rng: &mut SmallRng,
) -> Result<ResolveResult> {
    let villain_hole = match &future_board {
        Some(board) => deal_villain_hole(rng, board, hero_hole)?,
        None => deal_villain_hole(rng, &table.board, hero_hole)?,
    };
    let final_board = match future_board {
        Some(board) => board,
        None => complete_board(rng, table, hero_hole, villain_hole)?,
    };

    let mut ephemeral = Store::new();
    warm_start(&mut ephemeral, blueprint, bucketer, table, hero, hero_hole, rules, config);

    let started = Instant::now();
    let budget = Duration::from_millis(config.time_budget_ms);
    let mut iterations = 0u64;
    let mut kl_sum = 0.0;

    let root_key = infoset_key(bucketer, table.street, hero_hole, &table.board, &ActionHistory::new());
    loop {
        let (outcome, kl) = subgame_iteration(
            &mut ephemeral,
            blueprint,
            bucketer,
            table,
            hero,
            hero_hole,
            villain_hole,
            &final_board,
            config,
            rng,
        );
        let _ = outcome;
        iterations += 1;
        kl_sum += kl;
        let time_up = started.elapsed() >= budget;
        if iterations >= config.min_iterations && time_up {
            break;
        }
        if iterations > config.min_iterations * 1000 {
            break;
        }
    }

    let available = abstraction::available_abstract_actions(
        &table.players[hero].to_context(
            table.current_bet,
            table.last_raise_size,
            table.big_blind,
            table.raise_count,
            table.max_raise_repeats,
        ),
        table.street,
        hero == table.button,
    );
    let policy = ephemeral.strategy_sum.row(&root_key).average(&available);

    Ok(ResolveResult {
        policy,
        metrics: ResolveMetrics {
            iterations_completed: iterations,
            elapsed_ms: started.elapsed().as_millis() as u64,
            mean_kl_vs_blueprint: kl_sum / iterations.max(1) as f64,
        },
    })
}

fn deal_villain_hole(rng: &mut SmallRng, board: &Board, hero_hole: Hole) -> Result<Hole> {
    let known: Vec<_> = board.cards().iter().copied().chain(hero_hole.cards()).collect();
    let mut deck = Deck::excluding(rng, &known);
    let a = deck.draw().ok_or_else(|| SolverError::SamplingDeadEnd { reason: "deck exhausted dealing villain hole".into() })?;
    let b = deck.draw().ok_or_else(|| SolverError::SamplingDeadEnd { reason: "deck exhausted dealing villain hole".into() })?;
    Ok(Hole::new(a, b))
}

/// fills the board out to 5 cards so the subgame loop can play through to a
/// showdown; used whenever the resolver isn't given an explicit sampled
/// future board (single-board resolve, or a river subgame where the board is
/// already complete).
fn complete_board(rng: &mut SmallRng, table: &TableState, hero_hole: Hole, villain_hole: Hole) -> Result<Board> {
    let mut cards = table.board.cards().to_vec();
    let known: Vec<_> = cards.iter().copied().chain(hero_hole.cards()).chain(villain_hole.cards()).collect();
    let mut deck = Deck::excluding(rng, &known);
    while cards.len() < 5 {
        let card = deck.draw().ok_or_else(|| SolverError::SamplingDeadEnd { reason: "deck exhausted completing board".into() })?;
        cards.push(card);
    }
    Ok(Board::from_cards(cards))
}

fn infoset_key(bucketer: &dyn Bucketer, street: Street, hole: Hole, board: &Board, history: &ActionHistory) -> InfoSetKey {
    InfoSetKey::new(street, bucketer.bucket(street, hole, board), history)
}

/// seeds every infoset the subgame touches with regrets proportional to
/// the blueprint's average-strategy probabilities, scaled by
/// `config.warm_start_scale`, so the ephemeral table starts near the
/// blueprint's policy rather than uniform.
#[allow(clippy::too_many_arguments)]
fn warm_start(
    ephemeral: &mut Store,
    blueprint: &BlueprintExport,
    bucketer: &dyn Bucketer,
    table: &TableState,
    hero: usize,
    hero_hole: Hole,
    rules: &crate::config::RulesConfig,
    config: &ResolverConfig,
) {
    let key = infoset_key(bucketer, table.street, hero_hole, &table.board, &ActionHistory::new());
    let ctx = table.players[hero].to_context(
        table.current_bet,
        table.last_raise_size,
        rules.big_blind,
        table.raise_count,
        table.max_raise_repeats,
    );
    let available = abstraction::available_abstract_actions(&ctx, table.street, hero == table.button);
    let blueprint_policy = blueprint.store.strategy_sum.row(&key).average(&available);
    let mut row = RegretRow::default();
    for (action, p) in blueprint_policy {
        row.add(action, p * config.warm_start_scale);
    }
    ephemeral.regrets.0.insert(key, row);
}

/// plays one trajectory through the subgame. Decisions on the root street are
/// driven by the ephemeral regret table and receive a CFR update regularized
/// toward the blueprint; once the hand would move past the root street, the
/// depth limit kicks in and the rest of the hand is rolled out purely from
/// the (leaf-continuation-biased) blueprint average strategy, with no further
/// regret updates.
#[allow(clippy::too_many_arguments)]
fn subgame_iteration(
    ephemeral: &mut Store,
    blueprint: &BlueprintExport,
    bucketer: &dyn Bucketer,
    root_table: &TableState,
    hero: usize,
    hero_hole: Hole,
    villain_hole: Hole,
    final_board: &Board,
    config: &ResolverConfig,
    rng: &mut SmallRng,
) -> (Utility, f64) {
    let mut table = root_table.clone();
    let root_street = root_table.street;
    let holes = [if hero == 0 { hero_hole } else { villain_hole }, if hero == 0 { villain_hole } else { hero_hole }];
    let mut history = [ActionHistory::new(), ActionHistory::new()];
    let mut kl_total = 0.0;
    let mut kl_count = 0usize;

    let outcome = loop {
        if table.live_players() <= 1 {
            let pot = table.pot as Utility;
            let winner = table.players.iter().position(|p| !p.folded).unwrap_or(0);
            break if winner == hero { pot } else { -pot };
        }
        let past_depth_limit = table.street != root_street;
        let can_advance = Engine::new(&mut table).can_advance().0;
        if can_advance {
            if table.street == Street::Rive {
                let (u0, u1) = showdown_utility(holes[0], holes[1], final_board, table.pot);
                break if hero == 0 { u0 as Utility } else { u1 as Utility };
            }
            let mut engine = Engine::new(&mut table);
            engine.advance_street();
            let revealed = engine.table.street.n_board_cards();
            engine.table.board = Board::from_cards(final_board.cards()[..revealed].to_vec());
            continue;
        }

        let order = Engine::new(&mut table).speaking_order();
        let player = match order.into_iter().find(|&p| !table.players[p].acted && !table.players[p].all_in) {
            Some(p) => p,
            None => {
                let mut engine = Engine::new(&mut table);
                if !engine.advance_street() {
                    let (u0, u1) = showdown_utility(holes[0], holes[1], final_board, table.pot);
                    break if hero == 0 { u0 as Utility } else { u1 as Utility };
                }
                continue;
            }
        };

        let street = table.street;
        let in_position = player == table.button;
        let ctx = table.players[player].to_context(
            table.current_bet,
            table.last_raise_size,
            table.big_blind,
            table.raise_count,
            table.max_raise_repeats,
        );
        let available = abstraction::available_abstract_actions(&ctx, street, in_position);
        let key = infoset_key(bucketer, street, holes[player], &table.board, &history[player]);

        let mut blueprint_policy = blueprint.store.strategy_sum.row(&key).average(&available);

        if past_depth_limit {
            bias_leaf_policy(&mut blueprint_policy, config.leaf_continuation);
            let (chosen, _) = sample_from(&available, &blueprint_policy, rng);
            history[player].record(street, chosen);
            let concrete_pot = table.pot;
            let concrete = abstraction::backmap(chosen, concrete_pot, &ctx);
            let mut engine = Engine::new(&mut table);
            if engine.process_action(player, concrete).is_err() {
                let _ = engine.process_action(player, crate::rules::action::Action::Fold);
            }
            continue;
        }

        let sigma = ephemeral.regrets.row(&key).policy(&available);
        if player == hero {
            let kl = kl_divergence(&sigma, &blueprint_policy, config.blueprint_clip_min);
            kl_total += kl;
            kl_count += 1;
        }

        let (chosen, p_chosen) = sample_from(&available, &sigma, rng);
        ephemeral.strategy_sum.add_strategy(key.clone(), &sigma, 1.0);
        history[player].record(street, chosen);

        let pot = table.pot;
        let concrete = abstraction::backmap(chosen, pot, &ctx);
        let mut engine = Engine::new(&mut table);
        if engine.process_action(player, concrete).is_err() {
            let _ = engine.process_action(player, crate::rules::action::Action::Fold);
        }

        if player == hero {
            let penalty = if config.unsafe_resolve {
                0.0
            } else {
                let weight = config.kl_weight(street, !in_position);
                let kl = kl_divergence(&sigma, &blueprint_policy, config.blueprint_clip_min);
                weight * kl
            };
            let lookahead_pot = table.pot as Utility;
            let mut row = ephemeral.regrets.row(&key);
            for &action in &available {
                let delta = if action == chosen { (lookahead_pot - penalty) * (1.0 - p_chosen) } else { -(lookahead_pot - penalty) * sigma.get(&action).copied().unwrap_or(0.0) };
                row.add(action, delta);
            }
            ephemeral.regrets.0.insert(key, row);
        }
    };

    let mean_kl = if kl_count > 0 { kl_total / kl_count as f64 } else { 0.0 };
    (outcome, mean_kl)
}

fn sample_from(actions: &[AbstractAction], sigma: &BTreeMap<AbstractAction, f64>, rng: &mut SmallRng) -> (AbstractAction, f64) {
    let weights: Vec<(AbstractAction, f64)> = actions.iter().map(|&a| (a, sigma.get(&a).copied().unwrap_or(0.0))).collect();
    let total: f64 = weights.iter().map(|(_, w)| w).sum();
    if total <= 0.0 {
        let uniform = 1.0 / weights.len().max(1) as f64;
        return (weights[0].0, uniform);
    }
    let mut draw = rng.random::<f64>() * total;
    for &(action, w) in &weights {
        if draw <= w {
            return (action, w / total);
        }
        draw -= w;
    }
    let last = weights.last().expect("non-empty action set");
    (last.0, last.1 / total)
}

fn kl_divergence(p: &BTreeMap<AbstractAction, f64>, q: &BTreeMap<AbstractAction, f64>, clip_min: f64) -> f64 {
    p.iter()
        .map(|(action, &pa)| {
            if pa <= 0.0 {
                0.0
            } else {
                let qa = q.get(action).copied().unwrap_or(0.0).max(clip_min);
                pa * (pa / qa).ln()
            }
        })
        .sum()
}

/// the four leaf-continuation biases applied to the blueprint policy at a
/// depth-limit leaf; `PureBlueprint` leaves the distribution untouched.
/// Reweights toward the named action and renormalizes; a no-op if that
/// action wasn't already legal at this infoset.
const LEAF_BIAS_WEIGHT: f64 = 2.0;

fn bias_leaf_policy(policy: &mut BTreeMap<AbstractAction, crate::Probability>, mode: LeafContinuation) {
    let bias = match mode {
        LeafContinuation::PureBlueprint => return,
        LeafContinuation::FoldBiased => AbstractAction::Fold,
        LeafContinuation::CallBiased => AbstractAction::CheckCall,
        LeafContinuation::RaiseBiased => AbstractAction::AllIn,
    };
    if let Some(w) = policy.get_mut(&bias) {
        *w += LEAF_BIAS_WEIGHT;
    }
    let total: f64 = policy.values().sum();
    if total > 0.0 {
        for w in policy.values_mut() {
            *w /= total;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bucket::{BucketFingerprint, IdentityBucketer};
    use rand::SeedableRng;

    fn table() -> TableState {
        let mut t = TableState::new(&[1000, 1000], 0, 50, 100);
        t.players[0].bet_this_round = 50;
        t.players[0].stack -= 50;
        t.players[1].bet_this_round = 100;
        t.players[1].stack -= 100;
        t.current_bet = 100;
        t.pot = 150;
        t
    }

    #[test]
    fn resolve_returns_a_normalized_policy() {
        let bucketer = IdentityBucketer::new(BucketFingerprint::default());
        let rules = crate::config::RulesConfig::default();
        let config = ResolverConfig { min_iterations: 5, time_budget_ms: 5, ..Default::default() };
        let blueprint = BlueprintExport { bucket_fingerprint: bucketer.fingerprint(), store: Store::new() };
        let mut rng = SmallRng::seed_from_u64(1);
        let hero_hole = Hole::new(crate::cards::card::Card::parse("Ah").unwrap(), crate::cards::card::Card::parse("Kd").unwrap());
        let result = resolve(&blueprint, &bucketer, &rules, &table(), 0, hero_hole, &config, &mut rng).unwrap();
        let total: f64 = result.policy.values().sum();
        assert!((total - 1.0).abs() < 1e-6);
    }

    #[test]
    fn river_skips_public_card_sampling() {
        let bucketer = IdentityBucketer::new(BucketFingerprint::default());
        let rules = crate::config::RulesConfig::default();
        let config = ResolverConfig { min_iterations: 3, time_budget_ms: 3, public_card_samples: 8, ..Default::default() };
        let blueprint = BlueprintExport { bucket_fingerprint: bucketer.fingerprint(), store: Store::new() };
        let mut rng = SmallRng::seed_from_u64(2);
        let mut t = table();
        t.street = Street::Rive;
        t.board = Board::from_cards(vec![
            crate::cards::card::Card::parse("2c").unwrap(),
            crate::cards::card::Card::parse("7d").unwrap(),
            crate::cards::card::Card::parse("9h").unwrap(),
            crate::cards::card::Card::parse("Ts").unwrap(),
            crate::cards::card::Card::parse("3c").unwrap(),
        ]);
        let hero_hole = Hole::new(crate::cards::card::Card::parse("Ah").unwrap(), crate::cards::card::Card::parse("Kd").unwrap());
        let result = resolve(&blueprint, &bucketer, &rules, &t, 0, hero_hole, &config, &mut rng).unwrap();
        assert!(result.metrics.iterations_completed > 0);
    }
}
