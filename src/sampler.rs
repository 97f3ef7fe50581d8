//! MCCFR outcome sampling: one iteration descends a single sampled
//! trajectory through a randomly dealt hand, updating the traverser's
//! regrets with importance-corrected counterfactual values and adding every
//! visited node's current policy to the strategy sum.

use crate::abstraction::{self, AbstractAction};
use crate::bucket::Bucketer;
use crate::cards::board::Board;
use crate::cards::deck::Deck;
use crate::cards::evaluator::showdown_utility;
use crate::cards::hole::Hole;
use crate::cards::street::Street;
use crate::config::RulesConfig;
use crate::game::engine::Engine;
use crate::game::table::TableState;
use crate::infoset::{ActionHistory, InfoSetKey};
use crate::rules::action::Action;
use crate::store::Store;
use crate::{Chips, Utility};
use rand::rngs::SmallRng;
use rand::Rng;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy)]
pub struct SamplerConfig {
    pub epsilon: f64,
    pub linear_weighting: bool,
    pub pruning_enabled: bool,
    pub pruning_threshold: Utility,
    pub pruning_probability: f64,
    pub pruning_start_iteration: u64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IterationOutcome {
    pub traverser_utility: Utility,
    pub pruned: bool,
}

struct TraverserStep {
    key: InfoSetKey,
    actions: Vec<AbstractAction>,
    sigma: BTreeMap<AbstractAction, f64>,
    chosen: AbstractAction,
    p_mix: f64,
}

/// runs one MCCFR outcome-sampling iteration against `store`, dealing a
/// fresh random hand and alternating the traverser by parity of `t`.
/// Returns the traverser's realized utility; on any recoverable failure
/// (no legal actions, sampling impossibility) the iteration is discarded
/// and `Ok` carries a zero, pruned-marked outcome rather than propagating.
pub fn iterate(
    t: u64,
    rng: &mut SmallRng,
    bucketer: &dyn Bucketer,
    rules: &RulesConfig,
    cfg: &SamplerConfig,
    store: &mut Store,
) -> IterationOutcome {
    let traverser = (t % 2) as usize;
    let mut deck = Deck::new(rng);
    let holes = [
        Hole::new(deck.draw().expect("fresh deck has 52 cards"), deck.draw().expect("fresh deck has 52 cards")),
        Hole::new(deck.draw().expect("fresh deck has 52 cards"), deck.draw().expect("fresh deck has 52 cards")),
    ];
    let full_board: Vec<_> = (0..5).map(|_| deck.draw().expect("fresh deck has 52 cards")).collect();

    let mut table = TableState::new(&[rules.starting_stack, rules.starting_stack], 0, rules.small_blind, rules.big_blind);
    table.max_raise_repeats = rules.max_raise_repeats;
    table.players[0].bet_this_round = rules.small_blind;
    table.players[0].stack -= rules.small_blind;
    table.players[1].bet_this_round = rules.big_blind;
    table.players[1].stack -= rules.big_blind;
    table.current_bet = rules.big_blind;
    table.pot = rules.small_blind + rules.big_blind;

    let mut history = [ActionHistory::new(), ActionHistory::new()];
    let mut steps: Vec<TraverserStep> = Vec::new();
    let mut pruned = false;

    let outcome = 'hand: loop {
        if table.live_players() <= 1 {
            break 'hand fold_terminal(&table);
        }
        let can_advance = Engine::new(&mut table).can_advance().0;
        if can_advance {
            if table.street == Street::Rive {
                break 'hand showdown_terminal(&holes, &table, &full_board);
            }
            let mut engine = Engine::new(&mut table);
            engine.advance_street();
            let revealed = engine.table.street.n_board_cards();
            engine.table.board = Board::from_cards(full_board[..revealed].to_vec());
            continue;
        }

        let order = Engine::new(&mut table).speaking_order();
        let player = match order.into_iter().find(|&p| !table.players[p].acted && !table.players[p].all_in) {
            Some(p) => p,
            None => {
                // no player left to act but the round didn't signal closed;
                // force the street forward defensively rather than loop.
                let mut engine = Engine::new(&mut table);
                if !engine.advance_street() {
                    break 'hand showdown_terminal(&holes, &engine.table, &full_board);
                }
                let revealed = engine.table.street.n_board_cards();
                engine.table.board = Board::from_cards(full_board[..revealed].to_vec());
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

        if cfg.pruning_enabled
            && t >= cfg.pruning_start_iteration
            && player == traverser
            && rng.random::<f64>() < cfg.pruning_probability
        {
            let key = infoset_key(player, street, &holes[player], &table.board, bucketer, &history[player]);
            let row = store.regrets.row(&key);
            if available.iter().all(|&a| row.get(a) <= cfg.pruning_threshold) {
                pruned = true;
                break 'hand (Utility::from(0.0), Utility::from(0.0));
            }
        }

        let key = infoset_key(player, street, &holes[player], &table.board, bucketer, &history[player]);
        let sigma = store.regrets.row(&key).policy(&available);

        let (chosen, p_mix) = if player == traverser {
            sample_mixture(&available, &sigma, cfg.epsilon, rng)
        } else {
            sample_policy(&available, &sigma, rng)
        };

        let weight = if cfg.linear_weighting { (t + 1) as f64 } else { 1.0 };
        store.strategy_sum.add_strategy(key.clone(), &sigma, weight);
        if player == traverser {
            steps.push(TraverserStep { key, actions: available.clone(), sigma, chosen, p_mix });
        }

        history[player].record(street, chosen);
        let pot = table.pot;
        let ctx = table.players[player].to_context(
            table.current_bet,
            table.last_raise_size,
            table.big_blind,
            table.raise_count,
            table.max_raise_repeats,
        );
        let concrete = abstraction::backmap(chosen, pot, &ctx);
        let mut engine = Engine::new(&mut table);
        if engine.process_action(player, concrete).is_err() {
            // degenerate abstraction/backmap mismatch: fold the traverser's
            // hand defensively rather than corrupt table invariants.
            let _ = engine.process_action(player, Action::Fold);
        }
    };

    let (u0, u1) = outcome;
    let traverser_utility = if traverser == 0 { u0 } else { u1 };

    for step in steps {
        let w = if cfg.linear_weighting { (t + 1) as f64 } else { 1.0 };
        let p_sampled = step.sigma.get(&step.chosen).copied().unwrap_or(0.0);
        let big_w = traverser_utility / step.p_mix.max(1e-12);
        for &action in &step.actions {
            let delta = if action == step.chosen {
                big_w * (1.0 - p_sampled)
            } else {
                let p_a = step.sigma.get(&action).copied().unwrap_or(0.0);
                -big_w * p_a
            };
            store.regrets.add_regret(step.key.clone(), action, w * delta);
        }
    }

    IterationOutcome { traverser_utility, pruned }
}

fn infoset_key(
    player: usize,
    street: Street,
    hole: &Hole,
    board: &Board,
    bucketer: &dyn Bucketer,
    history: &ActionHistory,
) -> InfoSetKey {
    let _ = player;
    let bucket = bucketer.bucket(street, *hole, board);
    InfoSetKey::new(street, bucket, history)
}

fn sample_mixture(
    actions: &[AbstractAction],
    sigma: &BTreeMap<AbstractAction, f64>,
    epsilon: f64,
    rng: &mut SmallRng,
) -> (AbstractAction, f64) {
    let n = actions.len().max(1) as f64;
    let mix: Vec<(AbstractAction, f64)> = actions
        .iter()
        .map(|&a| (a, epsilon / n + (1.0 - epsilon) * sigma.get(&a).copied().unwrap_or(0.0)))
        .collect();
    draw(&mix, rng)
}

fn sample_policy(
    actions: &[AbstractAction],
    sigma: &BTreeMap<AbstractAction, f64>,
    rng: &mut SmallRng,
) -> (AbstractAction, f64) {
    let weights: Vec<(AbstractAction, f64)> = actions.iter().map(|&a| (a, sigma.get(&a).copied().unwrap_or(0.0))).collect();
    draw(&weights, rng)
}

fn draw(weighted: &[(AbstractAction, f64)], rng: &mut SmallRng) -> (AbstractAction, f64) {
    let total: f64 = weighted.iter().map(|(_, w)| w).sum();
    if total <= 0.0 {
        let uniform = 1.0 / weighted.len().max(1) as f64;
        return (weighted[0].0, uniform);
    }
    let mut draw = rng.random::<f64>() * total;
    for &(action, w) in weighted {
        if draw <= w {
            return (action, w / total);
        }
        draw -= w;
    }
    let last = weighted.last().expect("non-empty action set");
    (last.0, last.1 / total)
}

fn fold_terminal(table: &TableState) -> (Utility, Utility) {
    let pot = table.pot as Utility;
    let winner = table.players.iter().position(|p| !p.folded).unwrap_or(0);
    if winner == 0 {
        (pot, -pot)
    } else {
        (-pot, pot)
    }
}

fn showdown_terminal(holes: &[Hole; 2], table: &TableState, full_board: &[crate::cards::card::Card]) -> (Utility, Utility) {
    let board = Board::from_cards(full_board.to_vec());
    let (u0, u1) = showdown_utility(holes[0], holes[1], &board, table.pot);
    (u0 as Utility, u1 as Utility)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bucket::IdentityBucketer;
    use rand::SeedableRng;

    fn cfg() -> SamplerConfig {
        SamplerConfig {
            epsilon: 0.6,
            linear_weighting: true,
            pruning_enabled: false,
            pruning_threshold: crate::REGRET_MIN,
            pruning_probability: 0.95,
            pruning_start_iteration: u64::MAX,
        }
    }

    #[test]
    fn iteration_produces_a_finite_utility_and_grows_the_store() {
        let mut rng = SmallRng::seed_from_u64(7);
        let bucketer = IdentityBucketer::new(Default::default());
        let rules = RulesConfig::default();
        let mut store = Store::new();
        for t in 0..50 {
            let outcome = iterate(t, &mut rng, &bucketer, &rules, &cfg(), &mut store);
            assert!(outcome.traverser_utility.is_finite());
        }
        assert!(!store.regrets.is_empty());
    }

    #[test]
    fn deterministic_with_fixed_seed() {
        let bucketer = IdentityBucketer::new(Default::default());
        let rules = RulesConfig::default();

        let mut rng_a = SmallRng::seed_from_u64(42);
        let mut store_a = Store::new();
        for t in 0..20 {
            iterate(t, &mut rng_a, &bucketer, &rules, &cfg(), &mut store_a);
        }

        let mut rng_b = SmallRng::seed_from_u64(42);
        let mut store_b = Store::new();
        for t in 0..20 {
            iterate(t, &mut rng_b, &bucketer, &rules, &cfg(), &mut store_b);
        }

        assert_eq!(store_a.infoset_count(), store_b.infoset_count());
    }
}
