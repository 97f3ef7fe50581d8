criterion::criterion_main!(benches);
criterion::criterion_group! {
    name = benches;
    config = criterion::Criterion::default()
        .without_plots()
        .noise_threshold(3.0)
        .significance_level(0.01)
        .sample_size(10)
        .measurement_time(std::time::Duration::from_secs(1));
    targets =
        evaluating_seven_card_hand,
        computing_showdown_utility,
        running_one_mccfr_iteration,
        resolving_one_subgame,
}

fn random_hole(deck: &mut Deck) -> Hole {
    Hole::new(deck.draw().expect("fresh deck has 52 cards"), deck.draw().expect("fresh deck has 52 cards"))
}

fn evaluating_seven_card_hand(c: &mut criterion::Criterion) {
    let mut rng = SmallRng::seed_from_u64(1);
    c.bench_function("evaluate a 7-card hand", |b| {
        b.iter(|| {
            let mut deck = Deck::new(&mut rng);
            let cards: Vec<Card> = (0..7).map(|_| deck.draw().unwrap()).collect();
            Evaluator::from(Hand::from(cards)).find_ranking()
        })
    });
}

fn computing_showdown_utility(c: &mut criterion::Criterion) {
    let mut rng = SmallRng::seed_from_u64(2);
    c.bench_function("settle a heads-up showdown", |b| {
        b.iter(|| {
            let mut deck = Deck::new(&mut rng);
            let hero = random_hole(&mut deck);
            let villain = random_hole(&mut deck);
            let board = Board::from_cards((0..5).map(|_| deck.draw().unwrap()).collect());
            showdown_utility(hero, villain, &board, 1000)
        })
    });
}

fn running_one_mccfr_iteration(c: &mut criterion::Criterion) {
    let bucketer = IdentityBucketer::new(BucketFingerprint::default());
    let rules = RulesConfig::default();
    let sampler_cfg = SamplerConfig {
        epsilon: 0.6,
        linear_weighting: true,
        pruning_enabled: false,
        pruning_threshold: holdem_solver::REGRET_MIN,
        pruning_probability: 0.95,
        pruning_start_iteration: u64::MAX,
    };
    let mut rng = SmallRng::seed_from_u64(3);
    let mut store = Store::new();
    let mut t = 0u64;
    c.bench_function("run one MCCFR outcome-sampling iteration", |b| {
        b.iter(|| {
            t += 1;
            iterate(t, &mut rng, &bucketer, &rules, &sampler_cfg, &mut store)
        })
    });
}

fn resolving_one_subgame(c: &mut criterion::Criterion) {
    let bucketer = IdentityBucketer::new(BucketFingerprint::default());
    let rules = RulesConfig::default();
    let config = ResolverConfig { min_iterations: 50, time_budget_ms: 50, ..Default::default() };
    let blueprint = BlueprintExport { bucket_fingerprint: bucketer.fingerprint(), store: Store::new() };
    let mut rng = SmallRng::seed_from_u64(4);
    let mut table = TableState::new(&[20_000, 20_000], 0, 50, 100);
    table.players[0].bet_this_round = 50;
    table.players[0].stack -= 50;
    table.players[1].bet_this_round = 100;
    table.players[1].stack -= 100;
    table.current_bet = 100;
    table.pot = 150;
    let hero_hole = Hole::new(Card::parse("Ah").unwrap(), Card::parse("Kd").unwrap());
    c.bench_function("resolve a preflop subgame against an empty blueprint", |b| {
        b.iter(|| resolve(&blueprint, &bucketer, &rules, &table, 0, hero_hole, &config, &mut rng))
    });
}

use holdem_solver::bucket::{BucketFingerprint, Bucketer, IdentityBucketer};
use holdem_solver::cards::board::Board;
use holdem_solver::cards::card::Card;
use holdem_solver::cards::deck::Deck;
use holdem_solver::cards::evaluator::{showdown_utility, Evaluator};
use holdem_solver::cards::hand::Hand;
use holdem_solver::cards::hole::Hole;
use holdem_solver::checkpoint::BlueprintExport;
use holdem_solver::config::{ResolverConfig, RulesConfig};
use holdem_solver::game::table::TableState;
use holdem_solver::resolver::resolve;
use holdem_solver::sampler::{iterate, SamplerConfig};
use holdem_solver::store::Store;
use rand::rngs::SmallRng;
use rand::SeedableRng;
