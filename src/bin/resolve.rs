//! real-time subgame resolver CLI. Reads a blueprint and a literal
//! table-state description, solves hero's strategy against it, and prints
//! the resulting abstract-action distribution as JSON.

use clap::Parser;
use holdem_solver::bucket::{BucketFingerprint, Bucketer, IdentityBucketer};
use holdem_solver::cards::board::Board;
use holdem_solver::cards::card::Card;
use holdem_solver::cards::hole::Hole;
use holdem_solver::cards::street::Street;
use holdem_solver::checkpoint::load_blueprint;
use holdem_solver::config::{LeafContinuation, ResolverConfig, RulesConfig};
use holdem_solver::game::table::TableState;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "resolve")]
#[command(about = "depth-limited real-time subgame resolver")]
struct Cli {
    /// path to a blueprint.bin produced by the trainer
    #[arg(long)]
    blueprint: std::path::PathBuf,

    /// JSON-encoded table state: {"street", "pot", "board", "button", "current_bet",
    /// "last_raise_size", "big_blind", "small_blind", "players": [{"stack","bet_this_round","folded","all_in"}]}
    #[arg(long)]
    table: String,

    /// hero's seat index within the table-state's players array
    #[arg(long)]
    hero: usize,

    /// hero's hole cards, e.g. "AhKd"
    #[arg(long)]
    hero_hole: String,

    /// per-solve time budget in milliseconds
    #[arg(long, default_value_t = 1000)]
    time_budget_ms: u64,

    /// minimum CFR iterations before the time budget is honored
    #[arg(long, default_value_t = 100)]
    min_iterations: u64,

    /// number of future-board samples when street is not the river
    #[arg(long, default_value_t = 4)]
    public_card_samples: usize,

    /// leaf continuation bias: pure-blueprint, fold-biased, call-biased, raise-biased
    #[arg(long, default_value = "pure-blueprint")]
    leaf_continuation: String,

    /// use unsafe resolving (no gift-avoidance against the opponent's alternatives)
    #[arg(long, default_value_t = false)]
    unsafe_resolve: bool,

    /// RNG seed for villain-hole and future-board sampling
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// print per-solve metrics (iterations, elapsed time, mean KL vs blueprint) alongside the policy
    #[arg(long, default_value_t = false)]
    verbose: bool,
}

#[derive(Debug, Deserialize)]
struct WireTableState {
    street: String,
    pot: i32,
    board: String,
    button: usize,
    current_bet: i32,
    last_raise_size: i32,
    big_blind: i32,
    small_blind: i32,
    players: Vec<WirePlayer>,
}

#[derive(Debug, Deserialize)]
struct WirePlayer {
    stack: i32,
    bet_this_round: i32,
    folded: bool,
    all_in: bool,
}

#[derive(Debug, Serialize)]
struct ResolveOutput {
    policy: std::collections::BTreeMap<String, f64>,
    metrics: Option<ResolveMetricsOutput>,
}

#[derive(Debug, Serialize)]
struct ResolveMetricsOutput {
    iterations_completed: u64,
    elapsed_ms: u64,
    mean_kl_vs_blueprint: f64,
}

fn parse_street(s: &str) -> anyhow::Result<Street> {
    match s.to_ascii_lowercase().as_str() {
        "preflop" | "pref" => Ok(Street::Pref),
        "flop" => Ok(Street::Flop),
        "turn" => Ok(Street::Turn),
        "river" | "rive" => Ok(Street::Rive),
        other => anyhow::bail!("unrecognized street '{other}'"),
    }
}

fn parse_board(s: &str) -> anyhow::Result<Board> {
    if s.is_empty() {
        return Ok(Board::new());
    }
    let chars: Vec<char> = s.chars().collect();
    if chars.len() % 2 != 0 {
        anyhow::bail!("board string must have an even number of characters");
    }
    let cards = chars
        .chunks(2)
        .map(|chunk| {
            let token: String = chunk.iter().collect();
            Card::parse(&token).ok_or_else(|| anyhow::anyhow!("invalid board card '{token}'"))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    Ok(Board::from_cards(cards))
}

fn parse_hole(s: &str) -> anyhow::Result<Hole> {
    if s.len() != 4 {
        anyhow::bail!("hole cards must be exactly two two-character tokens, e.g. 'AhKd'");
    }
    let a = Card::parse(&s[0..2]).ok_or_else(|| anyhow::anyhow!("invalid hole card '{}'", &s[0..2]))?;
    let b = Card::parse(&s[2..4]).ok_or_else(|| anyhow::anyhow!("invalid hole card '{}'", &s[2..4]))?;
    Ok(Hole::new(a, b))
}

fn leaf_continuation_from_str(s: &str) -> anyhow::Result<LeafContinuation> {
    match s {
        "pure-blueprint" => Ok(LeafContinuation::PureBlueprint),
        "fold-biased" => Ok(LeafContinuation::FoldBiased),
        "call-biased" => Ok(LeafContinuation::CallBiased),
        "raise-biased" => Ok(LeafContinuation::RaiseBiased),
        other => anyhow::bail!("unrecognized leaf continuation '{other}'"),
    }
}

/// reconstructs a `TableState` at the moment hero is on the clock: hero's
/// `acted` flag is cleared so the subgame loop hands them the first decision,
/// everyone else is marked as having already acted this street.
fn build_table(wire: &WireTableState, hero: usize) -> anyhow::Result<TableState> {
    let stacks: Vec<i32> = wire.players.iter().map(|p| p.stack + p.bet_this_round).collect();
    let mut table = TableState::new(&stacks, wire.button, wire.small_blind, wire.big_blind);
    table.street = parse_street(&wire.street)?;
    table.pot = wire.pot;
    table.board = parse_board(&wire.board)?;
    table.current_bet = wire.current_bet;
    table.last_raise_size = wire.last_raise_size;
    for (i, wp) in wire.players.iter().enumerate() {
        table.players[i].stack = wp.stack;
        table.players[i].bet_this_round = wp.bet_this_round;
        table.players[i].folded = wp.folded;
        table.players[i].all_in = wp.all_in;
        table.players[i].acted = i != hero;
    }
    Ok(table)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    holdem_solver::init_logging(if cli.verbose { log::LevelFilter::Debug } else { log::LevelFilter::Info });

    let wire: WireTableState = serde_json::from_str(&cli.table)?;
    let mut table = build_table(&wire, cli.hero)?;
    let hero_hole = parse_hole(&cli.hero_hole)?;

    let blueprint = load_blueprint(&cli.blueprint)?;
    let bucketer = IdentityBucketer::new(BucketFingerprint::default());
    if blueprint.bucket_fingerprint != bucketer.fingerprint() {
        anyhow::bail!("blueprint bucket fingerprint does not match this resolver's configured bucketer");
    }

    let config = ResolverConfig {
        time_budget_ms: cli.time_budget_ms,
        min_iterations: cli.min_iterations,
        public_card_samples: cli.public_card_samples,
        leaf_continuation: leaf_continuation_from_str(&cli.leaf_continuation)?,
        unsafe_resolve: cli.unsafe_resolve,
        ..Default::default()
    };
    let rules = RulesConfig::default();
    table.max_raise_repeats = rules.max_raise_repeats;
    let mut rng = SmallRng::seed_from_u64(cli.seed);

    let result = holdem_solver::resolver::resolve(&blueprint, &bucketer, &rules, &table, cli.hero, hero_hole, &config, &mut rng)?;

    let output = ResolveOutput {
        policy: result.policy.into_iter().map(|(action, p)| (action.to_string(), p)).collect(),
        metrics: cli.verbose.then(|| ResolveMetricsOutput {
            iterations_completed: result.metrics.iterations_completed,
            elapsed_ms: result.metrics.elapsed_ms,
            mean_kl_vs_blueprint: result.metrics.mean_kl_vs_blueprint,
        }),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
