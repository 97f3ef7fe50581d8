use crate::cards::board::Board;
use crate::cards::hole::Hole;
use crate::cards::street::Street;
use crate::Chips;

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerState {
    pub stack: Chips,
    pub bet_this_round: Chips,
    pub folded: bool,
    pub all_in: bool,
    pub acted: bool,
    pub hole: Option<Hole>,
}

impl PlayerState {
    pub fn new(stack: Chips) -> Self {
        Self {
            stack,
            bet_this_round: 0,
            folded: false,
            all_in: false,
            acted: false,
            hole: None,
        }
    }

    pub fn to_context(
        &self,
        current_bet: Chips,
        last_raise_size: Chips,
        big_blind: Chips,
        raise_count: usize,
        max_raise_repeats: usize,
    ) -> crate::rules::context::ActionContext {
        crate::rules::context::ActionContext {
            stack: self.stack,
            bet_this_round: self.bet_this_round,
            folded: self.folded,
            all_in: self.all_in,
            current_bet,
            last_raise_size,
            big_blind,
            raise_count,
            max_raise_repeats,
        }
    }
}

/// the mutable state of a single hand in progress: the kernel's ground truth
/// that `game::engine` mutates through validated actions only.
#[derive(Debug, Clone)]
pub struct TableState {
    pub street: Street,
    pub pot: Chips,
    pub board: Board,
    pub players: Vec<PlayerState>,
    pub button: usize,
    pub current_bet: Chips,
    pub last_raise_size: Chips,
    pub big_blind: Chips,
    pub small_blind: Chips,
    pub hand_in_progress: bool,
    pub raise_count: usize,
    pub max_raise_repeats: usize,
}

impl TableState {
    pub fn new(stacks: &[Chips], button: usize, small_blind: Chips, big_blind: Chips) -> Self {
        Self {
            street: Street::Pref,
            pot: 0,
            board: Board::new(),
            players: stacks.iter().copied().map(PlayerState::new).collect(),
            button,
            current_bet: 0,
            last_raise_size: big_blind,
            big_blind,
            small_blind,
            hand_in_progress: true,
            raise_count: 0,
            max_raise_repeats: crate::MAX_RAISE_REPEATS,
        }
    }

    pub fn num_players(&self) -> usize {
        self.players.len()
    }

    pub fn bets_this_round(&self) -> Vec<Chips> {
        self.players.iter().map(|p| p.bet_this_round).collect()
    }

    pub fn stacks(&self) -> Vec<Chips> {
        self.players.iter().map(|p| p.stack).collect()
    }

    pub fn live_players(&self) -> usize {
        self.players.iter().filter(|p| !p.folded).count()
    }
}
