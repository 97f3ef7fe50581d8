use super::table::TableState;
use crate::rules::action::Action;
use crate::rules::{self, context::ActionContext};
use crate::Chips;

pub struct ActionResult {
    pub applied: Action,
    pub warnings: Vec<String>,
}

/// drives a single hand's betting rounds: validates actions against the
/// rules kernel, applies their side effects, reopens action after a raise,
/// and advances the street once a round closes.
pub struct Engine<'a> {
    pub table: &'a mut TableState,
}

impl<'a> Engine<'a> {
    pub fn new(table: &'a mut TableState) -> Self {
        Self { table }
    }

    fn context(&self, player: usize) -> ActionContext {
        self.table.players[player].to_context(
            self.table.current_bet,
            self.table.last_raise_size,
            self.table.big_blind,
            self.table.raise_count,
            self.table.max_raise_repeats,
        )
    }

    /// applies `action` for `player`, correcting illegal or mis-sized
    /// actions where possible. Never mutates state on outright failure.
    pub fn process_action(&mut self, player: usize, action: Action) -> Result<ActionResult, Vec<String>> {
        let ctx = self.context(player);
        let (legal, mut messages) = rules::is_action_legal(&action, &ctx);
        let action = if legal {
            action
        } else if let Some(suggested) = rules::suggest_corrected_action(&action, &ctx) {
            messages.push(format!("corrected {action} to {suggested}"));
            suggested
        } else {
            return Err(messages);
        };

        let validation = rules::validate_bet_amount(&action, &ctx, crate::MIN_CHIP_INCREMENT);
        if !validation.is_valid {
            return Err(validation.errors);
        }
        messages.extend(validation.warnings.clone());

        let applied = match (action, validation.corrected_amount) {
            (Action::Call(_), Some(amount)) => Action::Call(amount),
            (Action::Bet(_), Some(amount)) => Action::Bet(amount),
            (Action::Raise(_), Some(amount)) => Action::Raise(amount),
            (Action::AllIn(_), Some(amount)) => Action::AllIn(amount),
            (other, _) => other,
        };

        self.apply(player, applied);
        Ok(ActionResult { applied, warnings: messages })
    }

    fn apply(&mut self, player: usize, action: Action) {
        let big_blind = self.table.big_blind;
        let is_raise = matches!(action, Action::Raise(_));
        let p = &mut self.table.players[player];
        match action {
            Action::Fold => p.folded = true,
            Action::Check => {}
            Action::Call(amount) => {
                p.stack -= amount;
                p.bet_this_round += amount;
                self.table.pot += amount;
                if p.stack == 0 {
                    p.all_in = true;
                }
            }
            Action::Bet(total) | Action::Raise(total) | Action::AllIn(total) => {
                let delta = total - p.bet_this_round;
                p.stack -= delta;
                p.bet_this_round = total;
                self.table.pot += delta;
                if p.stack == 0 {
                    p.all_in = true;
                }
                let raise_size = total - self.table.current_bet;
                let reopens = raise_size >= self.table.last_raise_size.max(big_blind) || !p.all_in;
                if total > self.table.current_bet {
                    self.table.current_bet = total;
                    if is_raise {
                        self.table.raise_count += 1;
                    }
                    if reopens {
                        self.table.last_raise_size = raise_size.max(big_blind);
                        for (i, other) in self.table.players.iter_mut().enumerate() {
                            if i != player && !other.folded && !other.all_in {
                                other.acted = false;
                            }
                        }
                    }
                }
            }
        }
        self.table.players[player].acted = true;
    }

    pub fn can_advance(&self) -> (bool, &'static str) {
        let folded: Vec<bool> = self.table.players.iter().map(|p| p.folded).collect();
        let all_in: Vec<bool> = self.table.players.iter().map(|p| p.all_in).collect();
        let acted: Vec<bool> = self.table.players.iter().map(|p| p.acted).collect();
        let bets = self.table.bets_this_round();
        rules::can_advance_to_next_street(&folded, &all_in, &acted, &bets, self.table.current_bet)
    }

    /// resets per-round betting state and deals into the next street.
    pub fn advance_street(&mut self) -> bool {
        match rules::get_next_street(self.table.street) {
            Some(next) => {
                self.table.street = next;
                self.table.current_bet = 0;
                self.table.last_raise_size = self.table.big_blind;
                self.table.raise_count = 0;
                for p in self.table.players.iter_mut() {
                    p.bet_this_round = 0;
                    p.acted = p.folded || p.all_in;
                }
                true
            }
            None => false,
        }
    }

    /// speaking order for the *current* street: heads-up preflop starts with
    /// the button (small blind), every other case starts left of the button.
    pub fn speaking_order(&self) -> Vec<usize> {
        let n = self.table.num_players();
        let first = if self.table.street == crate::cards::street::Street::Pref && n == 2 {
            self.table.button
        } else {
            (self.table.button + 1) % n
        };
        (0..n)
            .map(|i| (first + i) % n)
            .filter(|&i| !self.table.players[i].folded)
            .collect()
    }

    pub fn to_call(&self, player: usize) -> Chips {
        self.context(player).to_call()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::table::TableState;

    fn heads_up() -> TableState {
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
    fn heads_up_preflop_button_acts_first() {
        let table = heads_up();
        let engine = Engine::new(&mut table.clone());
        assert_eq!(engine.speaking_order()[0], 0);
    }

    #[test]
    fn raise_reopens_action_for_others() {
        let mut table = heads_up();
        let mut engine = Engine::new(&mut table);
        engine.process_action(0, Action::Raise(300)).unwrap();
        assert!(!engine.table.players[1].acted);
    }

    #[test]
    fn call_closes_round_when_matched() {
        let mut table = heads_up();
        let mut engine = Engine::new(&mut table);
        engine.process_action(0, Action::Call(50)).unwrap();
        let (can, _) = engine.can_advance();
        assert!(can);
    }

    #[test]
    fn fold_ends_hand_for_two_players() {
        let mut table = heads_up();
        let mut engine = Engine::new(&mut table);
        engine.process_action(0, Action::Fold).unwrap();
        let (can, _) = engine.can_advance();
        assert!(can);
        assert_eq!(engine.table.live_players(), 1);
    }

    #[test]
    fn illegal_check_is_corrected_to_call() {
        let mut table = heads_up();
        let mut engine = Engine::new(&mut table);
        let result = engine.process_action(0, Action::Check).unwrap();
        assert!(matches!(result.applied, Action::Call(_)));
    }
}
