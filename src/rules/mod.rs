//! the pure rules kernel: legality, bet-amount validation, pot/stack
//! consistency, and street-advance predicates. No logging, no I/O, no
//! mutation — every function is a deterministic map from inputs to an
//! outcome, callable from the game engine, the sampler, and tests alike.

pub mod action;
pub mod context;

use crate::cards::street::Street;
use action::Action;
use context::ActionContext;

#[derive(Debug, Clone, Default)]
pub struct Validation {
    pub is_valid: bool,
    pub corrected_amount: Option<crate::Chips>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

/// whether `action` may legally be taken given `ctx`, independent of amount.
pub fn is_action_legal(action: &Action, ctx: &ActionContext) -> (bool, Vec<String>) {
    if ctx.folded {
        return (false, vec!["folded players cannot act".into()]);
    }
    if ctx.all_in {
        return (false, vec!["all-in players cannot act".into()]);
    }
    let ok = match action {
        Action::Fold => true,
        Action::Check => ctx.current_bet == ctx.bet_this_round,
        Action::Call(_) => ctx.current_bet > ctx.bet_this_round,
        Action::Bet(_) => ctx.current_bet == 0,
        Action::Raise(_) => ctx.current_bet > 0 && ctx.raise_count < ctx.max_raise_repeats,
        Action::AllIn(_) => ctx.stack > 0,
    };
    if ok {
        (true, Vec::new())
    } else if matches!(action, Action::Raise(_)) && ctx.raise_count >= ctx.max_raise_repeats {
        (false, vec![format!("raise cap of {} reached this round", ctx.max_raise_repeats)])
    } else {
        (false, vec![format!("{action} is not legal in this context")])
    }
}

fn snap(amount: crate::Chips, increment: crate::Chips) -> crate::Chips {
    if increment <= 1 {
        return amount;
    }
    (amount / increment) * increment
}

/// validates (and when possible, corrects) the chip amount attached to an
/// action. Amounts that exceed the stack are clamped to an all-in; amounts
/// below the legal minimum are rejected unless the clamp is itself the
/// player's entire stack.
pub fn validate_bet_amount(action: &Action, ctx: &ActionContext, increment: crate::Chips) -> Validation {
    let mut v = Validation { is_valid: true, ..Default::default() };
    match action {
        Action::Fold | Action::Check => {}
        Action::Call(_) => {
            let corrected = ctx.to_call().min(ctx.stack);
            v.corrected_amount = Some(corrected);
        }
        Action::Bet(amount) => {
            let amount = *amount;
            if amount < ctx.big_blind && amount < ctx.stack {
                v.is_valid = false;
                v.errors.push(format!("bet {amount} below minimum {}", ctx.big_blind));
            } else {
                let corrected = snap(amount.min(ctx.stack), increment);
                if corrected != amount {
                    v.warnings.push(format!("bet clamped from {amount} to {corrected}"));
                }
                v.corrected_amount = Some(corrected);
            }
        }
        Action::Raise(to_amount) => {
            let to_amount = *to_amount;
            let min_raise = ctx.last_raise_size.max(ctx.big_blind);
            let min_total = ctx.current_bet + min_raise;
            if to_amount < min_total && to_amount < ctx.bet_this_round + ctx.stack {
                v.is_valid = false;
                v.errors.push(format!("raise to {to_amount} below minimum {min_total}"));
            } else {
                let ceiling = ctx.bet_this_round + ctx.stack;
                let corrected = snap(to_amount.min(ceiling), increment);
                if corrected != to_amount {
                    v.warnings.push(format!("raise clamped from {to_amount} to {corrected}"));
                }
                v.corrected_amount = Some(corrected);
            }
        }
        Action::AllIn(_) => {
            v.corrected_amount = Some(ctx.bet_this_round + ctx.stack);
        }
    }
    v
}

/// pot must never fall below the sum of in-round bets; violations are
/// surfaced as warnings because a caller usually cannot repair the pot
/// itself, only refuse to compound the error.
pub fn check_pot_consistency(pot: crate::Chips, bets_this_round: &[crate::Chips]) -> Vec<String> {
    let mut warnings = Vec::new();
    if pot < 0 {
        warnings.push("pot is negative".into());
    }
    let sum: crate::Chips = bets_this_round.iter().sum();
    if pot < sum {
        warnings.push(format!("pot {pot} is less than sum of in-round bets {sum}"));
    }
    warnings
}

/// stacks and in-round bets must never go negative; unlike pot warnings,
/// these are unrecoverable for the hand that produced them.
pub fn check_stack_consistency(stacks: &[crate::Chips], bets_this_round: &[crate::Chips]) -> Vec<String> {
    let mut errors = Vec::new();
    for (i, &s) in stacks.iter().enumerate() {
        if s < 0 {
            errors.push(format!("player {i} has negative stack {s}"));
        }
    }
    for (i, &b) in bets_this_round.iter().enumerate() {
        if b < 0 {
            errors.push(format!("player {i} has negative bet-this-round {b}"));
        }
    }
    errors
}

/// the betting round is closed once every non-folded, non-all-in player has
/// acted and matched the current bet, or once at most one player remains.
pub fn can_advance_to_next_street(
    folded: &[bool],
    all_in: &[bool],
    acted: &[bool],
    bets_this_round: &[crate::Chips],
    current_bet: crate::Chips,
) -> (bool, &'static str) {
    let live = folded.iter().filter(|&&f| !f).count();
    if live <= 1 {
        return (true, "at most one player remains");
    }
    for i in 0..folded.len() {
        if folded[i] || all_in[i] {
            continue;
        }
        if !acted[i] {
            return (false, "a player has not yet acted");
        }
        if bets_this_round[i] != current_bet {
            return (false, "a player has not matched the current bet");
        }
    }
    (true, "every live player has acted and matched the current bet")
}

pub fn get_next_street(street: Street) -> Option<Street> {
    street.next()
}

/// maps the most common illegal-action mistakes to the action the caller
/// probably meant, so the engine can recover instead of aborting the hand.
pub fn suggest_corrected_action(illegal: &Action, ctx: &ActionContext) -> Option<Action> {
    match illegal {
        Action::Check if ctx.current_bet > ctx.bet_this_round => {
            Some(Action::Call(ctx.to_call().min(ctx.stack)))
        }
        Action::Call(_) if ctx.current_bet == ctx.bet_this_round => Some(Action::Check),
        Action::Bet(amount) if ctx.current_bet > 0 => Some(Action::Raise(ctx.current_bet + amount)),
        Action::Raise(_) if ctx.raise_count >= ctx.max_raise_repeats => {
            Some(Action::Call(ctx.to_call().min(ctx.stack)))
        }
        Action::Raise(amount) if ctx.current_bet == 0 => Some(Action::Bet(*amount)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> ActionContext {
        ActionContext {
            stack: 1000,
            bet_this_round: 0,
            folded: false,
            all_in: false,
            current_bet: 0,
            last_raise_size: 0,
            big_blind: 100,
            raise_count: 0,
            max_raise_repeats: crate::MAX_RAISE_REPEATS,
        }
    }

    #[test]
    fn raise_illegal_once_cap_reached() {
        let mut c = ctx();
        c.current_bet = 100;
        c.raise_count = c.max_raise_repeats;
        assert!(!is_action_legal(&Action::Raise(200), &c).0);
        let suggestion = suggest_corrected_action(&Action::Raise(200), &c).unwrap();
        assert_eq!(suggestion, Action::Call(100));
    }

    #[test]
    fn check_legal_only_with_nothing_owed() {
        let mut c = ctx();
        assert!(is_action_legal(&Action::Check, &c).0);
        c.current_bet = 100;
        assert!(!is_action_legal(&Action::Check, &c).0);
    }

    #[test]
    fn folded_player_cannot_act() {
        let mut c = ctx();
        c.folded = true;
        assert!(!is_action_legal(&Action::Fold, &c).0);
    }

    #[test]
    fn raise_below_minimum_is_invalid_unless_all_in() {
        let mut c = ctx();
        c.current_bet = 100;
        c.last_raise_size = 100;
        let v = validate_bet_amount(&Action::Raise(150), &c, 1);
        assert!(!v.is_valid);

        c.stack = 140;
        let v = validate_bet_amount(&Action::Raise(140), &c, 1);
        assert!(v.is_valid);
    }

    #[test]
    fn bet_is_clamped_to_stack() {
        let c = ctx();
        let v = validate_bet_amount(&Action::Bet(5000), &c, 1);
        assert_eq!(v.corrected_amount, Some(1000));
    }

    #[test]
    fn street_advances_when_all_live_players_match() {
        let (can, _) = can_advance_to_next_street(
            &[false, false],
            &[false, false],
            &[true, true],
            &[100, 100],
            100,
        );
        assert!(can);
        let (can, _) = can_advance_to_next_street(
            &[false, false],
            &[false, false],
            &[true, false],
            &[100, 0],
            100,
        );
        assert!(!can);
    }

    #[test]
    fn street_advances_immediately_when_everyone_else_folds() {
        let (can, _) = can_advance_to_next_street(
            &[false, true],
            &[false, false],
            &[true, false],
            &[100, 0],
            100,
        );
        assert!(can);
    }

    #[test]
    fn suggestion_is_always_legal_in_context() {
        let mut c = ctx();
        c.current_bet = 100;
        let suggestion = suggest_corrected_action(&Action::Check, &c).unwrap();
        assert!(is_action_legal(&suggestion, &c).0);
    }

    #[test]
    fn river_has_no_next_street() {
        assert_eq!(get_next_street(Street::Rive), None);
    }
}
