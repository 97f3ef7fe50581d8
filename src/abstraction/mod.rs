//! maps the finite set of *abstract* actions the solver trains over onto
//! concrete chip amounts, and back. The abstraction is intentionally coarse
//! (fold / check-call / a handful of pot fractions / all-in) — this is the
//! dimensionality reduction that makes MCCFR tractable over no-limit bet
//! sizing.

pub mod odds;

use crate::cards::street::Street;
use crate::rules::action::Action;
use crate::rules::context::ActionContext;
use odds::Odds;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub enum AbstractAction {
    Fold,
    CheckCall,
    Raise(RaiseSize),
    AllIn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct RaiseSize(pub u32, pub u32);

impl From<Odds> for RaiseSize {
    fn from(o: Odds) -> Self {
        Self(o.0, o.1)
    }
}
impl From<RaiseSize> for Odds {
    fn from(r: RaiseSize) -> Self {
        Odds(r.0, r.1)
    }
}

impl std::fmt::Display for AbstractAction {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            AbstractAction::Fold => write!(f, "fold"),
            AbstractAction::CheckCall => write!(f, "check/call"),
            AbstractAction::AllIn => write!(f, "all-in"),
            AbstractAction::Raise(r) => write!(f, "{}", Odds::from(*r)),
        }
    }
}

/// micro-stack threshold, expressed as a multiple of the big blind, below
/// which the raise menu collapses to {fold, check/call, all-in}.
const MICRO_STACK_BIG_BLINDS: u32 = 3;

fn menu_for(street: Street, in_position: bool) -> &'static [Odds] {
    match street {
        Street::Pref => &Odds::PREFLOP,
        Street::Flop => &Odds::FLOP,
        _ if in_position => &Odds::FLOP[..3],
        _ => &Odds::LATE,
    }
}

/// enumerates the abstract actions legal at `ctx`, on `street`, for a player
/// either in or out of position.
pub fn available_abstract_actions(
    ctx: &ActionContext,
    street: Street,
    in_position: bool,
) -> Vec<AbstractAction> {
    let mut actions = vec![AbstractAction::Fold, AbstractAction::CheckCall];
    let is_micro = ctx.stack <= ctx.big_blind * MICRO_STACK_BIG_BLINDS as crate::Chips;
    if !is_micro {
        for odds in menu_for(street, in_position) {
            actions.push(AbstractAction::Raise(RaiseSize::from(*odds)));
        }
    }
    if ctx.stack > 0 {
        actions.push(AbstractAction::AllIn);
    }
    actions
}

/// maps an abstract action back onto a concrete, rules-legal `Action`. Never
/// emits an action the rules kernel would reject — falls back to the
/// nearest legal alternative (all-in when a raise can't meet the minimum,
/// call when even an all-in raise is impossible).
pub fn backmap(action: AbstractAction, pot: crate::Chips, ctx: &ActionContext) -> Action {
    let to_call = ctx.to_call();
    match action {
        AbstractAction::Fold => {
            if to_call == 0 {
                Action::Check
            } else {
                Action::Fold
            }
        }
        AbstractAction::CheckCall => {
            if to_call == 0 {
                Action::Check
            } else {
                Action::Call(to_call.min(ctx.stack))
            }
        }
        AbstractAction::AllIn => {
            if ctx.stack == 0 {
                Action::Check
            } else {
                Action::AllIn(ctx.bet_this_round + ctx.stack)
            }
        }
        AbstractAction::Raise(size) => {
            let odds: Odds = size.into();
            let fraction = odds.0 as f64 / odds.1 as f64;
            let raw = ((pot + to_call) as f64 * fraction) as crate::Chips;
            let target = raw.max(ctx.big_blind).min(ctx.stack.max(1));
            let all_in_cutoff = (ctx.stack as f64 * crate::ALL_IN_THRESHOLD) as crate::Chips;
            if target >= all_in_cutoff || ctx.stack == 0 {
                return if ctx.stack == 0 { Action::Call(to_call.min(ctx.stack)) } else {
                    Action::AllIn(ctx.bet_this_round + ctx.stack)
                };
            }
            let min_raise = ctx.last_raise_size.max(ctx.big_blind);
            let min_total = ctx.current_bet + min_raise;
            if to_call == 0 {
                Action::Bet(target)
            } else {
                let proposed_total = to_call + target + ctx.bet_this_round;
                if proposed_total < min_total {
                    if ctx.stack + ctx.bet_this_round >= min_total {
                        Action::Raise(min_total)
                    } else {
                        Action::AllIn(ctx.bet_this_round + ctx.stack)
                    }
                } else {
                    Action::Raise(proposed_total.min(ctx.bet_this_round + ctx.stack))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(stack: crate::Chips, bet_this_round: crate::Chips, current_bet: crate::Chips) -> ActionContext {
        ActionContext {
            stack,
            bet_this_round,
            folded: false,
            all_in: false,
            current_bet,
            last_raise_size: 100,
            big_blind: 100,
            raise_count: 0,
            max_raise_repeats: crate::MAX_RAISE_REPEATS,
        }
    }

    #[test]
    fn micro_stack_collapses_menu() {
        let c = ctx(200, 0, 0);
        let actions = available_abstract_actions(&c, Street::Flop, true);
        assert!(actions.iter().all(|a| !matches!(a, AbstractAction::Raise(_))));
        assert!(actions.contains(&AbstractAction::AllIn));
    }

    #[test]
    fn quarter_pot_raise_uses_pot_plus_to_call_as_basis() {
        let c = ActionContext {
            stack: 200,
            bet_this_round: 0,
            folded: false,
            all_in: false,
            current_bet: 50,
            last_raise_size: 30,
            big_blind: 20,
            raise_count: 0,
            max_raise_repeats: crate::MAX_RAISE_REPEATS,
        };
        let action = backmap(AbstractAction::Raise(RaiseSize(1, 4)), 100, &c);
        assert_eq!(action, Action::Raise(87));
    }

    #[test]
    fn near_stack_raise_becomes_all_in() {
        let c = ctx(1000, 0, 0);
        let action = backmap(AbstractAction::Raise(RaiseSize(4, 1)), 1000, &c);
        assert!(matches!(action, Action::AllIn(_)));
    }

    #[test]
    fn check_call_calls_full_amount_when_short() {
        let c = ctx(50, 0, 100);
        let action = backmap(AbstractAction::CheckCall, 200, &c);
        assert_eq!(action, Action::Call(50));
    }

    #[test]
    fn fold_becomes_check_when_nothing_owed() {
        let c = ctx(1000, 0, 0);
        let action = backmap(AbstractAction::Fold, 100, &c);
        assert_eq!(action, Action::Check);
    }

    #[test]
    fn backmap_never_emits_illegal_action() {
        let c = ctx(1000, 0, 100);
        for action in available_abstract_actions(&c, Street::Pref, true) {
            let concrete = backmap(action, 300, &c);
            let (legal, _) = crate::rules::is_action_legal(&concrete, &c);
            assert!(legal, "{concrete} illegal for {action}");
        }
    }
}
