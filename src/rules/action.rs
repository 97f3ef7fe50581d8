use crate::Chips;
use colored::*;
use std::fmt::{Display, Formatter, Result};

/// a concrete action against a player's own stack and the table's current bet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Action {
    Fold,
    Check,
    Call(Chips),
    Bet(Chips),
    Raise(Chips),
    AllIn(Chips),
}

impl Action {
    pub fn amount(&self) -> Chips {
        match self {
            Action::Fold | Action::Check => 0,
            Action::Call(a) | Action::Bet(a) | Action::Raise(a) | Action::AllIn(a) => *a,
        }
    }
}

impl Display for Action {
    fn fmt(&self, f: &mut Formatter) -> Result {
        match self {
            Action::Fold => write!(f, "{}", "FOLD".red()),
            Action::Check => write!(f, "{}", "CHECK".cyan()),
            Action::Call(a) => write!(f, "{}", format!("CALL {a}").yellow()),
            Action::Bet(a) => write!(f, "{}", format!("BET {a}").green()),
            Action::Raise(a) => write!(f, "{}", format!("RAISE {a}").green()),
            Action::AllIn(a) => write!(f, "{}", format!("ALLIN {a}").magenta()),
        }
    }
}
