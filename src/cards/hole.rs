/// a player's two private hole cards, stored in a canonical (sorted) order
/// so that `Hole::new(a, b) == Hole::new(b, a)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Hole(Card, Card);

impl Hole {
    pub fn new(a: Card, b: Card) -> Self {
        if a <= b {
            Self(a, b)
        } else {
            Self(b, a)
        }
    }

    pub fn cards(&self) -> [Card; 2] {
        [self.0, self.1]
    }
}

impl Display for Hole {
    fn fmt(&self, f: &mut Formatter) -> Result {
        write!(f, "{}{}", self.0, self.1)
    }
}

impl crate::Arbitrary for Hole {
    fn random() -> Self {
        Self::new(Card::random(), Card::random())
    }
}

use super::card::Card;
use std::fmt::{Display, Formatter, Result};
