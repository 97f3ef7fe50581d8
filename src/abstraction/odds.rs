use crate::Probability;

/// a pot-normalized bet size, expressed as a ratio of raise-amount to pot.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, serde::Serialize, serde::Deserialize)]
pub struct Odds(pub u32, pub u32);

impl From<Odds> for Probability {
    fn from(odds: Odds) -> Self {
        odds.0 as Probability / odds.1 as Probability
    }
}

impl Odds {
    pub const PREFLOP: [Self; 10] = [
        Self(1, 4),
        Self(1, 3),
        Self(1, 2),
        Self(2, 3),
        Self(3, 4),
        Self(1, 1),
        Self(3, 2),
        Self(2, 1),
        Self(3, 1),
        Self(4, 1),
    ];
    pub const FLOP: [Self; 5] = [
        Self(1, 2),
        Self(3, 4),
        Self(1, 1),
        Self(3, 2),
        Self(2, 1),
    ];
    pub const LATE: [Self; 2] = [Self(1, 2), Self(1, 1)];
    pub const MICRO: [Self; 0] = [];
}

impl std::fmt::Display for Odds {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let p = Probability::from(*self);
        write!(f, "{:.0}%pot", p * 100.0)
    }
}
