use super::evaluator::Evaluator;
use super::hand::Hand;
use super::kickers::Kickers;
use super::ranking::Ranking;

/// a hand's full showdown strength: its category plus kickers, comparable
/// end-to-end via derived `Ord` (category first, kickers break ties within it).
#[derive(Debug, Clone, Copy, Eq, PartialEq, PartialOrd, Ord)]
pub struct Strength {
    ranking: Ranking,
    kickers: Kickers,
}

impl Strength {
    pub fn ranking(&self) -> Ranking {
        self.ranking
    }
}

impl From<Hand> for Strength {
    fn from(hand: Hand) -> Self {
        Self::from(Evaluator::from(hand))
    }
}
impl From<Evaluator> for Strength {
    fn from(e: Evaluator) -> Self {
        let ranking = e.find_ranking();
        let kickers = e.find_kickers(ranking);
        Self { ranking, kickers }
    }
}

impl std::fmt::Display for Strength {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:<18}{}", self.ranking, self.kickers)
    }
}
