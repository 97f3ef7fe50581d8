use super::card::Card;
use super::hand::Hand;
use super::kickers::Kickers;
use super::rank::Rank;
use super::ranking::Ranking;
use super::suit::Suit;

/// evaluates the best five-card ranking available within a hand of five to
/// seven cards (hole cards unioned with the board), using bitwise rank/suit
/// masks rather than enumerating five-card subsets.
pub struct Evaluator(Hand);

impl From<Hand> for Evaluator {
    fn from(h: Hand) -> Self {
        Self(h)
    }
}

impl Evaluator {
    pub fn find_ranking(&self) -> Ranking {
        None.or_else(|| self.find_straight_flush())
            .or_else(|| self.find_4_oak())
            .or_else(|| self.find_3_oak_2_oak())
            .or_else(|| self.find_flush())
            .or_else(|| self.find_straight())
            .or_else(|| self.find_3_oak())
            .or_else(|| self.find_2_oak_2_oak())
            .or_else(|| self.find_2_oak())
            .or_else(|| self.find_1_oak())
            .expect("at least one card in hand")
    }

    pub fn find_kickers(&self, value: Ranking) -> Kickers {
        let n = value.n_kickers();
        if n == 0 {
            return Kickers::from(0u16);
        }
        let mask = value.spent_mask();
        let mut bits = !mask & self.rank_masks();
        while bits.count_ones() as usize > n {
            bits &= !(1 << bits.trailing_zeros());
        }
        Kickers::from(bits)
    }

    fn find_1_oak(&self) -> Option<Ranking> {
        self.find_rank_of_n_oak(1).map(Ranking::HighCard)
    }
    fn find_2_oak(&self) -> Option<Ranking> {
        self.find_rank_of_n_oak(2).map(Ranking::OnePair)
    }
    fn find_3_oak(&self) -> Option<Ranking> {
        self.find_rank_of_n_oak(3).map(Ranking::ThreeOAK)
    }
    fn find_4_oak(&self) -> Option<Ranking> {
        self.find_rank_of_n_oak(4).map(Ranking::FourOAK)
    }
    fn find_2_oak_2_oak(&self) -> Option<Ranking> {
        self.find_rank_of_n_oak(2).and_then(|hi| {
            self.find_rank_of_n_oak_under(2, Some(hi))
                .map(|lo| Ranking::TwoPair(hi, lo))
                .or(Some(Ranking::OnePair(hi)))
        })
    }
    fn find_3_oak_2_oak(&self) -> Option<Ranking> {
        self.find_rank_of_n_oak(3).and_then(|trips| {
            self.find_rank_of_n_oak_under(2, Some(trips))
                .map(|pair| Ranking::FullHouse(trips, pair))
        })
    }
    fn find_straight(&self) -> Option<Ranking> {
        self.find_rank_of_straight(self.rank_masks())
            .map(Ranking::Straight)
    }
    fn find_flush(&self) -> Option<Ranking> {
        self.find_suit_of_flush().map(|suit| {
            let bits = self.suit_masks()[suit as usize];
            Ranking::Flush(Rank::from(bits))
        })
    }
    fn find_straight_flush(&self) -> Option<Ranking> {
        self.find_suit_of_flush()
            .and_then(|suit| self.find_rank_of_straight_flush(suit))
            .map(Ranking::StraightFlush)
    }

    fn find_rank_of_straight(&self, hand: u16) -> Option<Rank> {
        const WHEEL: u16 = 0b1_0000_0000_1111;
        let mut bits = hand;
        bits &= bits << 1;
        bits &= bits << 1;
        bits &= bits << 1;
        bits &= bits << 1;
        if bits > 0 {
            Some(Rank::from(bits))
        } else if hand & WHEEL == WHEEL {
            Some(Rank::Five)
        } else {
            None
        }
    }
    fn find_rank_of_straight_flush(&self, suit: Suit) -> Option<Rank> {
        let bits = self.suit_masks()[suit as usize];
        self.find_rank_of_straight(bits)
    }
    fn find_suit_of_flush(&self) -> Option<Suit> {
        self.suit_count()
            .iter()
            .position(|&n| n >= 5)
            .map(|i| Suit::from(i as u8))
    }
    fn find_rank_of_n_oak_under(&self, oak: usize, below: Option<Rank>) -> Option<Rank> {
        let ceiling = below.map(|r| r as u8).unwrap_or(13);
        let mut rank = ceiling;
        while rank > 0 {
            rank -= 1;
            let mask = u16::from(Rank::from(rank));
            let count = Vec::<Card>::from(self.0)
                .iter()
                .filter(|c| u16::from(c.rank()) == mask)
                .count();
            if count >= oak {
                return Some(Rank::from(rank));
            }
        }
        None
    }
    fn find_rank_of_n_oak(&self, n: usize) -> Option<Rank> {
        self.find_rank_of_n_oak_under(n, None)
    }

    /// which ranks are present, neglecting suit.
    fn rank_masks(&self) -> u16 {
        Vec::<Card>::from(self.0)
            .iter()
            .map(|c| u16::from(c.rank()))
            .fold(0, |acc, r| acc | r)
    }
    /// how many cards of each suit are present.
    fn suit_count(&self) -> [u8; 4] {
        Vec::<Card>::from(self.0)
            .iter()
            .map(|c| u8::from(c.suit()))
            .fold([0; 4], |mut counts, s| {
                counts[s as usize] += 1;
                counts
            })
    }
    /// which ranks are present, grouped by suit.
    fn suit_masks(&self) -> [u16; 4] {
        Vec::<Card>::from(self.0)
            .iter()
            .map(|c| (u8::from(c.suit()), u16::from(c.rank())))
            .fold([0; 4], |mut suits, (s, r)| {
                suits[s as usize] |= r;
                suits
            })
    }
}

/// chip-level showdown utility for heads-up play: splits `pot` according to
/// the two hands' best five-card strength over `hole ∪ board`, returning
/// zero-sum `(hero, villain)` winnings relative to their own contributions.
pub fn showdown_utility(
    hero: super::hole::Hole,
    villain: super::hole::Hole,
    board: &super::board::Board,
    pot: crate::Chips,
) -> (crate::Chips, crate::Chips) {
    let hero_hand = Hand::from(hero.cards().iter().copied().chain(board.cards().iter().copied()).collect::<Vec<_>>());
    let villain_hand = Hand::from(villain.cards().iter().copied().chain(board.cards().iter().copied()).collect::<Vec<_>>());
    let hero_strength = Strength::from(hero_hand);
    let villain_strength = Strength::from(villain_hand);
    match hero_strength.cmp(&villain_strength) {
        std::cmp::Ordering::Greater => (pot, -pot),
        std::cmp::Ordering::Less => (-pot, pot),
        std::cmp::Ordering::Equal => (0, 0),
    }
}

use super::strength::Strength;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::card::Card;
    use crate::cards::rank::Rank;
    use crate::cards::suit::Suit;

    fn evaluate_hand(cards: Vec<(Rank, Suit)>) -> Ranking {
        let hand = Hand::from(
            cards
                .into_iter()
                .map(|(r, s)| Card::new(r, s))
                .collect::<Vec<Card>>(),
        );
        Evaluator::from(hand).find_ranking()
    }

    #[test]
    fn high_card() {
        let hand = vec![
            (Rank::Ace, Suit::Spade),
            (Rank::King, Suit::Heart),
            (Rank::Queen, Suit::Diamond),
            (Rank::Jack, Suit::Club),
            (Rank::Nine, Suit::Spade),
        ];
        assert_eq!(evaluate_hand(hand), Ranking::HighCard(Rank::Ace));
    }

    #[test]
    fn one_pair() {
        let hand = vec![
            (Rank::Ace, Suit::Spade),
            (Rank::Ace, Suit::Heart),
            (Rank::King, Suit::Diamond),
            (Rank::Queen, Suit::Club),
            (Rank::Jack, Suit::Spade),
        ];
        assert_eq!(evaluate_hand(hand), Ranking::OnePair(Rank::Ace));
    }

    #[test]
    fn two_pair() {
        let hand = vec![
            (Rank::Ace, Suit::Spade),
            (Rank::Ace, Suit::Heart),
            (Rank::King, Suit::Diamond),
            (Rank::King, Suit::Club),
            (Rank::Queen, Suit::Spade),
        ];
        assert_eq!(evaluate_hand(hand), Ranking::TwoPair(Rank::Ace, Rank::King));
    }

    #[test]
    fn three_oak() {
        let hand = vec![
            (Rank::Ace, Suit::Spade),
            (Rank::Ace, Suit::Heart),
            (Rank::Ace, Suit::Diamond),
            (Rank::King, Suit::Club),
            (Rank::Queen, Suit::Spade),
        ];
        assert_eq!(evaluate_hand(hand), Ranking::ThreeOAK(Rank::Ace));
    }

    #[test]
    fn straight() {
        let hand = vec![
            (Rank::Ten, Suit::Spade),
            (Rank::Jack, Suit::Heart),
            (Rank::Queen, Suit::Diamond),
            (Rank::King, Suit::Club),
            (Rank::Ace, Suit::Spade),
        ];
        assert_eq!(evaluate_hand(hand), Ranking::Straight(Rank::Ace));
    }

    #[test]
    fn wheel_straight() {
        let hand = vec![
            (Rank::Ace, Suit::Spade),
            (Rank::Two, Suit::Heart),
            (Rank::Three, Suit::Diamond),
            (Rank::Four, Suit::Club),
            (Rank::Five, Suit::Spade),
        ];
        assert_eq!(evaluate_hand(hand), Ranking::Straight(Rank::Five));
    }

    #[test]
    fn flush_beats_straight() {
        let hand = vec![
            (Rank::Two, Suit::Spade),
            (Rank::Five, Suit::Spade),
            (Rank::Seven, Suit::Spade),
            (Rank::Nine, Suit::Spade),
            (Rank::Jack, Suit::Spade),
        ];
        assert_eq!(evaluate_hand(hand), Ranking::Flush(Rank::Jack));
    }

    #[test]
    fn full_house_beats_flush() {
        assert!(Ranking::FullHouse(Rank::Two, Rank::Three) > Ranking::Flush(Rank::Ace));
    }

    #[test]
    fn seven_card_hand_picks_best_five() {
        let hand = vec![
            (Rank::Two, Suit::Club),
            (Rank::Three, Suit::Diamond),
            (Rank::Ace, Suit::Spade),
            (Rank::Ace, Suit::Heart),
            (Rank::Ace, Suit::Diamond),
            (Rank::King, Suit::Club),
            (Rank::King, Suit::Spade),
        ];
        assert_eq!(evaluate_hand(hand), Ranking::FullHouse(Rank::Ace, Rank::King));
    }

    #[test]
    fn showdown_tie_is_zero_sum() {
        let board = super::super::board::Board::from_cards(vec![
            Card::new(Rank::Two, Suit::Club),
            Card::new(Rank::Seven, Suit::Diamond),
            Card::new(Rank::Nine, Suit::Heart),
            Card::new(Rank::Jack, Suit::Spade),
            Card::new(Rank::King, Suit::Club),
        ]);
        let hero = super::super::hole::Hole::new(
            Card::new(Rank::Three, Suit::Club),
            Card::new(Rank::Four, Suit::Diamond),
        );
        let villain = super::super::hole::Hole::new(
            Card::new(Rank::Three, Suit::Heart),
            Card::new(Rank::Four, Suit::Spade),
        );
        let (h, v) = showdown_utility(hero, villain, &board, 100);
        assert_eq!(h, 0);
        assert_eq!(v, 0);
    }
}
