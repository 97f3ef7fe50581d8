use super::card::Card;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand::rngs::SmallRng;

/// a shuffled deck drawn from a single seeded generator so that full hand
/// deals are reproducible for a given sampler seed.
#[derive(Debug, Clone)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    pub fn new(rng: &mut SmallRng) -> Self {
        let mut cards: Vec<Card> = (0..52u8).map(Card::from).collect();
        cards.shuffle(rng);
        Self { cards }
    }

    /// deck excluding `known`, already shuffled, used for future-board sampling
    /// where some cards (hero hole, current board) must not be redealt.
    pub fn excluding(rng: &mut SmallRng, known: &[Card]) -> Self {
        let mut cards: Vec<Card> = (0..52u8)
            .map(Card::from)
            .filter(|c| !known.contains(c))
            .collect();
        cards.shuffle(rng);
        Self { cards }
    }

    pub fn draw(&mut self) -> Option<Card> {
        self.cards.pop()
    }

    pub fn remaining(&self) -> usize {
        self.cards.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_deck_has_52_distinct_cards() {
        let mut rng = SmallRng::seed_from_u64(7);
        let mut deck = Deck::new(&mut rng);
        let mut seen = std::collections::HashSet::new();
        while let Some(card) = deck.draw() {
            assert!(seen.insert(card));
        }
        assert_eq!(seen.len(), 52);
    }

    #[test]
    fn excluding_never_deals_known_cards() {
        let mut rng = SmallRng::seed_from_u64(3);
        let known = vec![Card::parse("Ah").unwrap(), Card::parse("Kd").unwrap()];
        let mut deck = Deck::excluding(&mut rng, &known);
        while let Some(card) = deck.draw() {
            assert!(!known.contains(&card));
        }
    }
}
