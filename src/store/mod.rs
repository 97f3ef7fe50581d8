//! the regret/strategy store: the one piece of mutable state a training run
//! owns end to end. Regret-matching, DCFR/CFR+ discounting, and the
//! additive merge contract that lets independent worker processes combine
//! their contributions all live here.

pub mod discount;
pub mod policy;
pub mod regret;

pub use discount::{factors_at, DiscountFactors};
pub use policy::{PolicyRow, StrategySumTable};
pub use regret::{RegretRow, RegretTable};

/// the pair of tables a single run owns from iteration 1 until it ends.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Store {
    pub regrets: RegretTable,
    pub strategy_sum: StrategySumTable,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn discount(&mut self, factors: &DiscountFactors) {
        self.regrets.discount(factors.regret_alpha, factors.regret_beta, factors.floor_negative_regret);
        self.strategy_sum.discount(factors.strategy_beta);
    }

    pub fn merge(&mut self, other: &Store) {
        self.regrets.merge(&other.regrets);
        self.strategy_sum.merge(&other.strategy_sum);
    }

    pub fn infoset_count(&self) -> usize {
        self.regrets.len().max(self.strategy_sum.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abstraction::AbstractAction;
    use crate::cards::street::Street;
    use crate::infoset::{ActionHistory, InfoSetKey};

    #[test]
    fn merging_three_stores_is_associative() {
        let key = InfoSetKey::new(Street::Pref, 1, &ActionHistory::new());
        let mut a = Store::new();
        a.regrets.add_regret(key.clone(), AbstractAction::Fold, 1.0);
        let mut b = Store::new();
        b.regrets.add_regret(key.clone(), AbstractAction::Fold, 2.0);
        let mut c = Store::new();
        c.regrets.add_regret(key.clone(), AbstractAction::Fold, 3.0);

        let mut left = a.clone();
        left.merge(&b);
        left.merge(&c);

        let mut right = b.clone();
        right.merge(&c);
        let mut total = a;
        total.merge(&right);

        assert_eq!(left.regrets.row(&key).get(AbstractAction::Fold), total.regrets.row(&key).get(AbstractAction::Fold));
    }
}
