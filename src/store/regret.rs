use crate::abstraction::AbstractAction;
use crate::Utility;
use std::collections::BTreeMap;

/// cumulative regret row at a single infoset: one value per action, created
/// lazily on first write.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct RegretRow(pub BTreeMap<AbstractAction, Utility>);

impl RegretRow {
    pub fn get(&self, action: AbstractAction) -> Utility {
        self.0.get(&action).copied().unwrap_or(0.0)
    }

    pub fn add(&mut self, action: AbstractAction, delta: Utility) {
        let entry = self.0.entry(action).or_insert(0.0);
        *entry = (*entry + delta).clamp(crate::REGRET_MIN, crate::REGRET_MAX);
    }

    /// regret-matching: positive part of every regret, normalized; uniform
    /// over `actions` if every regret is non-positive.
    pub fn policy(&self, actions: &[AbstractAction]) -> BTreeMap<AbstractAction, crate::Probability> {
        let positive: Vec<(AbstractAction, f64)> = actions
            .iter()
            .map(|&a| (a, self.get(a).max(0.0)))
            .collect();
        let total: f64 = positive.iter().map(|(_, p)| p).sum();
        if total > 0.0 {
            positive.into_iter().map(|(a, p)| (a, p / total)).collect()
        } else {
            let uniform = 1.0 / actions.len().max(1) as f64;
            actions.iter().map(|&a| (a, uniform)).collect()
        }
    }

    /// in-place DCFR/CFR+ discount; `floor_negative` implements the CFR+
    /// variant that clamps negative regrets to zero after scaling.
    pub fn discount(&mut self, alpha: f64, beta: f64, floor_negative: bool) {
        for value in self.0.values_mut() {
            let factor = if *value >= 0.0 { alpha } else { beta };
            *value *= factor;
            if floor_negative && *value < 0.0 {
                *value = 0.0;
            }
        }
    }

    fn merge(&mut self, other: &RegretRow) {
        for (&action, &value) in other.0.iter() {
            *self.0.entry(action).or_insert(0.0) += value;
        }
    }
}

/// mapping infoset -> regret row. Merges by element-wise sum, which is
/// associative and commutative, matching independent MCCFR workers'
/// contributions being additive rather than averaged.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct RegretTable(pub std::collections::BTreeMap<crate::infoset::InfoSetKey, RegretRow>);

impl RegretTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn row(&self, key: &crate::infoset::InfoSetKey) -> RegretRow {
        self.0.get(key).cloned().unwrap_or_default()
    }

    pub fn add_regret(&mut self, key: crate::infoset::InfoSetKey, action: AbstractAction, delta: Utility) {
        self.0.entry(key).or_default().add(action, delta);
    }

    pub fn discount(&mut self, alpha: f64, beta: f64, floor_negative: bool) {
        for row in self.0.values_mut() {
            row.discount(alpha, beta, floor_negative);
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// merges `other` into `self` by summation. Iteration is over `other`'s
    /// keys in sorted (BTreeMap) order so repeated merges of the same
    /// inputs are bit-reproducible regardless of call order.
    pub fn merge(&mut self, other: &RegretTable) {
        for (key, row) in other.0.iter() {
            self.0.entry(key.clone()).or_default().merge(row);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::street::Street;
    use crate::infoset::{ActionHistory, InfoSetKey};

    fn key() -> InfoSetKey {
        InfoSetKey::new(Street::Flop, 3, &ActionHistory::new())
    }

    #[test]
    fn regret_matching_is_uniform_when_all_nonpositive() {
        let mut table = RegretTable::new();
        table.add_regret(key(), AbstractAction::Fold, -1.0);
        table.add_regret(key(), AbstractAction::CheckCall, -5.0);
        let policy = table.row(&key()).policy(&[AbstractAction::Fold, AbstractAction::CheckCall]);
        assert_eq!(policy[&AbstractAction::Fold], 0.5);
        assert_eq!(policy[&AbstractAction::CheckCall], 0.5);
    }

    #[test]
    fn regret_matching_normalizes_positive_part() {
        let mut table = RegretTable::new();
        table.add_regret(key(), AbstractAction::Fold, 3.0);
        table.add_regret(key(), AbstractAction::CheckCall, 1.0);
        let policy = table.row(&key()).policy(&[AbstractAction::Fold, AbstractAction::CheckCall]);
        assert!((policy[&AbstractAction::Fold] - 0.75).abs() < 1e-9);
    }

    #[test]
    fn merge_is_commutative() {
        let mut a = RegretTable::new();
        a.add_regret(key(), AbstractAction::Fold, 2.0);
        let mut b = RegretTable::new();
        b.add_regret(key(), AbstractAction::Fold, 3.0);

        let mut ab = a.clone();
        ab.merge(&b);
        let mut ba = b.clone();
        ba.merge(&a);
        assert_eq!(ab.row(&key()).get(AbstractAction::Fold), ba.row(&key()).get(AbstractAction::Fold));
    }

    #[test]
    fn cfr_plus_floors_negative_regret_after_discount() {
        let mut table = RegretTable::new();
        table.add_regret(key(), AbstractAction::Fold, -10.0);
        table.discount(1.0, 1.0, true);
        assert_eq!(table.row(&key()).get(AbstractAction::Fold), 0.0);
    }
}
