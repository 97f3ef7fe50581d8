use crate::abstraction::AbstractAction;
use crate::Probability;
use std::collections::BTreeMap;

/// cumulative strategy-sum row at a single infoset. Grows monotonically
/// between discounts; normalizing it yields the average strategy.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct PolicyRow(pub BTreeMap<AbstractAction, Probability>);

impl PolicyRow {
    pub fn add(&mut self, policy: &BTreeMap<AbstractAction, Probability>, weight: f64) {
        for (&action, &p) in policy.iter() {
            *self.0.entry(action).or_insert(0.0) += weight * p;
        }
    }

    /// average strategy: the row normalized to sum 1; uniform if empty.
    pub fn average(&self, actions: &[AbstractAction]) -> BTreeMap<AbstractAction, Probability> {
        let total: f64 = self.0.values().sum();
        if total > 0.0 {
            actions.iter().map(|&a| (a, self.0.get(&a).copied().unwrap_or(0.0) / total)).collect()
        } else {
            let uniform = 1.0 / actions.len().max(1) as f64;
            actions.iter().map(|&a| (a, uniform)).collect()
        }
    }

    pub fn scale(&mut self, beta: f64) {
        for value in self.0.values_mut() {
            *value *= beta;
        }
    }

    fn merge(&mut self, other: &PolicyRow) {
        for (&action, &value) in other.0.iter() {
            *self.0.entry(action).or_insert(0.0) += value;
        }
    }
}

/// mapping infoset -> strategy-sum row, merged by the same additive
/// contract as `RegretTable`.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct StrategySumTable(pub std::collections::BTreeMap<crate::infoset::InfoSetKey, PolicyRow>);

impl StrategySumTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn row(&self, key: &crate::infoset::InfoSetKey) -> PolicyRow {
        self.0.get(key).cloned().unwrap_or_default()
    }

    pub fn add_strategy(
        &mut self,
        key: crate::infoset::InfoSetKey,
        policy: &BTreeMap<AbstractAction, Probability>,
        weight: f64,
    ) {
        self.0.entry(key).or_default().add(policy, weight);
    }

    pub fn discount(&mut self, beta: f64) {
        for row in self.0.values_mut() {
            row.scale(beta);
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn merge(&mut self, other: &StrategySumTable) {
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
        InfoSetKey::new(Street::Turn, 9, &ActionHistory::new())
    }

    #[test]
    fn average_strategy_is_uniform_when_empty() {
        let table = StrategySumTable::new();
        let avg = table.row(&key()).average(&[AbstractAction::Fold, AbstractAction::CheckCall]);
        assert_eq!(avg[&AbstractAction::Fold], 0.5);
    }

    #[test]
    fn average_strategy_normalizes_accumulated_weight() {
        let mut table = StrategySumTable::new();
        let mut policy = BTreeMap::new();
        policy.insert(AbstractAction::Fold, 1.0);
        table.add_strategy(key(), &policy, 3.0);
        let mut policy2 = BTreeMap::new();
        policy2.insert(AbstractAction::CheckCall, 1.0);
        table.add_strategy(key(), &policy2, 1.0);
        let avg = table.row(&key()).average(&[AbstractAction::Fold, AbstractAction::CheckCall]);
        assert!((avg[&AbstractAction::Fold] - 0.75).abs() < 1e-9);
    }
}
