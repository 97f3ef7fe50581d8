//! canonical information-set keys. Two decision points collapse onto the
//! same key iff they share street, bucket, and street-segmented action
//! history — exactly the information the acting player can actually
//! observe. The key is a plain string so it is stable across process
//! restarts and usable directly as a store lookup/serialization key.

use crate::abstraction::AbstractAction;
use crate::bucket::BucketId;
use crate::cards::street::Street;
use std::fmt::Write as _;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ActionHistory {
    by_street: Vec<Vec<AbstractAction>>,
}

impl ActionHistory {
    pub fn new() -> Self {
        Self { by_street: vec![Vec::new()] }
    }

    pub fn record(&mut self, street: Street, action: AbstractAction) {
        let idx = street as usize;
        while self.by_street.len() <= idx {
            self.by_street.push(Vec::new());
        }
        self.by_street[idx].push(action);
    }

    pub fn on(&self, street: Street) -> &[AbstractAction] {
        self.by_street.get(street as usize).map(Vec::as_slice).unwrap_or(&[])
    }

    fn encode(&self, f: &mut String) {
        for (i, segment) in self.by_street.iter().enumerate() {
            if i > 0 {
                f.push('/');
            }
            for action in segment {
                match action {
                    AbstractAction::Fold => f.push('F'),
                    AbstractAction::CheckCall => f.push('X'),
                    AbstractAction::AllIn => f.push('J'),
                    AbstractAction::Raise(crate::abstraction::RaiseSize(num, den)) => {
                        let _ = write!(f, "R{num}:{den}");
                    }
                }
            }
        }
    }
}

/// a canonical, serialization-stable infoset identifier. Construction is
/// the only place street/bucket/history get folded together, so the
/// format lives in exactly one place.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct InfoSetKey(String);

impl InfoSetKey {
    pub fn new(street: Street, bucket: BucketId, history: &ActionHistory) -> Self {
        let mut s = String::with_capacity(24);
        let _ = write!(s, "{}:{}:", street as u8, bucket);
        history.encode(&mut s);
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for InfoSetKey {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abstraction::RaiseSize;

    #[test]
    fn identical_street_bucket_history_share_a_key() {
        let mut h1 = ActionHistory::new();
        h1.record(Street::Pref, AbstractAction::CheckCall);
        let mut h2 = ActionHistory::new();
        h2.record(Street::Pref, AbstractAction::CheckCall);
        assert_eq!(InfoSetKey::new(Street::Pref, 7, &h1), InfoSetKey::new(Street::Pref, 7, &h2));
    }

    #[test]
    fn different_bucket_changes_key() {
        let h = ActionHistory::new();
        assert_ne!(InfoSetKey::new(Street::Pref, 1, &h), InfoSetKey::new(Street::Pref, 2, &h));
    }

    #[test]
    fn distinct_raise_sizes_on_same_street_produce_distinct_keys() {
        let mut h1 = ActionHistory::new();
        h1.record(Street::Flop, AbstractAction::Raise(RaiseSize(1, 2)));
        let mut h2 = ActionHistory::new();
        h2.record(Street::Flop, AbstractAction::Raise(RaiseSize(1, 1)));
        assert_ne!(InfoSetKey::new(Street::Flop, 7, &h1), InfoSetKey::new(Street::Flop, 7, &h2));
    }

    #[test]
    fn history_is_segmented_by_street() {
        let mut h = ActionHistory::new();
        h.record(Street::Pref, AbstractAction::CheckCall);
        h.record(Street::Flop, AbstractAction::Raise(RaiseSize(1, 2)));
        assert_eq!(h.on(Street::Pref).len(), 1);
        assert_eq!(h.on(Street::Flop).len(), 1);
        assert_eq!(h.on(Street::Turn).len(), 0);
    }

    #[test]
    fn key_is_stable_string_not_pointer_derived() {
        let h = ActionHistory::new();
        let key = InfoSetKey::new(Street::Rive, 42, &h);
        let serialized = serde_json::to_string(&key).unwrap();
        let back: InfoSetKey = serde_json::from_str(&serialized).unwrap();
        assert_eq!(key, back);
    }
}
