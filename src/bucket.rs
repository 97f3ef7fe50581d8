//! The card-abstraction bucketing function is treated as a fixed external
//! collaborator: the solver never trains it, only consumes it through the
//! `Bucketer` trait and embeds its fingerprint in every checkpoint so a
//! store can never be resumed against a different abstraction.

use crate::cards::board::Board;
use crate::cards::hole::Hole;
use crate::cards::street::Street;
use serde::{Deserialize, Serialize};

pub type BucketId = u32;

/// identifies which card abstraction produced a store's buckets. Compared
/// by value on checkpoint load; any field mismatch is a fatal, unrecoverable
/// error since regrets trained under one abstraction are meaningless under
/// another.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BucketFingerprint {
    pub k_preflop: u32,
    pub k_flop: u32,
    pub k_turn: u32,
    pub k_river: u32,
    pub num_samples: u32,
    pub seed: u64,
}

impl Default for BucketFingerprint {
    fn default() -> Self {
        Self {
            k_preflop: 169,
            k_flop: 128,
            k_turn: 144,
            k_river: 101,
            num_samples: 1,
            seed: 0,
        }
    }
}

/// a deterministic, total `(street, hole, board) -> bucket id` function.
pub trait Bucketer {
    fn fingerprint(&self) -> BucketFingerprint;
    fn bucket(&self, street: Street, hole: Hole, board: &Board) -> BucketId;
}

/// the simplest bucketer that satisfies the contract: one bucket per
/// canonical (street, hole) pair, ignoring the board's fine structure beyond
/// street. Adequate for tests and for abstractions where a richer
/// equity/k-means bucketer (out of scope for this crate) has not been wired
/// in; `fingerprint().seed` distinguishes it from a production bucketer.
pub struct IdentityBucketer {
    fingerprint: BucketFingerprint,
}

impl IdentityBucketer {
    pub fn new(fingerprint: BucketFingerprint) -> Self {
        Self { fingerprint }
    }
}

impl Bucketer for IdentityBucketer {
    fn fingerprint(&self) -> BucketFingerprint {
        self.fingerprint
    }

    fn bucket(&self, street: Street, hole: Hole, _board: &Board) -> BucketId {
        let [a, b] = hole.cards();
        let hash = (u8::from(a) as u32) * 64 + (u8::from(b) as u32);
        (street as u32) * 4096 + hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::card::Card;

    #[test]
    fn bucket_is_deterministic() {
        let bucketer = IdentityBucketer::new(BucketFingerprint::default());
        let hole = Hole::new(Card::parse("Ah").unwrap(), Card::parse("Kd").unwrap());
        let board = Board::new();
        let a = bucketer.bucket(Street::Pref, hole, &board);
        let b = bucketer.bucket(Street::Pref, hole, &board);
        assert_eq!(a, b);
    }

    #[test]
    fn fingerprints_compare_by_value() {
        let a = BucketFingerprint::default();
        let b = BucketFingerprint::default();
        assert_eq!(a, b);
        let c = BucketFingerprint { seed: 1, ..a };
        assert_ne!(a, c);
    }
}
