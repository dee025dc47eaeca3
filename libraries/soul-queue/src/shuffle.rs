//! Shuffle for play orders
//!
//! Fisher-Yates over the unplayed tail of an order, leaving the head in place

use rand::seq::SliceRandom;
use rand::Rng;

/// Shuffle `order[from..]` in place
///
/// Every permutation of the tail is equally likely; `order[..from]` is never
/// touched. A `from` past the end is a no-op.
pub fn shuffle_from<R: Rng + ?Sized>(order: &mut [usize], from: usize, rng: &mut R) {
    if from >= order.len() {
        return;
    }
    order[from..].shuffle(rng);
}
