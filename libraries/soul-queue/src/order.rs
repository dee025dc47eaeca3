//! Play order management
//!
//! Keeps the queue in insertion order and a separate permutation that
//! decides what actually plays next:
//!
//! ```text
//! Queue:    [A, B, C, D, E]      (insertion order, never reordered)
//! Order:    [0, 1, 2, 4, 3]      (play sequence, indexes into Queue)
//! Position:        ^             (index into Order)
//! ```
//!
//! Shuffle only ever permutes the part of the order that has not been played
//! yet, so the current track never moves out from under the listener.

use crate::error::{PlaybackError, Result};
use crate::shuffle::shuffle_from;
use crate::types::{LoopMode, QueueItem};
use rand::Rng;

/// Queue items plus the permutation they are played in
#[derive(Debug, Clone, Default)]
pub struct PlayOrder {
    /// Items in insertion order
    items: Vec<QueueItem>,

    /// Permutation of `0..items.len()`
    order: Vec<usize>,

    /// Index into `order`
    position: usize,
}

impl PlayOrder {
    /// Create an empty order
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all items; order becomes identity and position resets to 0
    pub fn set_queue(&mut self, items: Vec<QueueItem>) {
        self.order = (0..items.len()).collect();
        self.items = items;
        self.position = 0;
    }

    /// Append an item
    ///
    /// The new item always goes to the very end of the play order, even when
    /// the rest of the order is shuffled.
    pub fn append(&mut self, item: QueueItem) {
        self.items.push(item);
        self.order.push(self.items.len() - 1);
    }

    /// Shuffle everything after the current track
    ///
    /// When `active` (something is or was playing) the entries up to and
    /// including the current position stay put; otherwise the whole order is
    /// shuffled.
    pub fn enable_shuffle<R: Rng + ?Sized>(&mut self, active: bool, rng: &mut R) {
        let from = if active { self.position + 1 } else { 0 };
        shuffle_from(&mut self.order, from, rng);
    }

    /// Restore insertion order
    ///
    /// When `active`, the position follows the current track to its original
    /// index so playback continues with the same item.
    pub fn disable_shuffle(&mut self, active: bool) {
        let current = self.order.get(self.position).copied();
        self.order = (0..self.items.len()).collect();

        if active {
            if let Some(queue_index) = current {
                // Identity order: the queue index is its own position
                self.position = queue_index;
            }
        }
    }

    /// Position that plays after `position` under `loop_mode`
    ///
    /// `SingleTrack` repetition is the scheduler's business; here it behaves
    /// like `Off`.
    pub fn successor(&self, position: usize, loop_mode: LoopMode) -> Option<usize> {
        if self.order.is_empty() {
            return None;
        }
        let next = position + 1;
        if next < self.order.len() {
            Some(next)
        } else if loop_mode == LoopMode::EntireQueue {
            Some(0)
        } else {
            None
        }
    }

    /// Move to `position`
    pub fn set_position(&mut self, position: usize) -> Result<()> {
        if position >= self.order.len() {
            return Err(PlaybackError::IndexOutOfBounds(position));
        }
        self.position = position;
        Ok(())
    }

    /// Current position (index into the order)
    pub fn position(&self) -> usize {
        self.position
    }

    /// The play order as queue indices
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Queue index played at `position`
    pub fn queue_index(&self, position: usize) -> Option<usize> {
        self.order.get(position).copied()
    }

    /// Item played at `position`
    pub fn item_at(&self, position: usize) -> Option<&QueueItem> {
        self.queue_index(position).and_then(|i| self.items.get(i))
    }

    /// Item at the current position
    pub fn current_item(&self) -> Option<&QueueItem> {
        self.item_at(self.position)
    }

    /// Owned copies of all items, in play order
    pub fn items_in_play_order(&self) -> Vec<QueueItem> {
        self.order.iter().map(|&i| self.items[i].clone()).collect()
    }

    /// Number of items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
