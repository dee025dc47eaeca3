//! Notification hub
//!
//! Fan-out of engine state to subscribers. Each kind of notification is an
//! independent topic:
//! - Play state (`bool`)
//! - Queue contents, in play order
//! - Current track
//! - Progress snapshots
//! - Shuffle state (replayed on subscribe)
//! - Loop mode (replayed on subscribe)
//!
//! Every subscriber receives its own clone of each value, so nothing a
//! subscriber does can reach engine state.

use crate::types::{LoopMode, ProgressSnapshot, QueueItem};
use tokio::sync::mpsc;

/// Receiving end of one subscription
///
/// Dropping it (or calling [`unsubscribe`](Self::unsubscribe)) detaches it
/// from the hub; the hub notices on its next emission.
#[derive(Debug)]
pub struct Subscription<T> {
    rx: mpsc::UnboundedReceiver<T>,
}

impl<T> Subscription<T> {
    /// Wait for the next value
    ///
    /// Returns `None` once the engine has been dropped.
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Next value if one is already queued
    pub fn try_recv(&mut self) -> Option<T> {
        self.rx.try_recv().ok()
    }

    /// All values queued so far
    pub fn drain(&mut self) -> Vec<T> {
        let mut values = Vec::new();
        while let Ok(value) = self.rx.try_recv() {
            values.push(value);
        }
        values
    }

    /// Stop receiving
    pub fn unsubscribe(mut self) {
        self.rx.close();
    }
}

/// One topic and its subscribers
#[derive(Debug)]
struct Topic<T> {
    subscribers: Vec<mpsc::UnboundedSender<T>>,
}

impl<T: Clone> Topic<T> {
    fn new() -> Self {
        Self {
            subscribers: Vec::new(),
        }
    }

    fn subscribe(&mut self) -> Subscription<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        Subscription { rx }
    }

    fn subscribe_with_replay(&mut self, current: T) -> Subscription<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        // Cannot fail: we hold the receiver
        let _ = tx.send(current);
        self.subscribers.push(tx);
        Subscription { rx }
    }

    fn emit(&mut self, value: &T) {
        self.subscribers.retain(|tx| tx.send(value.clone()).is_ok());
    }

    fn subscriber_count(&mut self) -> usize {
        self.subscribers.retain(|tx| !tx.is_closed());
        self.subscribers.len()
    }
}

/// Subscriber registry for all engine notifications
#[derive(Debug)]
pub(crate) struct NotificationHub {
    play_state: Topic<bool>,
    queue: Topic<Vec<QueueItem>>,
    current_track: Topic<Option<QueueItem>>,
    progress: Topic<ProgressSnapshot>,
    shuffle: Topic<bool>,
    loop_mode: Topic<LoopMode>,
}

impl NotificationHub {
    pub fn new() -> Self {
        Self {
            play_state: Topic::new(),
            queue: Topic::new(),
            current_track: Topic::new(),
            progress: Topic::new(),
            shuffle: Topic::new(),
            loop_mode: Topic::new(),
        }
    }

    // ===== Subscribe =====

    pub fn subscribe_play_state(&mut self) -> Subscription<bool> {
        self.play_state.subscribe()
    }

    pub fn subscribe_queue(&mut self) -> Subscription<Vec<QueueItem>> {
        self.queue.subscribe()
    }

    pub fn subscribe_current_track(&mut self) -> Subscription<Option<QueueItem>> {
        self.current_track.subscribe()
    }

    pub fn subscribe_progress(&mut self) -> Subscription<ProgressSnapshot> {
        self.progress.subscribe()
    }

    pub fn subscribe_shuffle(&mut self, current: bool) -> Subscription<bool> {
        self.shuffle.subscribe_with_replay(current)
    }

    pub fn subscribe_loop_mode(&mut self, current: LoopMode) -> Subscription<LoopMode> {
        self.loop_mode.subscribe_with_replay(current)
    }

    // ===== Emit =====

    pub fn play_state_changed(&mut self, playing: bool) {
        self.play_state.emit(&playing);
    }

    pub fn queue_changed(&mut self, items: Vec<QueueItem>) {
        self.queue.emit(&items);
    }

    pub fn current_track_changed(&mut self, item: Option<QueueItem>) {
        self.current_track.emit(&item);
    }

    pub fn progress_changed(&mut self, snapshot: &ProgressSnapshot) {
        self.progress.emit(snapshot);
    }

    pub fn shuffle_changed(&mut self, enabled: bool) {
        self.shuffle.emit(&enabled);
    }

    pub fn loop_mode_changed(&mut self, mode: LoopMode) {
        self.loop_mode.emit(&mode);
    }

    /// Live progress subscribers (prunes detached ones)
    pub fn progress_subscriber_count(&mut self) -> usize {
        self.progress.subscriber_count()
    }
}
