//! Queue engine - playback scheduling state machine
//!
//! Owns the queue, the play order, the current and preloaded handles, and the
//! notification hub. Every mutation goes through `&mut self`, so exactly one
//! operation runs at a time; backend callbacks arrive as [`EngineInput`]
//! values on the engine's input channel and are dispatched one by one.
//!
//! Backend events carry the [`HandleId`] of their source. Anything that does
//! not name the current (or preloaded) handle is stale and is dropped.

use crate::{
    backend::{EngineInput, HandleEvent, HandleEventKind, HandleEvents, HandleId, MediaHandle, PlaybackBackend},
    error::{BackendError, PlaybackError, Result},
    events::{NotificationHub, Subscription},
    order::PlayOrder,
    progress::ProgressReporter,
    remote::RemoteCommand,
    types::{is_known_duration, EngineConfig, LoopMode, PlaybackState, ProgressSnapshot, QueueItem},
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Duration;
use tokio::sync::mpsc;

/// `skip_to_previous` restarts the current track once it has played this long
pub const RESTART_THRESHOLD_SECS: f64 = 5.0;

/// The handle currently connected to output
pub(crate) struct ActiveHandle {
    pub id: HandleId,
    pub handle: Box<dyn MediaHandle>,
    /// Queue index the handle was created for
    pub queue_index: usize,
}

/// A silent handle for the upcoming track
pub(crate) struct PreloadedHandle {
    pub id: HandleId,
    pub handle: Box<dyn MediaHandle>,
    /// Order position it was scheduled for
    pub position: usize,
    pub queue_index: usize,
    pub primed: bool,
}

/// Observable state of the preload slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreloadStatus {
    pub handle: HandleId,
    /// Order position the preloaded item will play at
    pub position: usize,
    /// Whether silent priming has completed
    pub primed: bool,
}

/// Playback-queue engine
///
/// Orchestrates:
/// - Queue and play order (shuffle with continuity, loop-aware successor)
/// - Current handle lifecycle (lazy creation, play/pause, seek)
/// - Gapless transitions via a preloaded next handle
/// - Progress reporting while playing
/// - Notifications to subscribers
pub struct QueueEngine<B: PlaybackBackend> {
    pub(crate) backend: B,
    pub(crate) config: EngineConfig,

    // Queue and order
    pub(crate) order: PlayOrder,
    rng: StdRng,

    // Playback mode
    pub(crate) is_playing: bool,
    shuffle: bool,
    pub(crate) loop_mode: LoopMode,
    state: PlaybackState,

    // Handles
    pub(crate) current: Option<ActiveHandle>,
    pub(crate) next: Option<PreloadedHandle>,
    /// Successor (position, queue index) whose preload failed for the
    /// current track
    pub(crate) preload_failed: Option<(usize, usize)>,
    next_handle_id: u64,

    // Notifications
    pub(crate) hub: NotificationHub,
    progress: ProgressReporter,

    // Backend events and timer ticks
    inputs_tx: mpsc::UnboundedSender<EngineInput>,
    inputs_rx: mpsc::UnboundedReceiver<EngineInput>,
}

impl<B: PlaybackBackend> QueueEngine<B> {
    /// Create an engine with an empty queue
    pub fn new(backend: B, config: EngineConfig) -> Self {
        let (inputs_tx, inputs_rx) = mpsc::unbounded_channel();
        let rng = match config.shuffle_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let progress = ProgressReporter::new(
            Duration::from_millis(config.progress_interval_ms),
            inputs_tx.clone(),
        );

        Self {
            backend,
            config,
            order: PlayOrder::new(),
            rng,
            is_playing: false,
            shuffle: false,
            loop_mode: LoopMode::Off,
            state: PlaybackState::Idle,
            current: None,
            next: None,
            preload_failed: None,
            next_handle_id: 0,
            hub: NotificationHub::new(),
            progress,
            inputs_tx,
            inputs_rx,
        }
    }

    // ===== Queue Management =====

    /// Replace the whole queue
    ///
    /// Stops playback, drops both handles and resets shuffle and loop.
    pub fn replace_queue(&mut self, items: Vec<QueueItem>) {
        self.teardown_handles();
        self.order.set_queue(items);

        if self.shuffle {
            self.shuffle = false;
            self.hub.shuffle_changed(false);
        }
        if self.loop_mode != LoopMode::Off {
            self.loop_mode = LoopMode::Off;
            self.hub.loop_mode_changed(LoopMode::Off);
        }
        self.set_playing(false);

        tracing::info!("Queue replaced ({} items)", self.order.len());
        self.notify_queue();
        self.notify_current_track();
    }

    /// Append one item at the end of the play order
    pub fn append_track(&mut self, item: QueueItem) {
        tracing::debug!("Appending {}", item.url);
        self.order.append(item);

        self.notify_queue();
        if self.order.len() == 1 {
            self.notify_current_track();
        }
        self.reconcile_preload();
    }

    /// Copies of all items in play order
    pub fn fetch_queue(&self) -> Vec<QueueItem> {
        self.order.items_in_play_order()
    }

    // ===== Playback Control =====

    /// Switch playback on or off (`None` toggles)
    ///
    /// No-op when already in the requested state.
    ///
    /// # Returns
    /// * `Err(PlaybackError::PlaybackBlocked)` - Play intent has been reverted
    /// * `Err(PlaybackError::UnsupportedFormat)` - Play intent is kept
    /// * `Err(PlaybackError::QueueEmpty)` - Nothing to play, nothing changed
    pub async fn toggle_playing(&mut self, playing: Option<bool>) -> Result<()> {
        let target = playing.unwrap_or(!self.is_playing);
        if target == self.is_playing {
            return Ok(());
        }

        if target {
            if self.order.is_empty() {
                return Err(PlaybackError::QueueEmpty);
            }
            self.set_playing(true);
            self.start_current().await
        } else {
            self.pause_handles();
            self.set_playing(false);
            Ok(())
        }
    }

    /// Skip to the next position
    ///
    /// Wraps only under [`LoopMode::EntireQueue`]; at the end otherwise this is
    /// a no-op. Playing continues if it was playing.
    pub async fn skip_to_next(&mut self) -> Result<()> {
        let position = self.order.position();
        match self.order.successor(position, self.loop_mode) {
            Some(target) => self.jump_to(target).await,
            None => {
                tracing::debug!("No track after position {}", position);
                Ok(())
            }
        }
    }

    /// Go to the previous position
    ///
    /// Restarts the current track instead when it has played for at least
    /// [`RESTART_THRESHOLD_SECS`] or it is the first position.
    pub async fn skip_to_previous(&mut self) -> Result<()> {
        let position = self.order.position();
        let elapsed = self
            .current
            .as_ref()
            .map_or(0.0, |current| current.handle.current_time());

        if elapsed >= RESTART_THRESHOLD_SECS || position == 0 {
            self.restart_current();
            return Ok(());
        }

        self.jump_to(position - 1).await
    }

    /// Jump to an order position, keeping the play state
    ///
    /// Out-of-range positions are logged and ignored.
    pub async fn skip_to_index(&mut self, position: usize) -> Result<()> {
        self.jump_to(position).await
    }

    // ===== Shuffle & Loop =====

    /// Turn shuffle on or off (`None` toggles)
    pub fn toggle_shuffle(&mut self, enabled: Option<bool>) {
        let target = enabled.unwrap_or(!self.shuffle);
        if target == self.shuffle {
            return;
        }

        let active = self.playback_active();
        if target {
            self.order.enable_shuffle(active, &mut self.rng);
        } else {
            self.order.disable_shuffle(active);
        }
        self.shuffle = target;
        tracing::info!("Shuffle {}", if target { "enabled" } else { "disabled" });

        // Only possible when nothing has played yet: the slot under the
        // position now holds a different item
        let position = self.order.position();
        if self
            .current
            .as_ref()
            .is_some_and(|current| self.order.queue_index(position) != Some(current.queue_index))
        {
            self.switch_to_track(position);
        }

        self.hub.shuffle_changed(target);
        self.notify_queue();
        self.reconcile_preload();
    }

    /// Set the loop mode (`None` cycles Off → EntireQueue → SingleTrack → Off)
    pub fn toggle_loop(&mut self, mode: Option<LoopMode>) {
        let target = mode.unwrap_or_else(|| self.loop_mode.cycle());
        if target == self.loop_mode {
            return;
        }

        self.loop_mode = target;
        tracing::info!("Loop mode {:?}", target);
        self.hub.loop_mode_changed(target);
        self.reconcile_preload();
    }

    // ===== Seek =====

    /// Seek the current track to `seconds`, clamped to `[0, duration]`
    ///
    /// Returns `false` without doing anything when there is no current handle,
    /// its duration is not known yet, or `seconds` is not finite.
    pub fn seek_to(&mut self, seconds: f64) -> bool {
        let Some(current) = self.current.as_mut() else {
            tracing::debug!("Seek rejected: no active handle");
            return false;
        };

        let duration = current.handle.duration();
        if !is_known_duration(duration) || !seconds.is_finite() {
            tracing::debug!("Seek rejected: duration {} / target {}", duration, seconds);
            return false;
        }

        let target = seconds.clamp(0.0, duration);
        current.handle.seek(target);

        if let Some(snapshot) = ProgressSnapshot::new(target, duration) {
            self.hub.progress_changed(&snapshot);
        }
        self.reevaluate_preload(target, duration);
        true
    }

    /// Seek to a percentage (0-100) of the current track
    pub fn seek_to_percentage(&mut self, percentage: f64) -> bool {
        let Some(duration) = self.current.as_ref().map(|c| c.handle.duration()) else {
            return false;
        };
        if !is_known_duration(duration) || !percentage.is_finite() {
            return false;
        }
        self.seek_to(duration * percentage.clamp(0.0, 100.0) / 100.0)
    }

    /// Seek relative to the current position
    pub fn seek_relative(&mut self, delta: f64) -> bool {
        let Some(now) = self.current.as_ref().map(|c| c.handle.current_time()) else {
            return false;
        };
        self.seek_to(now + delta)
    }

    // ===== Subscriptions =====

    /// `true`/`false` whenever play intent changes
    pub fn subscribe_play_state(&mut self) -> Subscription<bool> {
        self.hub.subscribe_play_state()
    }

    /// Queue contents in play order whenever they or their order change
    pub fn subscribe_queue(&mut self) -> Subscription<Vec<QueueItem>> {
        self.hub.subscribe_queue()
    }

    /// Item at the current position whenever it changes
    pub fn subscribe_current_track(&mut self) -> Subscription<Option<QueueItem>> {
        self.hub.subscribe_current_track()
    }

    /// Progress snapshots, ticking while playing
    ///
    /// Ticks are delivered through the engine's input channel, so a progress
    /// subscriber needs something pumping events ([`run`](Self::run) or the
    /// `process_*` methods). Unsubscribing takes effect at the next pump.
    pub fn subscribe_progress(&mut self) -> Subscription<ProgressSnapshot> {
        let subscription = self.hub.subscribe_progress();
        self.sync_progress();
        subscription
    }

    /// Shuffle state; the current value is delivered immediately
    pub fn subscribe_shuffle(&mut self) -> Subscription<bool> {
        self.hub.subscribe_shuffle(self.shuffle)
    }

    /// Loop mode; the current value is delivered immediately
    pub fn subscribe_loop_mode(&mut self) -> Subscription<LoopMode> {
        self.hub.subscribe_loop_mode(self.loop_mode)
    }

    // ===== State Queries =====

    /// Whether playback is intended to be running
    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    /// Scheduler state
    pub fn playback_state(&self) -> PlaybackState {
        self.state
    }

    pub fn shuffle_enabled(&self) -> bool {
        self.shuffle
    }

    pub fn loop_mode(&self) -> LoopMode {
        self.loop_mode
    }

    /// Current position in the play order
    pub fn position(&self) -> usize {
        self.order.position()
    }

    /// Play order as queue indices
    pub fn order(&self) -> &[usize] {
        self.order.order()
    }

    /// Copy of the item at the current position
    pub fn current_item(&self) -> Option<QueueItem> {
        self.order.current_item().cloned()
    }

    /// Progress of the current handle, if its duration is known
    pub fn progress(&self) -> Option<ProgressSnapshot> {
        let current = self.current.as_ref()?;
        ProgressSnapshot::new(current.handle.current_time(), current.handle.duration())
    }

    pub fn current_handle_id(&self) -> Option<HandleId> {
        self.current.as_ref().map(|current| current.id)
    }

    /// The preload slot, if filled
    pub fn preloaded(&self) -> Option<PreloadStatus> {
        self.next.as_ref().map(|next| PreloadStatus {
            handle: next.id,
            position: next.position,
            primed: next.primed,
        })
    }

    /// Whether the progress timer is running
    pub fn is_progress_running(&self) -> bool {
        self.progress.is_running()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The backend, e.g. to inspect a simulator
    pub fn backend(&self) -> &B {
        &self.backend
    }

    // ===== Event Loop =====

    /// Dispatch every input queued so far, including inputs produced while
    /// dispatching
    ///
    /// Returns the number of inputs processed.
    pub async fn process_pending_events(&mut self) -> usize {
        self.sync_progress();
        let mut processed = 0;
        while let Ok(input) = self.inputs_rx.try_recv() {
            self.dispatch(input).await;
            processed += 1;
        }
        processed
    }

    /// Wait for one input and dispatch it
    pub async fn process_next_event(&mut self) {
        self.sync_progress();
        if let Some(input) = self.inputs_rx.recv().await {
            self.dispatch(input).await;
        }
    }

    /// Drive the engine until `remote` closes
    ///
    /// Interleaves backend events, progress ticks and remote commands on the
    /// calling task.
    pub async fn run(&mut self, mut remote: mpsc::UnboundedReceiver<RemoteCommand>) {
        enum Step {
            Input(EngineInput),
            Remote(Option<RemoteCommand>),
        }

        loop {
            self.sync_progress();
            let step = tokio::select! {
                Some(input) = self.inputs_rx.recv() => Step::Input(input),
                command = remote.recv() => Step::Remote(command),
            };

            match step {
                Step::Input(input) => self.dispatch(input).await,
                Step::Remote(Some(command)) => {
                    if let Err(err) = self.handle_remote_command(command).await {
                        tracing::warn!("Remote command {:?} failed: {}", command, err);
                    }
                }
                Step::Remote(None) => break,
            }
        }
    }

    async fn dispatch(&mut self, input: EngineInput) {
        match input {
            EngineInput::ProgressTick => self.on_progress_tick(),
            EngineInput::Handle(event) => self.on_handle_event(event).await,
        }
    }

    async fn on_handle_event(&mut self, event: HandleEvent) {
        let is_current = self.current_handle_id() == Some(event.handle);
        let is_next = self.next.as_ref().is_some_and(|next| next.id == event.handle);

        if !is_current && !is_next {
            tracing::trace!("Discarding stale {:?} from {}", event.kind, event.handle);
            return;
        }

        match event.kind {
            HandleEventKind::Ended if is_current => self.handle_track_end().await,
            HandleEventKind::TimeProgressed if is_current => self.maybe_schedule_preload(),
            HandleEventKind::ReadyToPlayThrough if is_next => self.prime_preload().await,
            kind => tracing::trace!("Ignoring {:?} from {}", kind, event.handle),
        }
    }

    fn on_progress_tick(&mut self) {
        self.sync_progress();
        if !self.progress.is_running() {
            return;
        }
        if let Some(snapshot) = self.progress() {
            self.hub.progress_changed(&snapshot);
        }
    }

    // ===== Internal: Handles =====

    /// Play the current handle, creating it first if needed
    pub(crate) async fn start_current(&mut self) -> Result<()> {
        if self.current.is_none() {
            self.load_current()?;
        }
        let Some(current) = self.current.as_mut() else {
            return Err(PlaybackError::QueueEmpty);
        };

        let id = current.id;
        self.state = PlaybackState::Loading;
        let result = current.handle.play().await;

        match result {
            Ok(()) => {
                self.set_state(PlaybackState::Playing);
                tracing::debug!("Playing {} at position {}", id, self.order.position());
                self.sync_progress();
                self.maybe_schedule_preload();
                Ok(())
            }
            Err(BackendError::Blocked(msg)) => {
                tracing::warn!("Playback of {} blocked: {}", id, msg);
                self.set_state(PlaybackState::Paused);
                self.set_playing(false);
                Err(PlaybackError::PlaybackBlocked(msg))
            }
            Err(err) => {
                tracing::warn!("Playback of {} failed: {}", id, err);
                self.set_state(PlaybackState::Paused);
                Err(err.into())
            }
        }
    }

    /// Create the handle for the current position (not playing)
    fn load_current(&mut self) -> Result<()> {
        let position = self.order.position();
        let (Some(queue_index), Some(item)) =
            (self.order.queue_index(position), self.order.current_item())
        else {
            return Err(PlaybackError::QueueEmpty);
        };
        let url = item.url.clone();

        let (id, handle) = self.create_handle(&url)?;
        tracing::debug!("Loaded {} as {}", url, id);
        self.current = Some(ActiveHandle {
            id,
            handle,
            queue_index,
        });
        self.set_state(PlaybackState::Paused);
        Ok(())
    }

    pub(crate) fn create_handle(
        &mut self,
        url: &str,
    ) -> std::result::Result<(HandleId, Box<dyn MediaHandle>), BackendError> {
        let id = HandleId(self.next_handle_id);
        self.next_handle_id += 1;
        let events = HandleEvents::new(id, self.inputs_tx.clone());
        let handle = self.backend.create_handle(url, events)?;
        Ok((id, handle))
    }

    /// Move to `position` with a fresh, paused current handle
    ///
    /// Returns `false` (after logging) for an out-of-range position.
    pub(crate) fn switch_to_track(&mut self, position: usize) -> bool {
        if let Err(err) = self.order.set_position(position) {
            tracing::warn!("Ignoring track switch: {}", err);
            return false;
        }

        self.teardown_handles();
        if let Err(err) = self.load_current() {
            tracing::warn!("Failed to load position {}: {}", position, err);
        }

        let duration = self
            .current
            .as_ref()
            .map_or(f64::NAN, |current| current.handle.duration());
        self.hub.progress_changed(&ProgressSnapshot::zero(duration));
        self.notify_current_track();
        self.notify_queue();
        true
    }

    async fn jump_to(&mut self, position: usize) -> Result<()> {
        let was_playing = self.is_playing;
        if !self.switch_to_track(position) {
            return Ok(());
        }
        if was_playing {
            self.start_current().await
        } else {
            Ok(())
        }
    }

    /// Rewind the current handle to 0
    pub(crate) fn restart_current(&mut self) {
        let Some(current) = self.current.as_mut() else {
            return;
        };
        current.handle.seek(0.0);
        let duration = current.handle.duration();
        self.hub.progress_changed(&ProgressSnapshot::zero(duration));
        if is_known_duration(duration) {
            self.reevaluate_preload(0.0, duration);
        }
    }

    fn pause_handles(&mut self) {
        if let Some(current) = self.current.as_mut() {
            current.handle.pause();
            self.state = PlaybackState::Paused;
        }
        if let Some(next) = self.next.as_mut() {
            next.handle.pause();
        }
    }

    /// Drop both handles
    fn teardown_handles(&mut self) {
        if let Some(mut current) = self.current.take() {
            current.handle.pause();
            tracing::trace!("Released {}", current.id);
        }
        self.discard_preload("teardown");
        self.preload_failed = None;
        self.set_state(PlaybackState::Idle);
        self.sync_progress();
    }

    pub(crate) fn discard_preload(&mut self, reason: &str) {
        if let Some(mut next) = self.next.take() {
            next.handle.pause();
            tracing::debug!("Discarded preloaded {} ({})", next.id, reason);
        }
    }

    /// Something is or was playing in this session
    fn playback_active(&self) -> bool {
        self.is_playing
            || self.order.position() > 0
            || self
                .current
                .as_ref()
                .is_some_and(|current| current.handle.current_time() > 0.0)
    }

    // ===== Internal: State & Notifications =====

    pub(crate) fn set_playing(&mut self, playing: bool) {
        if self.is_playing == playing {
            return;
        }
        self.is_playing = playing;
        self.hub.play_state_changed(playing);
        self.sync_progress();
    }

    pub(crate) fn set_state(&mut self, state: PlaybackState) {
        if self.state != state {
            tracing::trace!("State {:?} -> {:?}", self.state, state);
            self.state = state;
        }
    }

    /// Start or stop the progress timer to match play state and subscribers
    pub(crate) fn sync_progress(&mut self) {
        let should_run = self.is_playing
            && self.current.is_some()
            && self.hub.progress_subscriber_count() > 0;

        if should_run {
            self.progress.start();
        } else {
            self.progress.stop();
        }
    }

    pub(crate) fn notify_queue(&mut self) {
        let items = self.order.items_in_play_order();
        self.hub.queue_changed(items);
    }

    pub(crate) fn notify_current_track(&mut self) {
        let item = self.order.current_item().cloned();
        self.hub.current_track_changed(item);
    }
}
