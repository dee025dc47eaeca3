//! Gapless transitions
//!
//! While the current track plays, the engine creates a silent handle for the
//! successor once the track is close to its end (or past its midpoint), and
//! primes it with a muted play/pause so the first audible `play` returns
//! without buffering. When the current track ends, the preloaded handle is
//! promoted in place of a cold start.
//!
//! ```text
//!   current: ──────────────────────────|end
//!   next:               create ─ ready ─ prime ─ promote ──────────
//! ```

use crate::{
    backend::{MediaHandle, PlaybackBackend},
    engine::{ActiveHandle, PreloadedHandle, QueueEngine},
    error::BackendError,
    types::{is_known_duration, LoopMode, PlaybackState},
};

const FULL_VOLUME: f32 = 1.0;

/// How far before its duration a handle may stop and still count as ended
const END_TOLERANCE_SECS: f64 = 0.5;

/// Muted play, then pause and rewind
///
/// Leaves the handle paused at 0 with its volume restored, whether or not
/// `play` succeeded.
async fn silent_prime(handle: &mut dyn MediaHandle) -> Result<(), BackendError> {
    let volume = handle.volume();
    handle.set_volume(0.0);
    let result = handle.play().await;
    handle.pause();
    handle.seek(0.0);
    handle.set_volume(volume);
    result
}

impl<B: PlaybackBackend> QueueEngine<B> {
    /// Whether a track at `time` of `duration` should have its successor
    /// preloaded
    pub(crate) fn in_preload_window(&self, time: f64, duration: f64) -> bool {
        let remaining = duration - time;
        remaining < self.config.preload_lead_secs || time > duration / 2.0
    }

    /// Preload the successor if the current track has entered the window
    pub(crate) fn maybe_schedule_preload(&mut self) {
        if !self.is_playing || self.next.is_some() {
            return;
        }
        let Some(current) = self.current.as_ref() else {
            return;
        };
        let duration = current.handle.duration();
        if !is_known_duration(duration) {
            return;
        }
        if self.in_preload_window(current.handle.current_time(), duration) {
            self.schedule_preload();
        }
    }

    /// Schedule or cancel the preload after a seek to `time`
    pub(crate) fn reevaluate_preload(&mut self, time: f64, duration: f64) {
        if self.in_preload_window(time, duration) {
            if self.is_playing {
                self.schedule_preload();
            }
        } else {
            self.discard_preload("seeked out of preload window");
        }
    }

    fn schedule_preload(&mut self) {
        if self.next.is_some() || self.loop_mode == LoopMode::SingleTrack {
            return;
        }
        let Some(position) = self.order.successor(self.order.position(), self.loop_mode) else {
            return;
        };
        let (Some(queue_index), Some(item)) =
            (self.order.queue_index(position), self.order.item_at(position))
        else {
            return;
        };
        if self.preload_failed == Some((position, queue_index)) {
            return;
        }
        let url = item.url.clone();

        match self.create_handle(&url) {
            Ok((id, handle)) => {
                tracing::debug!("Preloading {} for position {} as {}", url, position, id);
                self.next = Some(PreloadedHandle {
                    id,
                    handle,
                    position,
                    queue_index,
                    primed: false,
                });
            }
            Err(err) => {
                tracing::warn!("Preload of {} failed: {}", url, err);
                self.preload_failed = Some((position, queue_index));
            }
        }
    }

    /// Drop the preloaded handle if it no longer matches the successor
    ///
    /// Called whenever the order or loop mode changes.
    pub(crate) fn reconcile_preload(&mut self) {
        let Some(next) = self.next.as_ref() else {
            return;
        };

        let expected = if self.loop_mode == LoopMode::SingleTrack {
            None
        } else {
            self.order.successor(self.order.position(), self.loop_mode)
        };
        let still_valid = expected == Some(next.position)
            && self.order.queue_index(next.position) == Some(next.queue_index);

        if !still_valid {
            self.discard_preload("successor changed");
        }
    }

    /// Prime the preloaded handle once it can play through
    pub(crate) async fn prime_preload(&mut self) {
        if !self.config.prime_next {
            return;
        }
        let Some(next) = self.next.as_mut() else {
            return;
        };
        if next.primed {
            return;
        }

        let id = next.id;
        let target = (next.position, next.queue_index);
        let result = silent_prime(next.handle.as_mut()).await;

        match result {
            Ok(()) => {
                if let Some(next) = self.next.as_mut() {
                    next.primed = true;
                }
                tracing::debug!("Primed {}", id);
            }
            Err(BackendError::UnsupportedFormat(msg)) => {
                tracing::warn!("Preloaded {} cannot be decoded: {}", id, msg);
                self.discard_preload("unsupported format");
                // Not retried for this track; the end of track cold-starts
                self.preload_failed = Some(target);
            }
            Err(err) => {
                // Still usable; promotion runs the readiness guard again
                tracing::warn!("Priming {} failed: {}", id, err);
            }
        }
    }

    /// React to the current track ending
    ///
    /// An end queued before a pause is dropped. One queued before a seek back
    /// resumes the handle from where the seek left it.
    pub(crate) async fn handle_track_end(&mut self) {
        if !self.is_playing {
            tracing::debug!("Ignoring track end while paused");
            return;
        }
        let Some(current) = self.current.as_mut() else {
            return;
        };
        let duration = current.handle.duration();
        let time = current.handle.current_time();
        if is_known_duration(duration) && duration - time > END_TOLERANCE_SECS {
            tracing::debug!("Stale track end at {:.2}s of {:.2}s, resuming", time, duration);
            let result = current.handle.play().await;
            if let Err(err) = result {
                tracing::warn!("Failed to resume after seek: {}", err);
                self.set_state(PlaybackState::Paused);
                self.set_playing(false);
            }
            return;
        }

        let position = self.order.position();

        if self.loop_mode == LoopMode::SingleTrack {
            self.replay_current().await;
            return;
        }

        match self.order.successor(position, self.loop_mode) {
            Some(target) => self.advance_to(target).await,
            None => {
                tracing::info!("Reached end of queue");
                self.discard_preload("end of queue");
                self.set_state(PlaybackState::Paused);
                self.set_playing(false);
            }
        }
    }

    async fn replay_current(&mut self) {
        let Some(current) = self.current.as_mut() else {
            return;
        };
        current.handle.seek(0.0);
        let result = current.handle.play().await;

        match result {
            Ok(()) => {
                tracing::debug!("Looping position {}", self.order.position());
                self.set_state(PlaybackState::Playing);
            }
            Err(err) => {
                tracing::warn!("Failed to restart looping track: {}", err);
                self.set_state(PlaybackState::Paused);
                self.set_playing(false);
            }
        }
    }

    /// Continue at `target`, promoting the preload when it matches
    async fn advance_to(&mut self, target: usize) {
        let preload = self.next.take();
        let matches = preload.as_ref().is_some_and(|next| {
            next.position == target && self.order.queue_index(target) == Some(next.queue_index)
        });

        match preload {
            Some(next) if matches => {
                if let Err(err) = self.promote(next, target).await {
                    tracing::warn!("Promotion to position {} failed: {}", target, err);
                    self.cold_start(target).await;
                }
            }
            Some(mut stale) => {
                stale.handle.pause();
                tracing::debug!("Preloaded {} does not match position {}", stale.id, target);
                self.cold_start(target).await;
            }
            None => {
                tracing::debug!("Nothing preloaded, cold-starting position {}", target);
                self.cold_start(target).await;
            }
        }
    }

    async fn promote(&mut self, next: PreloadedHandle, target: usize) -> Result<(), BackendError> {
        let PreloadedHandle {
            id,
            mut handle,
            queue_index,
            ..
        } = next;

        // Readiness guard: primed or not, a muted round trip must succeed
        // before the handle takes over
        if self.config.prime_next {
            silent_prime(handle.as_mut()).await?;
        }

        self.order
            .set_position(target)
            .map_err(|err| BackendError::Failed(err.to_string()))?;
        self.preload_failed = None;

        // Events from the outgoing handle are stale from here on
        if let Some(mut outgoing) = self.current.take() {
            outgoing.handle.pause();
            tracing::trace!("Released {}", outgoing.id);
        }

        handle.seek(0.0);
        handle.set_volume(FULL_VOLUME);
        self.set_state(PlaybackState::Loading);
        let current = self.current.insert(ActiveHandle {
            id,
            handle,
            queue_index,
        });
        current.handle.play().await?;

        self.set_state(PlaybackState::Playing);
        tracing::info!("Promoted {} to position {}", id, target);
        self.notify_current_track();
        self.notify_queue();
        self.sync_progress();
        Ok(())
    }

    /// Fresh handle for `target`; stops playback if that fails too
    async fn cold_start(&mut self, target: usize) {
        if !self.switch_to_track(target) {
            self.set_playing(false);
            return;
        }
        if let Err(err) = self.start_current().await {
            tracing::warn!("Cold start of position {} failed: {}", target, err);
            self.set_state(PlaybackState::Paused);
            self.set_playing(false);
        }
    }
}
