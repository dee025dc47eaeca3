//! Simulated playback backend
//!
//! Deterministic in-memory backend with a virtual clock. Nothing moves until
//! [`SimulatedBackend::advance`] is called, which makes it suitable for tests
//! and for the CLI harness.
//!
//! `SimulatedBackend` is a cheap, clonable controller: give one clone to the
//! engine and keep another to drive time and inspect handles.

use crate::backend::{HandleEventKind, HandleEvents, HandleId, MediaHandle, PlaybackBackend};
use crate::error::BackendError;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Track length used when no per-URL duration is set
pub const DEFAULT_SIM_DURATION_SECS: f64 = 180.0;

/// Snapshot of one simulated handle
#[derive(Debug, Clone, PartialEq)]
pub struct SimHandleInfo {
    pub url: String,
    pub current_time: f64,
    pub duration: f64,
    pub playing: bool,
    pub volume: f32,
    /// Number of successful `play` calls
    pub play_calls: usize,
    /// Dropped by the engine
    pub released: bool,
}

#[derive(Debug)]
struct SimHandle {
    info: SimHandleInfo,
    events: HandleEvents,
}

#[derive(Debug)]
struct SimState {
    default_duration: f64,
    durations: HashMap<String, f64>,
    unsupported: HashSet<String>,
    autoplay_blocked: bool,
    auto_ready: bool,
    handles: BTreeMap<HandleId, SimHandle>,
}

impl Default for SimState {
    fn default() -> Self {
        Self {
            default_duration: DEFAULT_SIM_DURATION_SECS,
            durations: HashMap::new(),
            unsupported: HashSet::new(),
            autoplay_blocked: false,
            auto_ready: true,
            handles: BTreeMap::new(),
        }
    }
}

/// Backend whose handles advance only on [`advance`](Self::advance)
#[derive(Debug, Clone, Default)]
pub struct SimulatedBackend {
    shared: Arc<Mutex<SimState>>,
}

impl SimulatedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend whose tracks last `seconds` unless overridden per URL
    pub fn with_default_duration(seconds: f64) -> Self {
        let backend = Self::default();
        backend.lock().default_duration = seconds;
        backend
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ===== Controls =====

    /// Duration reported by handles for `url` (`NaN` = unknown)
    pub fn set_duration(&self, url: impl Into<String>, seconds: f64) {
        self.lock().durations.insert(url.into(), seconds);
    }

    /// Refuse every `play` with [`BackendError::Blocked`]
    pub fn set_autoplay_blocked(&self, blocked: bool) {
        self.lock().autoplay_blocked = blocked;
    }

    /// Fail every `play` for `url` with [`BackendError::UnsupportedFormat`]
    pub fn mark_unsupported(&self, url: impl Into<String>) {
        self.lock().unsupported.insert(url.into());
    }

    /// Emit `ReadyToPlayThrough` as soon as a handle is created (default: on)
    pub fn set_auto_ready(&self, auto_ready: bool) {
        self.lock().auto_ready = auto_ready;
    }

    /// Move the clock forward by `seconds`
    ///
    /// Every playing handle advances, reports `TimeProgressed`, and reports
    /// `Ended` (after stopping at its duration) when it reaches the end.
    pub fn advance(&self, seconds: f64) {
        let mut state = self.lock();
        for handle in state.handles.values_mut() {
            let info = &mut handle.info;
            if !info.playing || info.released {
                continue;
            }

            info.current_time += seconds;
            let finished = info.duration.is_finite() && info.current_time >= info.duration;
            if finished {
                info.current_time = info.duration;
                info.playing = false;
            }

            handle.events.emit(HandleEventKind::TimeProgressed);
            if finished {
                handle.events.emit(HandleEventKind::Ended);
            }
        }
    }

    /// Emit `kind` from handle `id`, released or not
    pub fn emit(&self, id: HandleId, kind: HandleEventKind) {
        if let Some(handle) = self.lock().handles.get(&id) {
            handle.events.emit(kind);
        }
    }

    // ===== Inspection =====

    pub fn handle(&self, id: HandleId) -> Option<SimHandleInfo> {
        self.lock().handles.get(&id).map(|handle| handle.info.clone())
    }

    /// All handles ever created, oldest first
    pub fn handles(&self) -> Vec<(HandleId, SimHandleInfo)> {
        self.lock()
            .handles
            .iter()
            .map(|(id, handle)| (*id, handle.info.clone()))
            .collect()
    }

    /// Handles currently producing (audible or muted) output
    pub fn playing_handles(&self) -> Vec<HandleId> {
        self.lock()
            .handles
            .iter()
            .filter(|(_, handle)| handle.info.playing)
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn created_count(&self) -> usize {
        self.lock().handles.len()
    }

    /// Handles not yet released by the engine
    pub fn live_count(&self) -> usize {
        self.lock()
            .handles
            .values()
            .filter(|handle| !handle.info.released)
            .count()
    }
}

impl PlaybackBackend for SimulatedBackend {
    fn create_handle(
        &mut self,
        url: &str,
        events: HandleEvents,
    ) -> Result<Box<dyn MediaHandle>, BackendError> {
        let mut state = self.lock();
        let id = events.handle();
        let duration = state
            .durations
            .get(url)
            .copied()
            .unwrap_or(state.default_duration);

        if state.auto_ready {
            events.emit(HandleEventKind::ReadyToPlayThrough);
        }
        state.handles.insert(
            id,
            SimHandle {
                info: SimHandleInfo {
                    url: url.to_string(),
                    current_time: 0.0,
                    duration,
                    playing: false,
                    volume: 1.0,
                    play_calls: 0,
                    released: false,
                },
                events,
            },
        );

        Ok(Box::new(SimulatedMediaHandle {
            id,
            shared: Arc::clone(&self.shared),
        }))
    }
}

/// Handle given to the engine
struct SimulatedMediaHandle {
    id: HandleId,
    shared: Arc<Mutex<SimState>>,
}

impl SimulatedMediaHandle {
    fn with_info<T>(&self, f: impl FnOnce(&mut SimHandleInfo) -> T) -> Option<T> {
        let mut state = self.shared.lock().unwrap_or_else(PoisonError::into_inner);
        state.handles.get_mut(&self.id).map(|handle| f(&mut handle.info))
    }

    fn try_play(&self) -> Result<(), BackendError> {
        let mut state = self.shared.lock().unwrap_or_else(PoisonError::into_inner);
        let blocked = state.autoplay_blocked;
        let SimState {
            unsupported,
            handles,
            ..
        } = &mut *state;
        let Some(handle) = handles.get_mut(&self.id) else {
            return Err(BackendError::Aborted);
        };
        let info = &mut handle.info;

        if unsupported.contains(&info.url) {
            return Err(BackendError::UnsupportedFormat(info.url.clone()));
        }
        if blocked {
            return Err(BackendError::Blocked("user gesture required".to_string()));
        }
        info.playing = true;
        info.play_calls += 1;
        Ok(())
    }
}

#[async_trait]
impl MediaHandle for SimulatedMediaHandle {
    async fn play(&mut self) -> Result<(), BackendError> {
        self.try_play()
    }

    fn pause(&mut self) {
        self.with_info(|info| info.playing = false);
    }

    fn seek(&mut self, seconds: f64) {
        self.with_info(|info| {
            info.current_time = if info.duration.is_finite() {
                seconds.clamp(0.0, info.duration)
            } else {
                seconds.max(0.0)
            };
        });
    }

    fn current_time(&self) -> f64 {
        self.with_info(|info| info.current_time).unwrap_or(0.0)
    }

    fn duration(&self) -> f64 {
        self.with_info(|info| info.duration).unwrap_or(f64::NAN)
    }

    fn volume(&self) -> f32 {
        self.with_info(|info| info.volume).unwrap_or(0.0)
    }

    fn set_volume(&mut self, volume: f32) {
        self.with_info(|info| info.volume = volume.clamp(0.0, 1.0));
    }
}

impl Drop for SimulatedMediaHandle {
    fn drop(&mut self) {
        self.with_info(|info| {
            info.playing = false;
            info.released = true;
        });
    }
}
