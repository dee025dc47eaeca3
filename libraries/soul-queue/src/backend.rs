//! Platform-agnostic playback backend traits
//!
//! Abstracts media loading and output for different platforms (an HTML audio
//! element, a native player, the built-in simulator, ...). The engine never
//! decodes anything itself; it only drives handles and reacts to their events.

use crate::error::BackendError;
use async_trait::async_trait;
use std::fmt;
use tokio::sync::mpsc;

/// Engine-assigned identity of a handle
///
/// Every event carries the id of the handle that produced it, so the engine
/// can tell events from torn-down handles apart from live ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandleId(pub(crate) u64);

impl HandleId {
    /// Raw numeric id
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handle#{}", self.0)
    }
}

/// Events a handle reports back to the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleEventKind {
    /// Reached the end of the media
    Ended,

    /// Playback position moved
    TimeProgressed,

    /// Enough is buffered to play to the end without stalling
    ReadyToPlayThrough,
}

/// An event tagged with its source handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandleEvent {
    pub handle: HandleId,
    pub kind: HandleEventKind,
}

/// Inputs processed by the engine's state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineInput {
    /// Something happened on a backend handle
    Handle(HandleEvent),

    /// The progress reporter's timer fired
    ProgressTick,
}

/// Sender side given to the backend for one handle
///
/// Cheap to clone; backends typically move it into their event callbacks.
#[derive(Debug, Clone)]
pub struct HandleEvents {
    handle: HandleId,
    tx: mpsc::UnboundedSender<EngineInput>,
}

impl HandleEvents {
    pub(crate) fn new(handle: HandleId, tx: mpsc::UnboundedSender<EngineInput>) -> Self {
        Self { handle, tx }
    }

    /// Id of the handle these events belong to
    pub fn handle(&self) -> HandleId {
        self.handle
    }

    /// Report an event; silently dropped once the engine is gone
    pub fn emit(&self, kind: HandleEventKind) {
        let _ = self.tx.send(EngineInput::Handle(HandleEvent {
            handle: self.handle,
            kind,
        }));
    }
}

/// A controllable playback session for one media URL
///
/// Dropping a handle destroys it and disconnects it from output.
#[async_trait]
pub trait MediaHandle: Send {
    /// Start or resume playback
    ///
    /// Resolves once the backend has accepted (or refused) the request.
    ///
    /// # Returns
    /// * `Ok(())` - Playing
    /// * `Err(BackendError::Blocked)` - Policy forbids audible playback right now
    /// * `Err(BackendError::UnsupportedFormat)` - Media cannot be decoded
    async fn play(&mut self) -> Result<(), BackendError>;

    /// Pause playback
    fn pause(&mut self);

    /// Jump to `seconds` from start
    fn seek(&mut self, seconds: f64);

    /// Current position in seconds
    fn current_time(&self) -> f64;

    /// Total duration in seconds
    ///
    /// `NaN` or infinite while unknown (still loading, live stream).
    fn duration(&self) -> f64;

    /// Output volume, 0.0-1.0
    fn volume(&self) -> f32;

    /// Set output volume, 0.0-1.0
    fn set_volume(&mut self, volume: f32);
}

/// Factory for handles
pub trait PlaybackBackend: Send {
    /// Create a handle for `url` and start loading it
    ///
    /// The handle must report its events through `events`. It must not start
    /// playing on its own.
    fn create_handle(
        &mut self,
        url: &str,
        events: HandleEvents,
    ) -> Result<Box<dyn MediaHandle>, BackendError>;
}
