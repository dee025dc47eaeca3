//! Soul Player - Playback Queue Engine
//!
//! Platform-agnostic playback-queue engine for Soul Player.
//!
//! This crate provides:
//! - Queue with an independent play order (shuffle with continuity)
//! - Loop modes (Off, EntireQueue, SingleTrack)
//! - Gapless transitions via a preloaded, silently primed next handle
//! - Seek functionality (absolute, percentage, relative)
//! - Progress reporting while playing
//! - Subscriptions for play state, queue, current track, progress, shuffle
//!   and loop mode
//! - Remote (media session) command handling
//!
//! # Architecture
//!
//! `soul-queue` never touches audio itself. Media loading and output are
//! provided by a [`PlaybackBackend`] that creates [`MediaHandle`]s; handles
//! report `Ended`, `TimeProgressed` and `ReadyToPlayThrough` back to the
//! engine through its input channel.
//!
//! ```text
//! caller ──► QueueEngine ──► PlayOrder
//!               │   ▲
//!               ▼   │ HandleEvents
//!          PlaybackBackend ──► MediaHandle (current, next)
//! ```
//!
//! # Example: Platform Integration
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use soul_queue::{
//!     BackendError, EngineConfig, HandleEvents, MediaHandle, PlaybackBackend, QueueEngine,
//!     QueueItem,
//! };
//!
//! // Implement the backend for your platform
//! struct MyPlayer;
//!
//! struct MyHandle {
//!     events: HandleEvents,
//! }
//!
//! #[async_trait]
//! impl MediaHandle for MyHandle {
//!     async fn play(&mut self) -> Result<(), BackendError> {
//!         // Start platform playback
//!         Ok(())
//!     }
//!     fn pause(&mut self) {}
//!     fn seek(&mut self, _seconds: f64) {}
//!     fn current_time(&self) -> f64 {
//!         0.0
//!     }
//!     fn duration(&self) -> f64 {
//!         180.0
//!     }
//!     fn volume(&self) -> f32 {
//!         1.0
//!     }
//!     fn set_volume(&mut self, _volume: f32) {}
//! }
//!
//! impl PlaybackBackend for MyPlayer {
//!     fn create_handle(
//!         &mut self,
//!         _url: &str,
//!         events: HandleEvents,
//!     ) -> Result<Box<dyn MediaHandle>, BackendError> {
//!         Ok(Box::new(MyHandle { events }))
//!     }
//! }
//!
//! # async fn demo() -> soul_queue::Result<()> {
//! let mut engine = QueueEngine::new(MyPlayer, EngineConfig::default());
//! engine.replace_queue(vec![QueueItem::new("/music/a.flac"), QueueItem::new("/music/b.flac")]);
//!
//! let mut now_playing = engine.subscribe_current_track();
//! engine.toggle_playing(Some(true)).await?;
//! engine.skip_to_next().await?;
//!
//! // Drive backend events and progress ticks
//! engine.process_pending_events().await;
//! let _track = now_playing.try_recv();
//! # Ok(())
//! # }
//! ```

mod backend;
mod engine;
mod error;
mod events;
mod order;
mod progress;
mod remote;
mod shuffle;
mod transition;
pub mod types;

#[cfg(any(test, feature = "simulator"))]
pub mod sim;

// Public exports
pub use backend::{
    EngineInput, HandleEvent, HandleEventKind, HandleEvents, HandleId, MediaHandle, PlaybackBackend,
};
pub use engine::{PreloadStatus, QueueEngine, RESTART_THRESHOLD_SECS};
pub use error::{BackendError, PlaybackError, Result};
pub use events::Subscription;
pub use order::PlayOrder;
pub use remote::RemoteCommand;
pub use shuffle::shuffle_from;
pub use types::{
    Artwork, EngineConfig, LoopMode, PlaybackState, ProgressSnapshot, QueueItem, TrackMetadata,
};
