//! Core types for the playback-queue engine

use serde::{Deserialize, Serialize};

/// One entry in the play queue
///
/// The engine owns its copy; callers only ever receive clones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueItem {
    /// Media location handed to the backend
    pub url: String,

    /// Display metadata, carried opaquely
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<TrackMetadata>,
}

impl QueueItem {
    /// Item without metadata
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            metadata: None,
        }
    }

    /// Attach metadata
    #[must_use]
    pub fn with_metadata(mut self, metadata: TrackMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Title from metadata, if any
    pub fn title(&self) -> Option<&str> {
        self.metadata.as_ref().and_then(|m| m.title.as_deref())
    }
}

/// Track metadata reported to the current-track subscription
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackMetadata {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub artwork: Vec<Artwork>,
}

/// Artwork reference (media-session style)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artwork {
    pub src: String,

    #[serde(default)]
    pub sizes: Option<String>,

    #[serde(default, rename = "type")]
    pub mime_type: Option<String>,
}

/// Loop mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoopMode {
    /// Stop when the order runs out
    #[default]
    Off,

    /// Wrap around to the first position
    EntireQueue,

    /// Repeat the current track indefinitely
    SingleTrack,
}

impl LoopMode {
    /// Next mode in the Off → EntireQueue → SingleTrack → Off cycle
    pub fn cycle(self) -> Self {
        match self {
            LoopMode::Off => LoopMode::EntireQueue,
            LoopMode::EntireQueue => LoopMode::SingleTrack,
            LoopMode::SingleTrack => LoopMode::Off,
        }
    }
}

/// Scheduler state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackState {
    /// No current handle
    #[default]
    Idle,

    /// Handle created and play requested, not yet confirmed
    Loading,

    /// Currently playing
    Playing,

    /// Current handle exists but is not playing
    Paused,
}

/// Normalized progress of the current handle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    /// Seconds from start
    pub current_time: f64,

    /// Track length in seconds
    pub duration: f64,

    /// `current_time / duration` in percent (0-100)
    pub percentage: f64,
}

impl ProgressSnapshot {
    /// Build a snapshot; `None` unless `duration` is finite and positive
    pub fn new(current_time: f64, duration: f64) -> Option<Self> {
        if !is_known_duration(duration) {
            return None;
        }
        let current_time = if current_time.is_finite() {
            current_time.clamp(0.0, duration)
        } else {
            0.0
        };
        Some(Self {
            current_time,
            duration,
            percentage: current_time / duration * 100.0,
        })
    }

    /// Snapshot emitted when a track is (re)loaded
    pub fn zero(duration: f64) -> Self {
        Self {
            current_time: 0.0,
            duration: if is_known_duration(duration) { duration } else { 0.0 },
            percentage: 0.0,
        }
    }
}

/// Whether a backend-reported duration is usable
#[inline]
pub fn is_known_duration(duration: f64) -> bool {
    duration.is_finite() && duration > 0.0
}

/// Configuration for the queue engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Progress tick cadence (default: 100)
    pub progress_interval_ms: u64,

    /// Schedule the next track once less than this many seconds remain (default: 20)
    pub preload_lead_secs: f64,

    /// Silently prime preloaded handles once they can play through (default: true)
    ///
    /// Backends with native silent preloading can turn this off.
    pub prime_next: bool,

    /// Seed for shuffles; entropy-seeded when unset
    pub shuffle_seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            progress_interval_ms: 100,
            preload_lead_secs: 20.0,
            prime_next: true,
            shuffle_seed: None,
        }
    }
}
