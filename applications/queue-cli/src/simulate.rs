/// Simulation driver
///
/// Plays a queue against the simulated backend on a virtual clock and
/// records what happened.
use crate::config::CliConfig;
use crate::error::Result;
use soul_queue::sim::SimulatedBackend;
use soul_queue::{LoopMode, QueueEngine, QueueItem};

#[derive(Debug, Clone, Default)]
pub struct SimulateOptions {
    /// Media URLs, in queue order
    pub tracks: Vec<String>,
    pub shuffle: bool,
    pub loop_mode: LoopMode,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationReport {
    /// URLs in the order they became the current track
    pub played: Vec<String>,

    /// Virtual seconds simulated
    pub elapsed_secs: f64,

    /// Handles the engine asked the backend for
    pub handles_created: usize,

    /// Playback stopped on its own (end of queue)
    pub finished: bool,
}

/// Run one simulation to completion or until `simulation.max_secs`
pub async fn simulate(config: &CliConfig, options: SimulateOptions) -> Result<SimulationReport> {
    let settings = &config.simulation;
    let backend = SimulatedBackend::with_default_duration(settings.track_duration_secs);
    let mut engine = QueueEngine::new(backend.clone(), config.engine.clone());

    engine.replace_queue(options.tracks.into_iter().map(QueueItem::new).collect());
    engine.toggle_shuffle(Some(options.shuffle));
    engine.toggle_loop(Some(options.loop_mode));

    let mut now_playing = engine.subscribe_current_track();
    let mut played: Vec<String> = engine.current_item().map(|item| item.url).into_iter().collect();

    tracing::info!(
        "Simulating {} tracks ({}s each), shuffle: {}, loop: {:?}",
        engine.fetch_queue().len(),
        settings.track_duration_secs,
        options.shuffle,
        options.loop_mode
    );
    engine.toggle_playing(Some(true)).await?;
    if let Some(url) = played.first() {
        tracing::info!("Now playing: {}", url);
    }

    let mut elapsed_secs = 0.0;
    while engine.is_playing() && elapsed_secs < settings.max_secs {
        backend.advance(settings.step_secs);
        elapsed_secs += settings.step_secs;
        engine.process_pending_events().await;

        for item in now_playing.drain().into_iter().flatten() {
            tracing::info!("Now playing: {} (at {:.2}s)", item.url, elapsed_secs);
            played.push(item.url);
        }

        if let Some(preload) = engine.preloaded() {
            tracing::trace!("Preloaded position {} (primed: {})", preload.position, preload.primed);
        }
    }

    let finished = !engine.is_playing();
    if finished {
        tracing::info!("Queue finished after {:.2}s", elapsed_secs);
    } else {
        tracing::info!("Stopped after {:.2}s", elapsed_secs);
    }

    Ok(SimulationReport {
        played,
        elapsed_secs,
        handles_created: backend.created_count(),
        finished,
    })
}
