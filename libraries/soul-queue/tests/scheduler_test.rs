//! Scheduler tests against the simulated backend
//!
//! Covers:
//! - Play/pause intent and backend refusals
//! - Skips and the restart threshold
//! - Seek clamping
//! - Preload window, priming and gapless promotion
//! - Loop modes at the end of the order
//! - Stale events from torn-down handles
//! - Shuffle continuity and queue replacement
//! - Remote commands

use soul_queue::sim::SimulatedBackend;
use soul_queue::{
    EngineConfig, HandleEventKind, LoopMode, PlaybackError, PlaybackState, ProgressSnapshot,
    QueueEngine, QueueItem, RemoteCommand,
};
use tokio::sync::mpsc;

// ===== Helpers =====

fn items(urls: &[&str]) -> Vec<QueueItem> {
    urls.iter().map(|url| QueueItem::new(*url)).collect()
}

fn engine_with(urls: &[&str], duration: f64) -> (QueueEngine<SimulatedBackend>, SimulatedBackend) {
    let backend = SimulatedBackend::with_default_duration(duration);
    let config = EngineConfig {
        shuffle_seed: Some(7),
        ..EngineConfig::default()
    };
    let mut engine = QueueEngine::new(backend.clone(), config);
    engine.replace_queue(items(urls));
    (engine, backend)
}

fn current_url(engine: &QueueEngine<SimulatedBackend>) -> String {
    engine.current_item().map(|item| item.url).unwrap_or_default()
}

/// Advance the virtual clock and let the engine react
async fn play_for(engine: &mut QueueEngine<SimulatedBackend>, backend: &SimulatedBackend, secs: f64) {
    backend.advance(secs);
    engine.process_pending_events().await;
}

// ===== Play / Pause =====

#[tokio::test]
async fn toggle_playing_is_idempotent() {
    let (mut engine, backend) = engine_with(&["a", "b", "c"], 100.0);
    let mut states = engine.subscribe_play_state();

    engine.toggle_playing(Some(true)).await.unwrap();
    engine.toggle_playing(Some(true)).await.unwrap();

    assert_eq!(states.drain(), vec![true]);
    let id = engine.current_handle_id().unwrap();
    assert_eq!(backend.handle(id).unwrap().play_calls, 1);
    assert_eq!(engine.playback_state(), PlaybackState::Playing);

    engine.toggle_playing(None).await.unwrap();
    assert!(!engine.is_playing());
    assert_eq!(states.drain(), vec![false]);
    assert!(!backend.handle(id).unwrap().playing);
    assert_eq!(engine.playback_state(), PlaybackState::Paused);
}

#[tokio::test]
async fn playing_an_empty_queue_fails() {
    let mut engine = QueueEngine::new(SimulatedBackend::new(), EngineConfig::default());

    let err = engine.toggle_playing(Some(true)).await.unwrap_err();
    assert!(matches!(err, PlaybackError::QueueEmpty));
    assert!(!engine.is_playing());
    assert_eq!(engine.playback_state(), PlaybackState::Idle);
}

#[tokio::test]
async fn blocked_autoplay_reverts_play_intent() {
    let (mut engine, backend) = engine_with(&["a", "b"], 100.0);
    backend.set_autoplay_blocked(true);
    let mut states = engine.subscribe_play_state();

    let err = engine.toggle_playing(Some(true)).await.unwrap_err();
    assert!(matches!(err, PlaybackError::PlaybackBlocked(_)));
    assert!(!engine.is_playing());
    assert_eq!(states.drain(), vec![true, false]);

    // A later attempt (after a user gesture) reuses the same handle
    backend.set_autoplay_blocked(false);
    engine.toggle_playing(Some(true)).await.unwrap();
    assert!(engine.is_playing());
    assert_eq!(backend.created_count(), 1);
}

#[tokio::test]
async fn unsupported_format_keeps_play_intent() {
    let (mut engine, backend) = engine_with(&["a", "b"], 100.0);
    backend.mark_unsupported("a");

    let err = engine.toggle_playing(Some(true)).await.unwrap_err();
    assert!(matches!(err, PlaybackError::UnsupportedFormat(_)));
    assert!(engine.is_playing());
    assert!(backend.playing_handles().is_empty());
}

// ===== Skips =====

#[tokio::test]
async fn skip_to_next_keeps_playing_and_notifies_track() {
    let (mut engine, backend) = engine_with(&["a", "b", "c"], 100.0);
    engine.toggle_playing(Some(true)).await.unwrap();
    let first = engine.current_handle_id().unwrap();
    let mut tracks = engine.subscribe_current_track();

    engine.skip_to_next().await.unwrap();

    assert_eq!(engine.position(), 1);
    assert_eq!(tracks.drain(), vec![Some(QueueItem::new("b"))]);
    assert!(engine.is_playing());
    assert!(backend.handle(first).unwrap().released);
    assert_eq!(backend.playing_handles(), vec![engine.current_handle_id().unwrap()]);
}

#[tokio::test]
async fn skip_to_next_at_end_without_loop_is_a_no_op() {
    let (mut engine, _backend) = engine_with(&["a", "b"], 100.0);
    engine.skip_to_index(1).await.unwrap();
    let id = engine.current_handle_id();

    engine.skip_to_next().await.unwrap();

    assert_eq!(engine.position(), 1);
    assert_eq!(engine.current_handle_id(), id);
}

#[tokio::test]
async fn skip_to_next_wraps_with_entire_queue_loop() {
    let (mut engine, _backend) = engine_with(&["a", "b"], 100.0);
    engine.toggle_loop(Some(LoopMode::EntireQueue));
    engine.skip_to_index(1).await.unwrap();

    engine.skip_to_next().await.unwrap();
    assert_eq!(engine.position(), 0);
}

#[tokio::test]
async fn skip_while_paused_stays_paused() {
    let (mut engine, backend) = engine_with(&["a", "b"], 100.0);

    engine.skip_to_next().await.unwrap();

    assert_eq!(engine.position(), 1);
    assert!(!engine.is_playing());
    assert!(backend.playing_handles().is_empty());
    assert_eq!(engine.playback_state(), PlaybackState::Paused);
}

#[tokio::test]
async fn skip_to_previous_respects_restart_threshold() {
    let (mut engine, backend) = engine_with(&["a", "b", "c"], 100.0);
    engine.toggle_playing(Some(true)).await.unwrap();

    // Early in the track: go back
    engine.skip_to_next().await.unwrap();
    play_for(&mut engine, &backend, 2.0).await;
    engine.skip_to_previous().await.unwrap();
    assert_eq!(engine.position(), 0);
    assert!(engine.is_playing());

    // Past the threshold: restart in place
    engine.skip_to_next().await.unwrap();
    play_for(&mut engine, &backend, 6.0).await;
    let id = engine.current_handle_id().unwrap();
    engine.skip_to_previous().await.unwrap();

    assert_eq!(engine.position(), 1);
    assert_eq!(engine.current_handle_id(), Some(id));
    assert_eq!(backend.handle(id).unwrap().current_time, 0.0);
}

#[tokio::test]
async fn skip_to_previous_at_first_position_restarts() {
    let (mut engine, backend) = engine_with(&["a", "b"], 100.0);
    engine.toggle_playing(Some(true)).await.unwrap();
    play_for(&mut engine, &backend, 3.0).await;
    let id = engine.current_handle_id().unwrap();

    engine.skip_to_previous().await.unwrap();

    assert_eq!(engine.position(), 0);
    assert_eq!(engine.current_handle_id(), Some(id));
    assert_eq!(backend.handle(id).unwrap().current_time, 0.0);
}

#[tokio::test]
async fn skip_to_invalid_index_is_ignored() {
    let (mut engine, _backend) = engine_with(&["a", "b"], 100.0);
    engine.skip_to_index(1).await.unwrap();

    engine.skip_to_index(7).await.unwrap();
    assert_eq!(engine.position(), 1);
    assert_eq!(current_url(&engine), "b");
}

// ===== Seek =====

#[tokio::test]
async fn seek_clamps_to_track_bounds() {
    let (mut engine, backend) = engine_with(&["a"], 200.0);
    engine.toggle_playing(Some(true)).await.unwrap();
    let id = engine.current_handle_id().unwrap();
    let mut progress = engine.subscribe_progress();

    assert!(engine.seek_to(-5.0));
    assert_eq!(backend.handle(id).unwrap().current_time, 0.0);

    assert!(engine.seek_to(9999.0));
    assert_eq!(backend.handle(id).unwrap().current_time, 200.0);

    let snapshots = progress.drain();
    assert_eq!(
        snapshots.last(),
        Some(&ProgressSnapshot {
            current_time: 200.0,
            duration: 200.0,
            percentage: 100.0,
        })
    );
}

#[tokio::test]
async fn seek_variants() {
    let (mut engine, backend) = engine_with(&["a"], 200.0);
    assert!(!engine.seek_to(10.0), "no handle before the first load");

    engine.toggle_playing(Some(true)).await.unwrap();
    let id = engine.current_handle_id().unwrap();

    assert!(engine.seek_to_percentage(50.0));
    assert_eq!(backend.handle(id).unwrap().current_time, 100.0);

    assert!(engine.seek_relative(-30.0));
    assert_eq!(backend.handle(id).unwrap().current_time, 70.0);

    assert!(!engine.seek_to(f64::NAN));
    assert_eq!(engine.progress().unwrap().current_time, 70.0);
}

#[tokio::test]
async fn seek_is_rejected_while_duration_unknown() {
    let (mut engine, backend) = engine_with(&["live"], 100.0);
    backend.set_duration("live", f64::NAN);
    engine.toggle_playing(Some(true)).await.unwrap();

    assert!(!engine.seek_to(10.0));
    assert!(engine.progress().is_none());
}

// ===== Preload & Gapless =====

#[tokio::test]
async fn preload_starts_inside_window() {
    let (mut engine, backend) = engine_with(&["a", "b", "c"], 100.0);
    engine.toggle_playing(Some(true)).await.unwrap();
    let current = engine.current_handle_id().unwrap();

    play_for(&mut engine, &backend, 40.0).await;
    assert!(engine.preloaded().is_none());

    play_for(&mut engine, &backend, 11.0).await;
    let preload = engine.preloaded().unwrap();
    assert_eq!(preload.position, 1);
    assert!(preload.primed);

    let next = backend.handle(preload.handle).unwrap();
    assert_eq!(next.url, "b");
    assert_eq!(next.play_calls, 1);
    assert!(!next.playing);
    assert_eq!(next.current_time, 0.0);
    assert_eq!(next.volume, 1.0);
    assert_eq!(backend.playing_handles(), vec![current]);
}

#[tokio::test]
async fn preload_is_primed_only_once() {
    let (mut engine, backend) = engine_with(&["a", "b"], 100.0);
    engine.toggle_playing(Some(true)).await.unwrap();
    play_for(&mut engine, &backend, 60.0).await;
    let next = engine.preloaded().unwrap().handle;

    backend.emit(next, HandleEventKind::ReadyToPlayThrough);
    engine.process_pending_events().await;

    assert_eq!(backend.handle(next).unwrap().play_calls, 1);
}

#[tokio::test]
async fn track_end_promotes_preloaded_handle() {
    let (mut engine, backend) = engine_with(&["a", "b", "c"], 100.0);
    engine.toggle_playing(Some(true)).await.unwrap();
    let first = engine.current_handle_id().unwrap();
    play_for(&mut engine, &backend, 60.0).await;
    let next = engine.preloaded().unwrap().handle;
    let mut tracks = engine.subscribe_current_track();

    play_for(&mut engine, &backend, 40.0).await;

    assert_eq!(engine.position(), 1);
    assert_eq!(engine.current_handle_id(), Some(next));
    assert!(engine.is_playing());
    assert_eq!(engine.playback_state(), PlaybackState::Playing);
    assert!(backend.handle(first).unwrap().released);
    assert_eq!(backend.playing_handles(), vec![next]);
    assert_eq!(backend.created_count(), 2, "no cold start");
    assert_eq!(tracks.drain(), vec![Some(QueueItem::new("b"))]);
}

#[tokio::test]
async fn seeking_out_of_window_discards_preload() {
    let (mut engine, backend) = engine_with(&["a", "b"], 100.0);
    engine.toggle_playing(Some(true)).await.unwrap();
    play_for(&mut engine, &backend, 60.0).await;
    let next = engine.preloaded().unwrap().handle;

    assert!(engine.seek_to(10.0));
    assert!(engine.preloaded().is_none());
    assert!(backend.handle(next).unwrap().released);

    assert!(engine.seek_to(90.0));
    assert!(engine.preloaded().is_some());
}

#[tokio::test]
async fn loop_change_reconciles_preload() {
    let (mut engine, backend) = engine_with(&["a", "b"], 100.0);
    engine.toggle_playing(Some(true)).await.unwrap();
    play_for(&mut engine, &backend, 60.0).await;
    assert!(engine.preloaded().is_some());

    engine.toggle_loop(Some(LoopMode::SingleTrack));
    assert!(engine.preloaded().is_none());
}

#[tokio::test]
async fn undecodable_successor_falls_back_and_stops() {
    let (mut engine, backend) = engine_with(&["a", "b"], 100.0);
    backend.mark_unsupported("b");
    engine.toggle_playing(Some(true)).await.unwrap();

    play_for(&mut engine, &backend, 60.0).await;
    assert!(engine.preloaded().is_none(), "failed priming discards the preload");

    play_for(&mut engine, &backend, 40.0).await;
    assert_eq!(engine.position(), 1);
    assert!(!engine.is_playing());
    assert!(backend.playing_handles().is_empty());
}

#[tokio::test]
async fn priming_can_be_disabled() {
    let backend = SimulatedBackend::with_default_duration(100.0);
    let config = EngineConfig {
        prime_next: false,
        ..EngineConfig::default()
    };
    let mut engine = QueueEngine::new(backend.clone(), config);
    engine.replace_queue(items(&["a", "b"]));
    engine.toggle_playing(Some(true)).await.unwrap();

    play_for(&mut engine, &backend, 60.0).await;
    let preload = engine.preloaded().unwrap();
    assert!(!preload.primed);
    assert_eq!(backend.handle(preload.handle).unwrap().play_calls, 0);

    play_for(&mut engine, &backend, 40.0).await;
    assert_eq!(engine.current_handle_id(), Some(preload.handle));
    assert!(engine.is_playing());
}

#[tokio::test]
async fn undecodable_successor_is_not_preloaded_again() {
    let (mut engine, backend) = engine_with(&["a", "b"], 100.0);
    backend.mark_unsupported("b");
    engine.toggle_playing(Some(true)).await.unwrap();

    for _ in 0..60 {
        play_for(&mut engine, &backend, 1.0).await;
    }

    assert_eq!(engine.position(), 0);
    assert!(engine.preloaded().is_none());
    assert_eq!(backend.created_count(), 2, "one current, one failed preload");
}

#[tokio::test]
async fn blocked_priming_keeps_preload_for_promotion() {
    let (mut engine, backend) = engine_with(&["a", "b"], 100.0);
    engine.toggle_playing(Some(true)).await.unwrap();
    play_for(&mut engine, &backend, 40.0).await;

    backend.set_autoplay_blocked(true);
    play_for(&mut engine, &backend, 11.0).await;
    let preload = engine.preloaded().unwrap();
    assert!(!preload.primed);
    assert_eq!(backend.handle(preload.handle).unwrap().play_calls, 0);
    assert_eq!(backend.handle(preload.handle).unwrap().volume, 1.0);

    backend.set_autoplay_blocked(false);
    play_for(&mut engine, &backend, 49.0).await;

    assert_eq!(engine.position(), 1);
    assert_eq!(engine.current_handle_id(), Some(preload.handle));
    assert!(engine.is_playing());
    assert_eq!(backend.playing_handles(), vec![preload.handle]);
    assert_eq!(backend.created_count(), 2, "no cold start");
}

#[tokio::test]
async fn unready_preload_passes_readiness_guard_on_promotion() {
    let (mut engine, backend) = engine_with(&["a", "b"], 100.0);
    backend.set_auto_ready(false);
    engine.toggle_playing(Some(true)).await.unwrap();

    play_for(&mut engine, &backend, 51.0).await;
    let preload = engine.preloaded().unwrap();
    assert!(!preload.primed);
    assert_eq!(backend.handle(preload.handle).unwrap().play_calls, 0);

    play_for(&mut engine, &backend, 49.0).await;

    assert_eq!(engine.current_handle_id(), Some(preload.handle));
    assert!(engine.is_playing());
    let promoted = backend.handle(preload.handle).unwrap();
    assert!(promoted.playing);
    assert_eq!(promoted.play_calls, 2, "guard round trip, then audible play");
    assert_eq!(promoted.volume, 1.0);
    assert_eq!(backend.created_count(), 2);
}

// ===== Loop Modes =====

#[tokio::test]
async fn entire_queue_loop_wraps_at_end() {
    let (mut engine, backend) = engine_with(&["a", "b"], 10.0);
    engine.toggle_loop(Some(LoopMode::EntireQueue));
    engine.toggle_playing(Some(true)).await.unwrap();
    engine.skip_to_next().await.unwrap();

    play_for(&mut engine, &backend, 10.0).await;

    assert_eq!(engine.position(), 0);
    assert_eq!(current_url(&engine), "a");
    assert!(engine.is_playing());
}

#[tokio::test]
async fn queue_end_without_loop_stops() {
    let (mut engine, backend) = engine_with(&["a", "b"], 10.0);
    engine.toggle_playing(Some(true)).await.unwrap();
    engine.skip_to_next().await.unwrap();
    let mut states = engine.subscribe_play_state();

    play_for(&mut engine, &backend, 10.0).await;

    assert!(!engine.is_playing());
    assert_eq!(states.drain(), vec![false]);
    assert_eq!(engine.position(), 1);
    assert!(engine.preloaded().is_none());
}

#[tokio::test]
async fn single_track_loop_restarts_same_handle() {
    let (mut engine, backend) = engine_with(&["a", "b"], 10.0);
    engine.toggle_loop(Some(LoopMode::SingleTrack));
    engine.toggle_playing(Some(true)).await.unwrap();
    let id = engine.current_handle_id().unwrap();

    play_for(&mut engine, &backend, 10.0).await;

    assert_eq!(engine.position(), 0);
    assert_eq!(engine.current_handle_id(), Some(id));
    assert!(engine.preloaded().is_none());
    let handle = backend.handle(id).unwrap();
    assert_eq!(handle.current_time, 0.0);
    assert!(handle.playing);
    assert_eq!(handle.play_calls, 2);
}

#[tokio::test]
async fn toggle_loop_without_argument_cycles() {
    let (mut engine, _backend) = engine_with(&["a"], 10.0);
    let mut modes = engine.subscribe_loop_mode();

    engine.toggle_loop(None);
    engine.toggle_loop(None);
    engine.toggle_loop(None);

    assert_eq!(
        modes.drain(),
        vec![
            LoopMode::Off,
            LoopMode::EntireQueue,
            LoopMode::SingleTrack,
            LoopMode::Off,
        ]
    );
}

// ===== Stale Events =====

#[tokio::test]
async fn events_from_released_handles_are_ignored() {
    let (mut engine, backend) = engine_with(&["a", "b", "c"], 100.0);
    engine.toggle_playing(Some(true)).await.unwrap();
    let first = engine.current_handle_id().unwrap();
    engine.skip_to_next().await.unwrap();
    let second = engine.current_handle_id().unwrap();

    backend.emit(first, HandleEventKind::Ended);
    backend.emit(first, HandleEventKind::ReadyToPlayThrough);
    engine.process_pending_events().await;

    assert_eq!(engine.position(), 1);
    assert_eq!(engine.current_handle_id(), Some(second));
    assert!(engine.is_playing());
}

#[tokio::test]
async fn track_end_queued_before_pause_is_dropped() {
    let (mut engine, backend) = engine_with(&["a", "b"], 100.0);
    engine.toggle_playing(Some(true)).await.unwrap();
    backend.advance(100.0);

    engine.toggle_playing(Some(false)).await.unwrap();
    engine.process_pending_events().await;

    assert!(!engine.is_playing());
    assert_eq!(engine.position(), 0);
    assert_eq!(engine.playback_state(), PlaybackState::Paused);
    assert!(backend.playing_handles().is_empty());

    // Resuming at the end of the track moves on as usual
    engine.toggle_playing(Some(true)).await.unwrap();
    play_for(&mut engine, &backend, 1.0).await;
    assert_eq!(engine.position(), 1);
    assert!(engine.is_playing());
}

#[tokio::test]
async fn track_end_queued_before_seek_back_resumes_track() {
    let (mut engine, backend) = engine_with(&["a", "b"], 100.0);
    engine.toggle_playing(Some(true)).await.unwrap();
    let id = engine.current_handle_id().unwrap();
    backend.advance(100.0);

    assert!(engine.seek_to(30.0));
    engine.process_pending_events().await;

    assert_eq!(engine.position(), 0);
    assert_eq!(engine.current_handle_id(), Some(id));
    assert!(engine.is_playing());
    assert_eq!(backend.playing_handles(), vec![id]);
    assert_eq!(backend.handle(id).unwrap().current_time, 30.0);
}

// ===== Shuffle & Queue =====

#[tokio::test]
async fn shuffle_preserves_played_prefix_and_current_track() {
    let (mut engine, _backend) = engine_with(&["A", "B", "C", "D", "E"], 100.0);
    engine.toggle_playing(Some(true)).await.unwrap();
    engine.skip_to_index(2).await.unwrap();
    let id = engine.current_handle_id();

    engine.toggle_shuffle(Some(true));
    assert_eq!(&engine.order()[..3], &[0, 1, 2]);
    assert_eq!(current_url(&engine), "C");
    assert_eq!(engine.current_handle_id(), id);

    engine.toggle_shuffle(Some(false));
    assert_eq!(engine.order(), &[0, 1, 2, 3, 4]);
    assert_eq!(engine.position(), 2);
    assert_eq!(current_url(&engine), "C");
}

#[tokio::test]
async fn append_during_shuffle_goes_last() {
    let (mut engine, _backend) = engine_with(&["A", "B", "C", "D", "E"], 100.0);
    engine.toggle_shuffle(Some(true));

    engine.append_track(QueueItem::new("F"));

    assert_eq!(engine.order().len(), 6);
    assert_eq!(engine.order()[5], 5);
    assert_eq!(engine.fetch_queue().last().unwrap().url, "F");
}

#[tokio::test]
async fn shuffle_before_playback_reloads_first_track() {
    let (mut engine, backend) = engine_with(&["A", "B", "C", "D", "E"], 100.0);
    // Loads a handle for position 0 without playing
    engine.skip_to_index(0).await.unwrap();

    engine.toggle_shuffle(Some(true));

    let id = engine.current_handle_id().unwrap();
    assert_eq!(backend.handle(id).unwrap().url, current_url(&engine));
}

#[tokio::test]
async fn only_shuffle_and_loop_replay_on_subscribe() {
    let (mut engine, _backend) = engine_with(&["a", "b"], 100.0);
    engine.toggle_shuffle(Some(true));
    engine.toggle_playing(Some(true)).await.unwrap();

    assert_eq!(engine.subscribe_shuffle().try_recv(), Some(true));
    assert_eq!(engine.subscribe_loop_mode().try_recv(), Some(LoopMode::Off));
    assert_eq!(engine.subscribe_play_state().try_recv(), None);
    assert_eq!(engine.subscribe_queue().try_recv(), None);
    assert_eq!(engine.subscribe_current_track().try_recv(), None);
}

#[tokio::test]
async fn queue_subscribers_see_play_order() {
    let (mut engine, _backend) = engine_with(&["A", "B", "C", "D", "E"], 100.0);
    let mut queue = engine.subscribe_queue();

    engine.toggle_shuffle(Some(true));

    let published = queue.drain().pop().unwrap();
    assert_eq!(published, engine.fetch_queue());
    let expected: Vec<String> = engine
        .order()
        .iter()
        .map(|&i| ["A", "B", "C", "D", "E"][i].to_string())
        .collect();
    let urls: Vec<String> = published.into_iter().map(|item| item.url).collect();
    assert_eq!(urls, expected);
}

#[tokio::test]
async fn replace_queue_stops_and_resets() {
    let (mut engine, backend) = engine_with(&["a", "b", "c"], 100.0);
    engine.toggle_playing(Some(true)).await.unwrap();
    engine.toggle_shuffle(Some(true));
    engine.toggle_loop(Some(LoopMode::EntireQueue));
    let id = engine.current_handle_id().unwrap();
    let mut states = engine.subscribe_play_state();

    engine.replace_queue(items(&["x", "y"]));

    assert!(!engine.is_playing());
    assert_eq!(states.drain(), vec![false]);
    assert!(!engine.shuffle_enabled());
    assert_eq!(engine.loop_mode(), LoopMode::Off);
    assert_eq!(engine.current_handle_id(), None);
    assert_eq!(engine.playback_state(), PlaybackState::Idle);
    assert!(backend.handle(id).unwrap().released);
    assert_eq!(backend.live_count(), 0);

    let urls: Vec<String> = engine.fetch_queue().into_iter().map(|item| item.url).collect();
    assert_eq!(urls, vec!["x", "y"]);
}

// ===== Remote Commands =====

#[tokio::test]
async fn remote_commands_drive_playback() {
    let (mut engine, backend) = engine_with(&["a", "b", "c"], 100.0);

    engine.handle_remote_command(RemoteCommand::Play).await.unwrap();
    assert!(engine.is_playing());

    play_for(&mut engine, &backend, 30.0).await;
    engine.handle_remote_command(RemoteCommand::Stop).await.unwrap();
    let id = engine.current_handle_id().unwrap();
    assert!(!engine.is_playing());
    assert_eq!(backend.handle(id).unwrap().current_time, 0.0);

    engine.handle_remote_command(RemoteCommand::NextTrack).await.unwrap();
    assert_eq!(engine.position(), 1);
    engine.handle_remote_command(RemoteCommand::PreviousTrack).await.unwrap();
    assert_eq!(engine.position(), 0);

    engine.handle_remote_command(RemoteCommand::Play).await.unwrap();
    engine.handle_remote_command(RemoteCommand::Pause).await.unwrap();
    assert!(!engine.is_playing());
}

#[tokio::test]
async fn run_processes_commands_until_closed() {
    let (mut engine, _backend) = engine_with(&["a", "b", "c"], 100.0);
    let (tx, rx) = mpsc::unbounded_channel();

    tx.send(RemoteCommand::Play).unwrap();
    tx.send(RemoteCommand::NextTrack).unwrap();
    drop(tx);

    engine.run(rx).await;

    assert!(engine.is_playing());
    assert_eq!(engine.position(), 1);
}
