mod support;

use bridge_traits::focus::FocusChange;
use bridge_traits::playback::{PlaybackState, RepeatMode, ShuffleMode};
use bridge_traits::transport::TransportStatus;
use core_playback::{PlaybackConfig, PlaybackError};
use core_runtime::events::{CoreEvent, PlaybackEvent, SessionEvent};
use std::sync::Arc;
use std::time::Duration;
use support::{elapsed_events, playlist, Harness, TransportCall, TRACK_DURATION_MS};

// ============================================================================
// Play / pause resolution
// ============================================================================

#[tokio::test]
async fn play_pause_without_session_prepares_and_plays() {
    let mut h = Harness::new();
    let p1 = playlist(1, &[10, 11]);

    h.coordinator.play_pause(p1.clone(), 10).await.unwrap();
    let snapshot = h.settle().await;

    assert_eq!(snapshot.state, PlaybackState::Playing);
    assert_eq!(snapshot.current_ids(), Some((1, 10)));
    assert!(snapshot.foreground);
    assert!(snapshot.focus_held);
    assert_eq!(h.factory.created(), 1);
    assert_eq!(
        h.factory.last().uris(),
        &[
            "https://cdn.example.com/1/10.mp3".to_string(),
            "https://cdn.example.com/1/11.mp3".to_string(),
        ]
    );
    assert_eq!(
        h.drain_states(),
        vec![PlaybackState::Buffering, PlaybackState::Playing]
    );
    assert!(h.route.is_registered());
    assert_eq!(h.notification.last().map(|n| n.paused), Some(false));
}

#[tokio::test]
async fn same_track_toggles_without_preparing_again() {
    let h = Harness::new();
    let p1 = playlist(1, &[10, 11]);

    h.coordinator.play_pause(p1.clone(), 10).await.unwrap();
    assert_eq!(h.settle().await.state, PlaybackState::Playing);

    h.coordinator.play_pause(p1.clone(), 10).await.unwrap();
    let paused = h.settle().await;
    assert_eq!(paused.state, PlaybackState::Paused);
    assert!(!paused.focus_held);
    assert!(!paused.foreground);
    assert_eq!(h.focus.abandons(), 1);
    assert!(!h.route.is_registered());
    assert_eq!(h.notification.last().map(|n| n.paused), Some(true));

    h.coordinator.play_pause(p1, 10).await.unwrap();
    assert_eq!(h.settle().await.state, PlaybackState::Playing);
    assert_eq!(h.factory.created(), 1);
}

#[tokio::test]
async fn other_track_in_same_playlist_skips_there() {
    let h = Harness::new();
    let p1 = playlist(1, &[10, 11, 12]);

    h.coordinator.play_pause(p1.clone(), 10).await.unwrap();
    h.settle().await;
    h.coordinator.play_pause(p1, 12).await.unwrap();
    let snapshot = h.settle().await;

    assert_eq!(snapshot.state, PlaybackState::Playing);
    assert_eq!(snapshot.current_ids(), Some((1, 12)));
    assert_eq!(h.factory.created(), 1);
    assert!(h.factory.last().seeks().contains(&(2, 0)));
    assert_eq!(
        h.media_session.last_metadata().map(|m| m.media_id),
        Some("12".to_string())
    );
}

#[tokio::test]
async fn other_playlist_restarts_on_a_fresh_transport() {
    let h = Harness::new();

    h.coordinator.play_pause(playlist(1, &[10]), 10).await.unwrap();
    h.settle().await;
    h.coordinator.play_pause(playlist(2, &[20, 21]), 21).await.unwrap();
    let snapshot = h.settle().await;

    assert_eq!(snapshot.state, PlaybackState::Playing);
    assert_eq!(snapshot.current_ids(), Some((2, 21)));
    assert_eq!(h.factory.created(), 2);
    assert!(h.factory.transport(0).is_released());
    assert_eq!(h.factory.live(), 1);
}

// ============================================================================
// Navigation
// ============================================================================

#[tokio::test]
async fn skips_wrap_at_both_ends() {
    let h = Harness::new();
    let p1 = playlist(1, &[10, 11, 12]);

    h.coordinator.prepare(p1, 12).await.unwrap();
    h.coordinator.skip_next().await.unwrap();
    let snapshot = h.settle().await;
    assert_eq!(snapshot.current_ids(), Some((1, 10)));
    // Skipping starts playback.
    assert_eq!(snapshot.state, PlaybackState::Playing);

    h.coordinator.skip_previous().await.unwrap();
    assert_eq!(h.settle().await.current_ids(), Some((1, 12)));
}

#[tokio::test]
async fn shuffle_skips_follow_the_installed_permutation() {
    let h = Harness::new();
    let p1 = playlist(1, &[10, 11, 12, 13, 14]);

    h.coordinator.play_pause(p1.clone(), 10).await.unwrap();
    h.settle().await;
    h.coordinator.set_shuffle(ShuffleMode::All).await.unwrap();

    let order = h
        .factory
        .last()
        .calls()
        .into_iter()
        .find_map(|call| match call {
            TransportCall::Shuffle(Some(order)) => Some(order),
            _ => None,
        })
        .expect("shuffle order installed");
    assert_eq!(order[0], 0);

    h.coordinator.skip_next().await.unwrap();
    let snapshot = h.settle().await;
    assert_eq!(snapshot.current_ids(), Some((1, p1.tracks[order[1]].id)));
    assert_eq!(snapshot.shuffle, ShuffleMode::All);
}

#[tokio::test]
async fn seek_clamps_to_known_duration() {
    let h = Harness::new();

    h.coordinator.play_pause(playlist(1, &[10]), 10).await.unwrap();
    h.settle().await;
    h.coordinator.seek_to(10_000_000).await.unwrap();

    let snapshot = h.settle().await;
    assert!(h.factory.last().seeks().contains(&(0, TRACK_DURATION_MS)));
    assert_eq!(snapshot.elapsed_ms, TRACK_DURATION_MS);
    assert_eq!(snapshot.current_ids(), Some((1, 10)));
}

#[tokio::test]
async fn auto_advance_refreshes_the_current_track() {
    let mut h = Harness::new();

    h.coordinator.play_pause(playlist(1, &[10, 11]), 10).await.unwrap();
    h.settle().await;
    h.drain_events();

    h.factory.last().advance_to(1);
    let snapshot = h.settle().await;
    assert_eq!(snapshot.current_ids(), Some((1, 11)));

    let events = h.drain_events();
    assert!(events.contains(&CoreEvent::Playback(PlaybackEvent::ExtrasChanged {
        playlist_id: 1,
        track_id: 11,
    })));
    assert_eq!(elapsed_events(&events), 1);
    assert_eq!(
        h.notification.last().map(|n| n.track_title),
        Some("Track 11".to_string())
    );
}

// ============================================================================
// Modes
// ============================================================================

#[tokio::test]
async fn modes_toggle_off_when_requested_twice() {
    let h = Harness::new();
    h.coordinator.prepare(playlist(1, &[10, 11]), 10).await.unwrap();

    h.coordinator.set_repeat(RepeatMode::One).await.unwrap();
    assert_eq!(h.settle().await.repeat, RepeatMode::One);
    h.coordinator.set_repeat(RepeatMode::One).await.unwrap();
    assert_eq!(h.settle().await.repeat, RepeatMode::Off);

    h.coordinator.set_shuffle(ShuffleMode::All).await.unwrap();
    assert_eq!(h.settle().await.shuffle, ShuffleMode::All);
    h.coordinator.set_shuffle(ShuffleMode::All).await.unwrap();
    assert_eq!(h.settle().await.shuffle, ShuffleMode::Off);

    assert_eq!(
        h.media_session.modes(),
        (RepeatMode::Off, ShuffleMode::Off)
    );
}

#[tokio::test]
async fn modes_survive_rebinding_the_same_playlist_only() {
    let h = Harness::new();

    h.coordinator.prepare(playlist(1, &[10, 11]), 10).await.unwrap();
    h.coordinator.set_repeat(RepeatMode::One).await.unwrap();

    h.coordinator.prepare(playlist(1, &[10, 11]), 11).await.unwrap();
    assert_eq!(h.settle().await.repeat, RepeatMode::One);
    assert!(h
        .factory
        .last()
        .calls()
        .contains(&TransportCall::Repeat(RepeatMode::One)));

    h.coordinator.prepare(playlist(2, &[20]), 20).await.unwrap();
    assert_eq!(h.settle().await.repeat, RepeatMode::Off);
    assert_eq!(h.media_session.modes().0, RepeatMode::Off);
}

// ============================================================================
// Stop and teardown
// ============================================================================

#[tokio::test]
async fn stop_is_idempotent_and_safe_without_a_session() {
    let h = Harness::new();

    h.coordinator.stop().await.unwrap();
    let snapshot = h.settle().await;
    assert_eq!(snapshot.state, PlaybackState::Stopped);
    assert_eq!(h.focus.requests(), 0);

    h.coordinator.play_pause(playlist(1, &[10]), 10).await.unwrap();
    h.settle().await;
    h.coordinator.stop().await.unwrap();
    h.coordinator.stop().await.unwrap();

    let snapshot = h.settle().await;
    assert_eq!(snapshot.state, PlaybackState::Stopped);
    assert!(!snapshot.is_prepared());
    assert!(!snapshot.focus_held);
    assert!(!snapshot.ticking);
    assert!(!h.focus.is_held());
    assert!(!h.notification.is_visible());
    assert!(h.factory.last().is_released());
}

#[tokio::test]
async fn session_commands_need_a_session() {
    let h = Harness::new();

    for result in [
        h.coordinator.play().await,
        h.coordinator.pause().await,
        h.coordinator.skip_next().await,
        h.coordinator.skip_to_track(1).await,
        h.coordinator.seek_to(0).await,
        h.coordinator.set_repeat(RepeatMode::One).await,
    ] {
        assert!(matches!(result, Err(PlaybackError::NoActiveSession)));
    }
    assert_eq!(h.settle().await.state, PlaybackState::Stopped);
}

#[tokio::test]
async fn invalid_prepare_leaves_state_untouched() {
    let h = Harness::new();

    let empty = Arc::new(core_catalog::PlayList::new(3, "Empty", "https://x", vec![]));
    assert!(matches!(
        h.coordinator.prepare(empty, 1).await,
        Err(PlaybackError::EmptyPlaylist(3))
    ));
    assert!(matches!(
        h.coordinator.prepare(playlist(1, &[10]), 99).await,
        Err(PlaybackError::TrackNotFound(99))
    ));
    assert_eq!(h.factory.created(), 0);

    h.coordinator.prepare(playlist(1, &[10]), 10).await.unwrap();
    assert!(matches!(
        h.coordinator.skip_to_track(42).await,
        Err(PlaybackError::TrackNotFound(42))
    ));
    assert_eq!(h.settle().await.current_ids(), Some((1, 10)));
}

#[tokio::test]
async fn playlist_end_tears_the_session_down() {
    let mut h = Harness::new();

    h.coordinator.play_pause(playlist(1, &[10]), 10).await.unwrap();
    h.settle().await;
    h.factory.last().finish();

    let snapshot = h.settle().await;
    assert_eq!(snapshot.state, PlaybackState::Stopped);
    assert!(!snapshot.foreground);
    assert!(h.factory.last().is_released());
    assert!(!h.focus.is_held());
    assert!(!h.notification.is_visible());
    assert!(h
        .drain_events()
        .iter()
        .any(|event| matches!(event, CoreEvent::Session(SessionEvent::Released { .. }))));
}

#[tokio::test]
async fn shutdown_releases_everything_and_closes() {
    let h = Harness::new();

    h.coordinator.play_pause(playlist(1, &[10]), 10).await.unwrap();
    h.settle().await;
    h.coordinator.shutdown().await;

    assert!(h.factory.last().is_released());
    assert!(!h.focus.is_held());
    assert!(matches!(
        h.coordinator.play().await,
        Err(PlaybackError::CoordinatorClosed)
    ));
    // Second shutdown is harmless.
    h.coordinator.shutdown().await;
}

// ============================================================================
// Focus and routing
// ============================================================================

#[tokio::test]
async fn permanent_focus_loss_pauses_for_good() {
    let h = Harness::new();

    h.coordinator.play_pause(playlist(1, &[10]), 10).await.unwrap();
    h.settle().await;

    h.focus.dispatch(FocusChange::Loss);
    let snapshot = h.settle().await;
    assert_eq!(snapshot.state, PlaybackState::Paused);
    assert_eq!(h.focus.abandons(), 1);

    h.focus.dispatch(FocusChange::Gain);
    let snapshot = h.settle().await;
    assert_eq!(snapshot.state, PlaybackState::Paused);
    assert!(!h.factory.last().is_playing());
}

#[tokio::test]
async fn transient_focus_loss_resumes_on_gain() {
    let h = Harness::new();

    h.coordinator.play_pause(playlist(1, &[10]), 10).await.unwrap();
    h.settle().await;

    h.focus.dispatch(FocusChange::LossTransient);
    assert_eq!(h.settle().await.state, PlaybackState::Paused);
    assert_eq!(h.focus.abandons(), 0);

    h.focus.dispatch(FocusChange::Gain);
    assert_eq!(h.settle().await.state, PlaybackState::Playing);
    assert_eq!(h.focus.requests(), 1);
}

#[tokio::test]
async fn permanent_loss_after_transient_loss_gives_focus_back() {
    let h = Harness::new();

    h.coordinator.play_pause(playlist(1, &[10]), 10).await.unwrap();
    h.settle().await;

    h.focus.dispatch(FocusChange::LossTransient);
    assert_eq!(h.settle().await.state, PlaybackState::Paused);
    assert_eq!(h.focus.abandons(), 0);

    h.focus.dispatch(FocusChange::Loss);
    let snapshot = h.settle().await;
    assert_eq!(snapshot.state, PlaybackState::Paused);
    assert!(!snapshot.focus_held);
    assert!(!h.focus.is_held());
    assert_eq!(h.focus.abandons(), 1);

    h.focus.dispatch(FocusChange::Gain);
    assert_eq!(h.settle().await.state, PlaybackState::Paused);
    assert!(!h.factory.last().is_playing());

    // Playing again asks the OS anew.
    h.coordinator.play().await.unwrap();
    assert_eq!(h.settle().await.state, PlaybackState::Playing);
    assert_eq!(h.focus.requests(), 2);
}

#[tokio::test]
async fn ducking_lowers_and_gain_restores_volume() {
    let h = Harness::with_config(PlaybackConfig::default().with_duck_volume(0.2));

    h.coordinator.play_pause(playlist(1, &[10]), 10).await.unwrap();
    h.settle().await;

    h.focus.dispatch(FocusChange::LossTransientCanDuck);
    let snapshot = h.settle().await;
    assert_eq!(snapshot.state, PlaybackState::Playing);
    assert_eq!(h.factory.last().volume(), 0.2);

    h.focus.dispatch(FocusChange::Gain);
    h.settle().await;
    assert_eq!(h.factory.last().volume(), 1.0);
}

#[tokio::test]
async fn denied_focus_leaves_playback_paused() {
    let mut h = Harness::new();
    h.focus.deny();

    let result = h.coordinator.play_pause(playlist(1, &[10]), 10).await;
    assert!(matches!(result, Err(PlaybackError::FocusDenied)));

    let snapshot = h.settle().await;
    assert_eq!(snapshot.state, PlaybackState::Paused);
    assert!(!h.factory.last().is_playing());
    assert!(h
        .drain_events()
        .contains(&CoreEvent::Playback(PlaybackEvent::FocusDenied)));

    h.focus.allow();
    h.coordinator.play().await.unwrap();
    assert_eq!(h.settle().await.state, PlaybackState::Playing);
}

#[tokio::test]
async fn becoming_noisy_pauses() {
    let h = Harness::new();

    h.coordinator.play_pause(playlist(1, &[10]), 10).await.unwrap();
    h.settle().await;
    assert!(h.route.is_registered());

    h.route.unplug_headphones();
    assert_eq!(h.settle().await.state, PlaybackState::Paused);
    assert!(!h.route.is_registered());
}

// ============================================================================
// Transport failures
// ============================================================================

#[tokio::test]
async fn transport_error_surfaces_and_play_rebuilds() {
    let mut h = Harness::new();

    h.coordinator.play_pause(playlist(1, &[10, 11]), 11).await.unwrap();
    h.settle().await;
    h.factory.last().fail("decoder crashed");

    let snapshot = h.settle().await;
    assert_eq!(snapshot.state, PlaybackState::Error);
    assert!(!snapshot.ticking);
    assert!(!h.focus.is_held());
    assert!(h.drain_events().contains(&CoreEvent::Playback(PlaybackEvent::Error {
        message: "decoder crashed".to_string(),
        recoverable: true,
    })));

    h.coordinator.play().await.unwrap();
    let snapshot = h.settle().await;
    assert_eq!(snapshot.state, PlaybackState::Playing);
    assert_eq!(snapshot.current_ids(), Some((1, 11)));
    assert_eq!(h.factory.created(), 2);
    assert!(h.factory.transport(0).is_released());
}

#[tokio::test]
async fn callbacks_from_released_transports_are_ignored() {
    let h = Harness::new();

    h.coordinator.prepare(playlist(1, &[10]), 10).await.unwrap();
    h.coordinator.prepare(playlist(2, &[20]), 20).await.unwrap();
    h.settle().await;

    h.factory.transport(0).emit_stale(TransportStatus::Ended, false);
    let snapshot = h.settle().await;
    assert!(snapshot.is_prepared());
    assert_eq!(snapshot.current_ids(), Some((2, 20)));
    assert_eq!(snapshot.state, PlaybackState::Paused);
}

// ============================================================================
// Elapsed time
// ============================================================================

#[tokio::test(start_paused = true)]
async fn ticks_only_while_playing() {
    let mut h = Harness::new();

    h.coordinator.play_pause(playlist(1, &[10]), 10).await.unwrap();
    assert!(h.settle().await.ticking);
    h.drain_events();

    tokio::time::sleep(Duration::from_millis(3_500)).await;
    let ticks = elapsed_events(&h.drain_events());
    assert!((3..=4).contains(&ticks), "got {} ticks", ticks);

    h.coordinator.pause().await.unwrap();
    assert!(!h.settle().await.ticking);
    h.drain_events();

    tokio::time::sleep(Duration::from_millis(5_000)).await;
    assert_eq!(elapsed_events(&h.drain_events()), 0);
}

// ============================================================================
// End to end
// ============================================================================

#[tokio::test]
async fn listen_skip_and_stop() {
    let mut h = Harness::new();
    let p1 = playlist(1, &[1, 2]);

    h.coordinator.play_pause(p1.clone(), 1).await.unwrap();
    assert_eq!(h.settle().await.state, PlaybackState::Playing);
    assert_eq!(
        h.drain_states(),
        vec![PlaybackState::Buffering, PlaybackState::Playing]
    );

    h.coordinator.play_pause(p1.clone(), 2).await.unwrap();
    let snapshot = h.settle().await;
    assert_eq!(snapshot.state, PlaybackState::Playing);
    assert_eq!(snapshot.current_ids(), Some((1, 2)));

    h.coordinator.skip_next().await.unwrap();
    let snapshot = h.settle().await;
    assert_eq!(snapshot.state, PlaybackState::Playing);
    assert_eq!(snapshot.current_ids(), Some((1, 1)));

    h.coordinator.stop().await.unwrap();
    let snapshot = h.settle().await;
    assert_eq!(snapshot.state, PlaybackState::Stopped);
    assert!(!h.focus.is_held());
    assert!(!h.notification.is_visible());
    assert_eq!(h.media_session.states().last(), Some(&PlaybackState::Stopped));
    assert_eq!(h.factory.created(), 1);
}
