mod common;

use common::{channel_event, init_logging, open_channel, processing, selected};
use pretty_assertions::assert_eq;
use roadwatch_core::{
    update, AppState, ControllerOptions, Effect, JobState, Msg, ProgressUpdate, Severity,
};

#[test]
fn reset_twice_leaves_identical_idle_state() {
    init_logging();
    let (state, _) = processing(AppState::new(), "a.mp4");
    let state = open_channel(state, 3);
    let (state, _) = channel_event(state, 3, ProgressUpdate::percent(40));

    let (mut once, effects) = update(state, Msg::ResetClicked);
    assert!(effects.is_empty());
    assert!(once.consume_dirty());
    let (mut twice, effects) = update(once.clone(), Msg::ResetClicked);
    assert!(effects.is_empty());
    assert!(!twice.consume_dirty());

    assert_eq!(once, twice);
    assert_eq!(twice.job().state(), JobState::Idle);
    assert_eq!(twice.job().file(), None);
    assert_eq!(twice.job().progress_percent(), 0);
    assert_eq!(twice.job().processed_frames(), 0);
    assert_eq!(twice.job().total_frames(), 0);
    assert!(twice.is_channel_open());
}

#[test]
fn reset_from_completed_releases_artifact() {
    init_logging();
    let (state, _) = processing(AppState::new(), "a.mp4");
    let state = open_channel(state, 1);
    let done = ProgressUpdate {
        output_file: Some("a_processed.mp4".to_string()),
        ..ProgressUpdate::percent(100)
    };
    let (state, _) = channel_event(state, 1, done);
    assert!(state.artifact_links().is_some());

    let (state, _) = update(state, Msg::ResetClicked);
    assert_eq!(state.job().output_artifact(), None);
    assert_eq!(state.artifact_links(), None);
    assert_eq!(state.view().ring_offset, roadwatch_core::RING_CIRCUMFERENCE);
}

#[test]
fn reset_stops_active_status_poll() {
    init_logging();
    let options = ControllerOptions {
        status_poll: true,
        ..ControllerOptions::default()
    };
    let (state, generation) = processing(AppState::with_options(options), "a.mp4");
    assert!(state.is_status_poll_active());

    let (state, effects) = update(state, Msg::ResetClicked);
    assert_eq!(effects, vec![Effect::StopStatusPoll]);

    let (state, effects) = update(
        state,
        Msg::StatusPolled {
            generation,
            update: ProgressUpdate::percent(90),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.job().state(), JobState::Idle);
}

#[test]
fn reset_clears_last_failure() {
    init_logging();
    let (state, _) = processing(AppState::new(), "a.mp4");
    let state = open_channel(state, 1);
    let failure = ProgressUpdate {
        error: Some("decode failed".to_string()),
        ..ProgressUpdate::default()
    };
    let (state, _) = channel_event(state, 1, failure);
    assert_eq!(state.last_failure(), Some("decode failed"));

    let (state, _) = update(state, Msg::ResetClicked);
    assert_eq!(state.last_failure(), None);
}

#[test]
fn result_actions_require_completion() {
    init_logging();
    let state = selected(AppState::new(), "a.mp4");
    let (_, effects) = update(state, Msg::OpenResultClicked);
    assert_eq!(
        effects,
        vec![Effect::Notify {
            message: "No video available. Please process a video first.".to_string(),
            severity: Severity::Error,
        }]
    );

    let (state, _) = processing(AppState::new(), "clip.mp4");
    let state = open_channel(state, 1);
    let done = ProgressUpdate {
        output_file: Some("clip.mp4".to_string()),
        ..ProgressUpdate::percent(100)
    };
    let (state, _) = channel_event(state, 1, done);

    let (state, effects) = update(state, Msg::OpenResultClicked);
    assert_eq!(
        effects[0],
        Effect::OpenArtifact {
            url: "/outputs/clip.avi".to_string()
        }
    );
    let (_, effects) = update(state, Msg::DownloadClicked);
    assert_eq!(
        effects[0],
        Effect::DownloadArtifact {
            url: "/outputs/clip.avi".to_string(),
            filename: "clip.avi".to_string(),
        }
    );
}

#[test]
fn tick_and_noop_change_nothing() {
    let state = selected(AppState::new(), "a.mp4");
    for msg in [Msg::Tick, Msg::NoOp] {
        let (next, effects) = update(state.clone(), msg);
        assert_eq!(next, state);
        assert!(effects.is_empty());
    }
}
