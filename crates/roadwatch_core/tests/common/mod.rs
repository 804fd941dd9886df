#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Once;

use roadwatch_core::{update, AppState, CandidateFile, Effect, Generation, Msg, ProgressUpdate};

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(roadwatch_logging::initialize_for_tests);
}

pub fn video(name: &str) -> CandidateFile {
    CandidateFile {
        path: PathBuf::from("/videos").join(name),
        name: name.to_string(),
        media_type: Some("video/mp4".to_string()),
        size_bytes: 4 * 1024 * 1024,
    }
}

pub fn selected(state: AppState, name: &str) -> AppState {
    let (state, effects) = update(state, Msg::FileChosen(video(name)));
    assert!(effects.is_empty());
    state
}

pub fn upload_generation(effects: &[Effect]) -> Generation {
    effects
        .iter()
        .find_map(|effect| match effect {
            Effect::Upload { generation, .. } => Some(*generation),
            _ => None,
        })
        .expect("upload effect")
}

/// Drives a fresh state through selection, upload and process start.
pub fn processing(state: AppState, server_filename: &str) -> (AppState, Generation) {
    let state = selected(state, server_filename);
    let (state, effects) = update(state, Msg::SubmitClicked);
    let generation = upload_generation(&effects);
    let (state, _) = update(
        state,
        Msg::UploadFinished {
            generation,
            result: Ok(server_filename.to_string()),
        },
    );
    let (state, _) = update(
        state,
        Msg::ProcessingStarted {
            generation,
            filename: server_filename.to_string(),
            result: Ok(()),
        },
    );
    (state, generation)
}

pub fn open_channel(state: AppState, connection: u64) -> AppState {
    let (state, effects) = update(state, Msg::ChannelOpened { connection });
    assert!(effects.is_empty());
    state
}

pub fn channel_event(state: AppState, connection: u64, update_msg: ProgressUpdate) -> (AppState, Vec<Effect>) {
    update(
        state,
        Msg::ChannelEvent {
            connection,
            update: update_msg,
        },
    )
}
