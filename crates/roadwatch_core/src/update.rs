use roadwatch_logging::{rw_debug, rw_info, rw_warn};

use crate::{
    validate, AppState, BackendStatus, CandidateFile, ConnectionId, Effect, ErrorRecovery,
    Generation, HealthReport, JobState, Msg, ProgressUpdate, Severity,
};

const NO_FILE_SELECTED: &str = "Please select a video file first";
const ALREADY_PROCESSING: &str = "A video is already being processed.";
const START_OVER_FIRST: &str = "Start over to process another video.";
const UPLOADING: &str = "Uploading video...";
const PROCESSING_COMPLETE: &str = "Video processing complete!";
const MODEL_NOT_LOADED: &str = "Warning: YOLO model not loaded. Please check model path.";
const BACKEND_UNREACHABLE: &str = "Error connecting to server";
const NO_ARTIFACT: &str = "No video available. Please process a video first.";
const OPENING_ARTIFACT: &str = "Opening video in new tab";
const DOWNLOAD_STARTED: &str = "Download started";

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::AppStarted => vec![Effect::CheckHealth, Effect::ConnectChannel],
        Msg::HealthChecked(result) => apply_health(&mut state, result),
        Msg::FileChosen(file) => choose_file(&mut state, file),
        Msg::SubmitClicked => submit(&mut state),
        Msg::UploadFinished { generation, result } => {
            if !accepts_response(&state, generation, "upload") {
                return (state, Vec::new());
            }
            match result {
                Ok(filename) => {
                    rw_info!("Upload accepted as {} (generation {})", filename, generation);
                    vec![Effect::StartProcessing {
                        generation,
                        filename,
                    }]
                }
                Err(detail) => refuse_submission(&mut state, detail),
            }
        }
        Msg::ProcessingStarted {
            generation,
            filename,
            result,
        } => {
            if !accepts_response(&state, generation, "process-start") {
                return (state, Vec::new());
            }
            match result {
                Ok(()) => start_processing(&mut state, generation, filename),
                Err(detail) => refuse_submission(&mut state, detail),
            }
        }
        Msg::ChannelOpened { connection } => {
            if state.channel_opened(connection) {
                rw_info!("Push channel connection {} is current", connection);
            } else {
                rw_debug!("Ignoring open of superseded connection {}", connection);
            }
            Vec::new()
        }
        Msg::ChannelClosed { connection } => {
            if state.channel_closed(connection) {
                rw_warn!("Push channel connection {} closed", connection);
            }
            Vec::new()
        }
        Msg::ChannelEvent { connection, update } => {
            if !state.is_current_connection(connection) {
                rw_debug!("Dropping event from stale connection {}", connection);
                return (state, Vec::new());
            }
            apply_update(&mut state, update, Source::Channel(connection))
        }
        Msg::StatusPolled { generation, update } => {
            if !state.is_current(generation) || !state.is_status_poll_active() {
                rw_debug!("Dropping status poll for generation {}", generation);
                return (state, Vec::new());
            }
            apply_update(&mut state, update, Source::StatusPoll)
        }
        Msg::OpenResultClicked => match state.artifact_links() {
            Some(links) => vec![
                Effect::OpenArtifact {
                    url: links.viewer_url,
                },
                Effect::notify(OPENING_ARTIFACT, Severity::Success),
            ],
            None => vec![Effect::notify(NO_ARTIFACT, Severity::Error)],
        },
        Msg::DownloadClicked => match state.artifact_links() {
            Some(links) => vec![
                Effect::DownloadArtifact {
                    url: links.download_url,
                    filename: links.download_filename,
                },
                Effect::notify(DOWNLOAD_STARTED, Severity::Success),
            ],
            None => vec![Effect::notify(NO_ARTIFACT, Severity::Error)],
        },
        Msg::ResetClicked => {
            let mut effects = Vec::new();
            reset_job(&mut state, &mut effects);
            state.set_last_failure(None);
            effects
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

#[derive(Debug, Clone, Copy)]
enum Source {
    Channel(ConnectionId),
    StatusPoll,
}

fn apply_health(state: &mut AppState, result: Result<HealthReport, String>) -> Vec<Effect> {
    match result {
        Ok(report) if report.is_ready() => {
            state.set_backend(BackendStatus::Ready);
            Vec::new()
        }
        Ok(report) => {
            rw_warn!(
                "Backend reports status={} model_loaded={}",
                report.status,
                report.model_loaded
            );
            state.set_backend(BackendStatus::ModelNotLoaded);
            vec![Effect::notify(MODEL_NOT_LOADED, Severity::Warning)]
        }
        Err(detail) => {
            rw_warn!("Health check failed: {}", detail);
            state.set_backend(BackendStatus::Unreachable);
            vec![Effect::notify(BACKEND_UNREACHABLE, Severity::Error)]
        }
    }
}

fn choose_file(state: &mut AppState, file: CandidateFile) -> Vec<Effect> {
    match state.job().state() {
        JobState::Idle | JobState::FileSelected => {}
        JobState::Uploading | JobState::Processing => {
            return vec![Effect::notify(ALREADY_PROCESSING, Severity::Warning)];
        }
        JobState::Completed | JobState::Failed => {
            return vec![Effect::notify(START_OVER_FIRST, Severity::Warning)];
        }
    }

    if let Err(rejection) = validate(&file) {
        rw_info!("Rejected {}: {}", file.name, rejection);
        return vec![Effect::notify(rejection.to_string(), Severity::Error)];
    }

    rw_info!("Selected {} ({} bytes)", file.name, file.size_bytes);
    state.job_mut().select_file(file);
    state.set_last_failure(None);
    Vec::new()
}

fn submit(state: &mut AppState) -> Vec<Effect> {
    let file = match state.job().state() {
        JobState::FileSelected => state.job().file().cloned(),
        JobState::Idle => None,
        JobState::Uploading | JobState::Processing => {
            return vec![Effect::notify(ALREADY_PROCESSING, Severity::Warning)];
        }
        JobState::Completed | JobState::Failed => {
            return vec![Effect::notify(START_OVER_FIRST, Severity::Warning)];
        }
    };
    let Some(file) = file else {
        return vec![Effect::notify(NO_FILE_SELECTED, Severity::Error)];
    };

    let generation = state.next_generation();
    state.job_mut().begin_upload();
    rw_info!("Submitting {} (generation {})", file.name, generation);
    vec![
        Effect::notify(UPLOADING, Severity::Success),
        Effect::Upload { generation, file },
    ]
}

fn accepts_response(state: &AppState, generation: Generation, what: &str) -> bool {
    if state.is_current(generation) && state.job().state() == JobState::Uploading {
        return true;
    }
    rw_debug!(
        "Discarding stale {} response (generation {}, current {}, state {:?})",
        what,
        generation,
        state.generation(),
        state.job().state()
    );
    false
}

fn refuse_submission(state: &mut AppState, detail: String) -> Vec<Effect> {
    rw_warn!("Submission refused: {}", detail);
    state.job_mut().return_to_selected();
    vec![Effect::notify(detail, Severity::Error)]
}

fn start_processing(state: &mut AppState, generation: Generation, filename: String) -> Vec<Effect> {
    rw_info!("Processing started for {}", filename);
    state.job_mut().start_processing(filename);
    if state.options().status_poll {
        state.set_status_poll_active(true);
        vec![Effect::StartStatusPoll { generation }]
    } else {
        Vec::new()
    }
}

/// Progress, output and error are applied in that order; any combination may
/// arrive in one message.
fn apply_update(state: &mut AppState, update: ProgressUpdate, source: Source) -> Vec<Effect> {
    if state.job().state() != JobState::Processing {
        rw_debug!(
            "Ignoring {:?} update while {:?}",
            source,
            state.job().state()
        );
        return Vec::new();
    }

    let mut effects = Vec::new();
    state.apply_progress(&update);

    if let Some(output_file) = update.output_file {
        rw_info!("Job completed with artifact {}", output_file);
        state.job_mut().complete(output_file);
        stop_status_poll(state, &mut effects);
        effects.push(Effect::notify(PROCESSING_COMPLETE, Severity::Success));
    }

    if let Some(error) = update.error {
        rw_warn!("Backend reported processing error: {}", error);
        effects.push(Effect::notify(
            format!("Processing error: {error}"),
            Severity::Error,
        ));
        match state.options().error_recovery {
            ErrorRecovery::Discard => {
                reset_job(state, &mut effects);
                state.set_last_failure(Some(error));
            }
            ErrorRecovery::Retain => {
                stop_status_poll(state, &mut effects);
                state.job_mut().fail(error);
            }
        }
    }

    effects
}

fn stop_status_poll(state: &mut AppState, effects: &mut Vec<Effect>) {
    if state.is_status_poll_active() {
        state.set_status_poll_active(false);
        effects.push(Effect::StopStatusPoll);
    }
}

/// Returns the job to `Idle`. A job that was not idle gets a new generation so
/// responses still in flight for it are dropped on arrival.
fn reset_job(state: &mut AppState, effects: &mut Vec<Effect>) {
    stop_status_poll(state, effects);
    if state.job().state() != JobState::Idle {
        let generation = state.next_generation();
        rw_info!("Job reset (generation now {})", generation);
        state.job_mut().reset();
    }
}
