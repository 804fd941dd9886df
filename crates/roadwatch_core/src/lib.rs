//! Roadwatch core: the job lifecycle state machine and view-model helpers.
//!
//! Nothing here performs IO. `update` takes the current state and one message
//! and returns the next state plus the effects the caller must run.
mod artifact;
mod effect;
mod file_gate;
mod job;
mod msg;
mod progress;
mod state;
mod update;
mod view_model;

pub use artifact::{served_filename, ArtifactLinks, OUTPUT_ROOT};
pub use effect::{Effect, Severity};
pub use file_gate::{
    format_file_size, media_type_for_name, validate, CandidateFile, Rejection, MAX_FILE_BYTES,
};
pub use job::{Job, JobState};
pub use msg::Msg;
pub use progress::{phase_label, ring_offset, Phase, ProgressUpdate, RING_CIRCUMFERENCE};
pub use state::{
    AppState, BackendStatus, ConnectionId, ControllerOptions, ErrorRecovery, Generation,
    HealthReport,
};
pub use update::update;
pub use view_model::AppViewModel;
