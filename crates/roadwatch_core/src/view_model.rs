use crate::{ArtifactLinks, BackendStatus, JobState};

/// Everything a renderer needs, derived from `AppState`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppViewModel {
    pub job_state: JobState,
    pub file_name: Option<String>,
    pub file_size: Option<String>,
    pub server_filename: Option<String>,
    pub progress_percent: u8,
    pub processed_frames: u64,
    pub total_frames: u64,
    pub phase_label: Option<String>,
    pub ring_offset: f64,
    pub artifact: Option<ArtifactLinks>,
    pub last_error: Option<String>,
    pub last_failure: Option<String>,
    pub backend: BackendStatus,
    pub channel_open: bool,
    pub dirty: bool,
}
