use crate::artifact::ArtifactLinks;
use crate::file_gate::format_file_size;
use crate::progress::{phase_label, ring_offset};
use crate::view_model::AppViewModel;
use crate::{Job, JobState, ProgressUpdate};

/// Submission generation. Bumped on every submit and every reset so late
/// responses from an abandoned submission can be recognised and dropped.
pub type Generation = u64;

/// Push-channel connection id. Each connection attempt gets a fresh, larger id.
pub type ConnectionId = u64;

/// What to do with the job when the backend reports a processing error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorRecovery {
    /// Drop the job and return to a clean `Idle`; the message survives as the
    /// last failure.
    #[default]
    Discard,
    /// Keep the job in `Failed` with its progress for inspection.
    Retain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendStatus {
    #[default]
    Unknown,
    Ready,
    ModelNotLoaded,
    Unreachable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthReport {
    pub status: String,
    pub model_loaded: bool,
}

impl HealthReport {
    pub fn is_ready(&self) -> bool {
        self.status == "healthy" && self.model_loaded
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControllerOptions {
    pub error_recovery: ErrorRecovery,
    /// Poll `/api/status` while processing, as a fallback for a silent channel.
    pub status_poll: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct ChannelStatus {
    current: Option<ConnectionId>,
    open: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    job: Job,
    generation: Generation,
    channel: ChannelStatus,
    backend: BackendStatus,
    options: ControllerOptions,
    status_poll_active: bool,
    last_failure: Option<String>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ControllerOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn job(&self) -> &Job {
        &self.job
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn options(&self) -> ControllerOptions {
        self.options
    }

    pub fn backend(&self) -> BackendStatus {
        self.backend
    }

    pub fn current_connection(&self) -> Option<ConnectionId> {
        self.channel.current
    }

    pub fn is_channel_open(&self) -> bool {
        self.channel.open
    }

    pub fn is_status_poll_active(&self) -> bool {
        self.status_poll_active
    }

    pub fn last_failure(&self) -> Option<&str> {
        self.last_failure.as_deref()
    }

    pub fn artifact_links(&self) -> Option<ArtifactLinks> {
        match self.job.state() {
            JobState::Completed => self.job.output_artifact().map(ArtifactLinks::for_output),
            _ => None,
        }
    }

    pub fn view(&self) -> AppViewModel {
        let job = &self.job;
        let in_progress = job.state().is_in_flight();
        AppViewModel {
            job_state: job.state(),
            file_name: job.file().map(|file| file.name.clone()),
            file_size: job.file().map(|file| format_file_size(file.size_bytes)),
            server_filename: job.server_filename().map(ToOwned::to_owned),
            progress_percent: job.progress_percent(),
            processed_frames: job.processed_frames(),
            total_frames: job.total_frames(),
            phase_label: (job.state() == JobState::Processing).then(|| {
                phase_label(
                    job.progress_percent(),
                    job.processed_frames(),
                    job.total_frames(),
                )
            }),
            ring_offset: if in_progress || job.state() == JobState::Completed {
                ring_offset(job.progress_percent())
            } else {
                ring_offset(0)
            },
            artifact: self.artifact_links(),
            last_error: job.last_error().map(ToOwned::to_owned),
            last_failure: self.last_failure.clone(),
            backend: self.backend,
            channel_open: self.channel.open,
            dirty: self.dirty,
        }
    }

    /// Returns whether anything changed since the last call and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn job_mut(&mut self) -> &mut Job {
        self.dirty = true;
        &mut self.job
    }

    /// Applies progress fields without a state transition; only a visible
    /// change marks the state dirty.
    pub(crate) fn apply_progress(&mut self, update: &ProgressUpdate) {
        if self
            .job
            .apply_progress(update.progress, update.processed_frames, update.total_frames)
        {
            self.dirty = true;
        }
    }

    pub(crate) fn next_generation(&mut self) -> Generation {
        self.generation += 1;
        self.generation
    }

    pub(crate) fn is_current(&self, generation: Generation) -> bool {
        generation == self.generation
    }

    pub(crate) fn set_backend(&mut self, backend: BackendStatus) {
        if self.backend != backend {
            self.backend = backend;
            self.dirty = true;
        }
    }

    /// Accepts the connection as current unless a newer one already opened.
    pub(crate) fn channel_opened(&mut self, connection: ConnectionId) -> bool {
        if self.channel.current.is_some_and(|current| current > connection) {
            return false;
        }
        self.channel = ChannelStatus {
            current: Some(connection),
            open: true,
        };
        self.dirty = true;
        true
    }

    pub(crate) fn channel_closed(&mut self, connection: ConnectionId) -> bool {
        if self.channel.current != Some(connection) || !self.channel.open {
            return false;
        }
        self.channel.open = false;
        self.dirty = true;
        true
    }

    pub(crate) fn is_current_connection(&self, connection: ConnectionId) -> bool {
        self.channel.open && self.channel.current == Some(connection)
    }

    pub(crate) fn set_status_poll_active(&mut self, active: bool) {
        self.status_poll_active = active;
    }

    pub(crate) fn set_last_failure(&mut self, failure: Option<String>) {
        if self.last_failure != failure {
            self.last_failure = failure;
            self.dirty = true;
        }
    }
}
