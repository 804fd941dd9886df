use crate::CandidateFile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobState {
    #[default]
    Idle,
    FileSelected,
    Uploading,
    Processing,
    Completed,
    Failed,
}

impl JobState {
    pub fn label(self) -> &'static str {
        match self {
            JobState::Idle => "Idle",
            JobState::FileSelected => "File selected",
            JobState::Uploading => "Uploading",
            JobState::Processing => "Processing",
            JobState::Completed => "Completed",
            JobState::Failed => "Failed",
        }
    }

    pub fn is_in_flight(self) -> bool {
        matches!(self, JobState::Uploading | JobState::Processing)
    }
}

/// The single active job.
///
/// Fields only change through the transition methods below, which keep the
/// artifact tied to `Completed`, the error tied to `Failed`, and identity and
/// progress absent before processing starts.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Job {
    state: JobState,
    file: Option<CandidateFile>,
    server_filename: Option<String>,
    progress_percent: u8,
    processed_frames: u64,
    total_frames: u64,
    output_artifact: Option<String>,
    last_error: Option<String>,
}

impl Job {
    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn file(&self) -> Option<&CandidateFile> {
        self.file.as_ref()
    }

    pub fn server_filename(&self) -> Option<&str> {
        self.server_filename.as_deref()
    }

    pub fn progress_percent(&self) -> u8 {
        self.progress_percent
    }

    pub fn processed_frames(&self) -> u64 {
        self.processed_frames
    }

    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    pub fn output_artifact(&self) -> Option<&str> {
        self.output_artifact.as_deref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub(crate) fn select_file(&mut self, file: CandidateFile) {
        *self = Job {
            state: JobState::FileSelected,
            file: Some(file),
            ..Job::default()
        };
    }

    pub(crate) fn begin_upload(&mut self) {
        self.state = JobState::Uploading;
    }

    /// Upload or process-start was refused; the file stays selected.
    pub(crate) fn return_to_selected(&mut self) {
        self.state = JobState::FileSelected;
        self.server_filename = None;
        self.clear_progress();
    }

    pub(crate) fn start_processing(&mut self, server_filename: String) {
        self.state = JobState::Processing;
        self.server_filename = Some(server_filename);
        self.clear_progress();
    }

    /// Returns `true` when anything visible changed. The percent never moves
    /// backwards while processing.
    pub(crate) fn apply_progress(
        &mut self,
        percent: Option<u8>,
        processed_frames: Option<u64>,
        total_frames: Option<u64>,
    ) -> bool {
        let before = (self.progress_percent, self.processed_frames, self.total_frames);
        if let Some(percent) = percent {
            self.progress_percent = self.progress_percent.max(percent.min(100));
        }
        if let Some(processed) = processed_frames {
            self.processed_frames = processed;
        }
        if let Some(total) = total_frames {
            self.total_frames = total;
        }
        before != (self.progress_percent, self.processed_frames, self.total_frames)
    }

    pub(crate) fn complete(&mut self, artifact: String) {
        self.state = JobState::Completed;
        self.output_artifact = Some(artifact);
        self.last_error = None;
    }

    pub(crate) fn fail(&mut self, error: String) {
        self.state = JobState::Failed;
        self.last_error = Some(error);
        self.output_artifact = None;
    }

    pub(crate) fn reset(&mut self) {
        *self = Job::default();
    }

    fn clear_progress(&mut self) {
        self.progress_percent = 0;
        self.processed_frames = 0;
        self.total_frames = 0;
    }
}
