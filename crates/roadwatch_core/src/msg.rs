use crate::{CandidateFile, ConnectionId, Generation, HealthReport, ProgressUpdate};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Application finished starting; kicks off the health check and channel.
    AppStarted,
    /// Result of the one-time readiness probe.
    HealthChecked(Result<HealthReport, String>),
    /// User picked or dropped a file.
    FileChosen(CandidateFile),
    /// User asked to process the selected file.
    SubmitClicked,
    /// Upload response for a submission.
    UploadFinished {
        generation: Generation,
        result: Result<String, String>,
    },
    /// Process-start response for a submission.
    ProcessingStarted {
        generation: Generation,
        filename: String,
        result: Result<(), String>,
    },
    /// Push channel connected.
    ChannelOpened { connection: ConnectionId },
    /// Push channel dropped; a reconnect is already scheduled.
    ChannelClosed { connection: ConnectionId },
    /// Decoded push message.
    ChannelEvent {
        connection: ConnectionId,
        update: ProgressUpdate,
    },
    /// Status poll result for a submission.
    StatusPolled {
        generation: Generation,
        update: ProgressUpdate,
    },
    /// User clicked "open" on the result panel.
    OpenResultClicked,
    /// User clicked "download" on the result panel.
    DownloadClicked,
    /// User asked to start over.
    ResetClicked,
    /// Render tick.
    Tick,
    NoOp,
}
