use crate::{CandidateFile, Generation};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    CheckHealth,
    ConnectChannel,
    Upload {
        generation: Generation,
        file: CandidateFile,
    },
    StartProcessing {
        generation: Generation,
        filename: String,
    },
    StartStatusPoll { generation: Generation },
    StopStatusPoll,
    Notify { message: String, severity: Severity },
    OpenArtifact { url: String },
    DownloadArtifact { url: String, filename: String },
}

impl Effect {
    pub(crate) fn notify(message: impl Into<String>, severity: Severity) -> Self {
        Effect::Notify {
            message: message.into(),
            severity,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
    Warning,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Success => "success",
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }
}
