use std::path::PathBuf;

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;

pub type Generation = u64;
pub type ConnectionId = u64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Non-2xx response. `detail` is the backend's `{"detail": ...}` text when
    /// it sent one.
    #[error("http status {status}{}", detail_suffix(.detail))]
    Rejected { status: u16, detail: Option<String> },
    #[error("request timed out")]
    Timeout,
    #[error("network error: {0}")]
    Network(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("io error: {0}")]
    Io(String),
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail
        .as_deref()
        .map(|detail| format!(": {detail}"))
        .unwrap_or_default()
}

impl ApiError {
    /// Text to show the user: the server's detail when present, `fallback` for
    /// a bare rejection, the error itself otherwise.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Rejected {
                detail: Some(detail),
                ..
            } => detail.clone(),
            ApiError::Rejected { detail: None, .. } => fallback.to_string(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    #[error("connect failed: {0}")]
    Connect(String),
    #[error("transport error: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub model_loaded: bool,
}

/// One push-channel message. Every field is optional, and a counter that is
/// negative or not a number reads as absent so the rest of the frame survives.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct ProgressMessage {
    #[serde(default, deserialize_with = "lenient_percent")]
    pub progress: Option<u32>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub processed_frames: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub total_frames: Option<u64>,
    pub output_file: Option<String>,
    pub error: Option<String>,
    pub is_processing: Option<bool>,
}

impl ProgressMessage {
    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Percent clamped to 0..=100.
    pub fn percent(&self) -> Option<u8> {
        self.progress
            .map(|progress| u8::try_from(progress.min(100)).unwrap_or(100))
    }
}

/// Body of `GET /api/status`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct StatusReport {
    pub is_processing: bool,
    #[serde(deserialize_with = "percent_or_zero")]
    pub progress: u32,
    pub current_file: Option<String>,
    pub error: Option<String>,
    #[serde(deserialize_with = "count_or_zero")]
    pub total_frames: u64,
    #[serde(deserialize_with = "count_or_zero")]
    pub processed_frames: u64,
    pub output_file: Option<String>,
}

impl StatusReport {
    /// The status record outlives jobs, so terminal fields are only trusted
    /// once the backend says it stopped processing, and progress only while it
    /// is still running.
    pub fn into_message(self) -> ProgressMessage {
        if self.is_processing {
            return ProgressMessage {
                progress: Some(self.progress),
                processed_frames: Some(self.processed_frames),
                total_frames: Some(self.total_frames),
                is_processing: Some(true),
                ..ProgressMessage::default()
            };
        }
        if let Some(error) = self.error {
            return ProgressMessage {
                error: Some(error),
                is_processing: Some(false),
                ..ProgressMessage::default()
            };
        }
        match self.output_file {
            Some(output_file) => ProgressMessage {
                progress: Some(100),
                processed_frames: Some(self.total_frames),
                total_frames: Some(self.total_frames),
                output_file: Some(output_file),
                is_processing: Some(false),
                error: None,
            },
            None => ProgressMessage::default(),
        }
    }
}

/// Non-negative integer value of `value`. Fractional numbers are truncated;
/// negatives, strings and nulls give `None`.
fn as_count(value: &Value) -> Option<u64> {
    value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|number| number.is_finite() && *number >= 0.0)
            .map(|number| number as u64)
    })
}

fn lenient_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(as_count))
}

fn lenient_percent<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    Ok(lenient_count(deserializer)?.map(|count| u32::try_from(count).unwrap_or(u32::MAX)))
}

fn count_or_zero<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    Ok(lenient_count(deserializer)?.unwrap_or(0))
}

fn percent_or_zero<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    Ok(lenient_percent(deserializer)?.unwrap_or(0))
}

/// A file ready to be sent to `/api/upload`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub path: PathBuf,
    pub file_name: String,
    pub media_type: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationSeverity {
    Success,
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    Opened { connection: ConnectionId },
    Message {
        connection: ConnectionId,
        message: ProgressMessage,
    },
    Closed { connection: ConnectionId },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    HealthChecked(Result<HealthResponse, ApiError>),
    UploadFinished {
        generation: Generation,
        result: Result<String, ApiError>,
    },
    ProcessingStarted {
        generation: Generation,
        filename: String,
        result: Result<(), ApiError>,
    },
    Channel(ChannelEvent),
    StatusPolled {
        generation: Generation,
        message: ProgressMessage,
    },
    DownloadFinished {
        filename: String,
        result: Result<PathBuf, ApiError>,
    },
}
