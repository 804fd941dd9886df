use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use roadwatch_core::{CandidateFile, Effect, HealthReport, Msg, ProgressUpdate, Severity};
use roadwatch_engine::{
    ApiError, ChannelEvent, ClientSettings, EngineCommand, EngineError, EngineEvent,
    EngineHandle, NotificationDisplay, NotificationSeverity, ProgressMessage, UploadRequest,
};
use roadwatch_logging::{rw_error, rw_info};

const UPLOAD_FAILED: &str = "Upload failed";
const PROCESSING_FAILED: &str = "Processing failed";

/// What the dispatch loop receives from the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Msg(Msg),
    Downloaded {
        filename: String,
        result: Result<PathBuf, ApiError>,
    },
}

pub struct EffectRunner {
    engine: EngineHandle,
    settings: ClientSettings,
}

impl EffectRunner {
    pub fn new(
        settings: ClientSettings,
        display: Arc<dyn NotificationDisplay>,
    ) -> Result<Self, EngineError> {
        let engine = EngineHandle::new(settings.clone(), display)?;
        Ok(Self { engine, settings })
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::OpenArtifact { url } => self.open_artifact(&url),
                other => {
                    if let Some(command) = command_for(other) {
                        self.engine.execute(command);
                    }
                }
            }
        }
    }

    /// Waits up to `timeout` for the next engine event.
    pub fn next(&self, timeout: Duration) -> Option<Inbound> {
        self.engine.recv_timeout(timeout).map(inbound_for)
    }

    fn open_artifact(&self, path: &str) {
        let url = match self.settings.resolve(path) {
            Ok(url) => url,
            Err(err) => {
                rw_error!("Cannot open {}: {}", path, err);
                return;
            }
        };
        rw_info!("Opening {}", url);
        if let Err(err) = open::that(url.as_str()) {
            rw_error!("Failed to open {}: {}", url, err);
        }
    }
}

fn command_for(effect: Effect) -> Option<EngineCommand> {
    let command = match effect {
        Effect::CheckHealth => EngineCommand::CheckHealth,
        Effect::ConnectChannel => EngineCommand::ConnectChannel,
        Effect::Upload { generation, file } => EngineCommand::Upload {
            generation,
            request: upload_request(file),
        },
        Effect::StartProcessing {
            generation,
            filename,
        } => EngineCommand::StartProcessing {
            generation,
            filename,
        },
        Effect::StartStatusPoll { generation } => EngineCommand::StartStatusPoll { generation },
        Effect::StopStatusPoll => EngineCommand::StopStatusPoll,
        Effect::Notify { message, severity } => EngineCommand::Notify {
            message,
            severity: map_severity(severity),
        },
        Effect::DownloadArtifact { url, filename } => EngineCommand::Download { url, filename },
        Effect::OpenArtifact { .. } => return None,
    };
    Some(command)
}

fn upload_request(file: CandidateFile) -> UploadRequest {
    UploadRequest {
        path: file.path,
        file_name: file.name,
        media_type: file.media_type,
    }
}

fn map_severity(severity: Severity) -> NotificationSeverity {
    match severity {
        Severity::Success => NotificationSeverity::Success,
        Severity::Error => NotificationSeverity::Error,
        Severity::Warning => NotificationSeverity::Warning,
    }
}

fn inbound_for(event: EngineEvent) -> Inbound {
    let msg = match event {
        EngineEvent::HealthChecked(result) => Msg::HealthChecked(
            result
                .map(|health| HealthReport {
                    status: health.status,
                    model_loaded: health.model_loaded,
                })
                .map_err(|err| err.to_string()),
        ),
        EngineEvent::UploadFinished { generation, result } => Msg::UploadFinished {
            generation,
            result: result.map_err(|err| err.user_message(UPLOAD_FAILED)),
        },
        EngineEvent::ProcessingStarted {
            generation,
            filename,
            result,
        } => Msg::ProcessingStarted {
            generation,
            filename,
            result: result.map_err(|err| err.user_message(PROCESSING_FAILED)),
        },
        EngineEvent::Channel(ChannelEvent::Opened { connection }) => {
            Msg::ChannelOpened { connection }
        }
        EngineEvent::Channel(ChannelEvent::Closed { connection }) => {
            Msg::ChannelClosed { connection }
        }
        EngineEvent::Channel(ChannelEvent::Message {
            connection,
            message,
        }) => Msg::ChannelEvent {
            connection,
            update: progress_update(message),
        },
        EngineEvent::StatusPolled {
            generation,
            message,
        } => Msg::StatusPolled {
            generation,
            update: progress_update(message),
        },
        EngineEvent::DownloadFinished { filename, result } => {
            return Inbound::Downloaded { filename, result }
        }
    };
    Inbound::Msg(msg)
}

fn progress_update(message: ProgressMessage) -> ProgressUpdate {
    ProgressUpdate {
        progress: message.percent(),
        processed_frames: message.processed_frames,
        total_frames: message.total_frames,
        output_file: message.output_file,
        error: message.error,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn upload_effect_carries_file_details() {
        let file = CandidateFile {
            path: PathBuf::from("/videos/clip.mov"),
            name: "clip.mov".to_string(),
            media_type: Some("video/quicktime".to_string()),
            size_bytes: 42,
        };
        assert_eq!(
            command_for(Effect::Upload {
                generation: 2,
                file
            }),
            Some(EngineCommand::Upload {
                generation: 2,
                request: UploadRequest {
                    path: PathBuf::from("/videos/clip.mov"),
                    file_name: "clip.mov".to_string(),
                    media_type: Some("video/quicktime".to_string()),
                },
            })
        );
        assert_eq!(
            command_for(Effect::OpenArtifact {
                url: "/outputs/a.avi".to_string()
            }),
            None
        );
    }

    #[test]
    fn rejections_use_detail_or_fallback() {
        let with_detail = inbound_for(EngineEvent::ProcessingStarted {
            generation: 1,
            filename: "a.mp4".to_string(),
            result: Err(ApiError::Rejected {
                status: 409,
                detail: Some("Processing already in progress".to_string()),
            }),
        });
        assert_eq!(
            with_detail,
            Inbound::Msg(Msg::ProcessingStarted {
                generation: 1,
                filename: "a.mp4".to_string(),
                result: Err("Processing already in progress".to_string()),
            })
        );

        let bare = inbound_for(EngineEvent::UploadFinished {
            generation: 1,
            result: Err(ApiError::Rejected {
                status: 500,
                detail: None,
            }),
        });
        assert_eq!(
            bare,
            Inbound::Msg(Msg::UploadFinished {
                generation: 1,
                result: Err("Upload failed".to_string()),
            })
        );
    }

    #[test]
    fn push_message_becomes_clamped_progress_update() {
        let inbound = inbound_for(EngineEvent::Channel(ChannelEvent::Message {
            connection: 3,
            message: ProgressMessage {
                progress: Some(180),
                processed_frames: Some(90),
                total_frames: Some(90),
                output_file: Some("clip_processed.mp4".to_string()),
                error: None,
                is_processing: Some(false),
            },
        }));
        assert_eq!(
            inbound,
            Inbound::Msg(Msg::ChannelEvent {
                connection: 3,
                update: ProgressUpdate {
                    progress: Some(100),
                    processed_frames: Some(90),
                    total_frames: Some(90),
                    output_file: Some("clip_processed.mp4".to_string()),
                    error: None,
                },
            })
        );
    }
}
