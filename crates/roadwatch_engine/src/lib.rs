//! Roadwatch engine: backend IO, the push channel and effect execution.
mod api;
mod channel;
mod engine;
mod notify;
mod persist;
mod poll;
mod settings;
mod sink;
mod types;

pub use api::{Backend, ReqwestBackend};
pub use channel::{Connector, Frame, FrameStream, PushChannel, TungsteniteConnector};
pub use engine::{EngineCommand, EngineError, EngineHandle};
pub use notify::{Notification, NotificationDisplay, NotificationSink};
pub use persist::{ensure_output_dir, inspect_file, ArtifactStore, LocalFile, PersistError};
pub use poll::StatusPoller;
pub use settings::{parse_base_url, push_endpoint, ClientSettings, ReconnectPolicy};
pub use sink::{ChannelEventSink, EventSink};
pub use types::{
    ApiError, ChannelError, ChannelEvent, ConnectionId, EngineEvent, Generation, HealthResponse,
    NotificationSeverity, ProgressMessage, StatusReport, UploadRequest,
};
