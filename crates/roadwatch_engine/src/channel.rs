//! Receive-only push channel with unconditional reconnection.
//!
//! Each connection attempt gets a new id. Messages are forwarded tagged with
//! the id of the connection they arrived on, so the consumer can ignore a
//! connection once a newer one has opened.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use roadwatch_logging::{rw_debug, rw_error, rw_info, rw_warn};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::{ChannelError, ChannelEvent, ConnectionId, EngineEvent, EventSink, ProgressMessage, ReconnectPolicy};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Close,
    /// Binary, ping and pong frames; the transport answers pings itself.
    Other,
}

pub type FrameStream = BoxStream<'static, Result<Frame, ChannelError>>;

#[async_trait::async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, url: &Url) -> Result<FrameStream, ChannelError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TungsteniteConnector;

#[async_trait::async_trait]
impl Connector for TungsteniteConnector {
    async fn connect(&self, url: &Url) -> Result<FrameStream, ChannelError> {
        let (socket, _response) = tokio_tungstenite::connect_async(url.as_str())
            .await
            .map_err(|err| ChannelError::Connect(err.to_string()))?;
        let frames = socket.map(|message| match message {
            Ok(Message::Text(text)) => Ok(Frame::Text(text.as_str().to_owned())),
            Ok(Message::Close(_)) => Ok(Frame::Close),
            Ok(_) => Ok(Frame::Other),
            Err(err) => Err(ChannelError::Transport(err.to_string())),
        });
        Ok(frames.boxed())
    }
}

pub struct PushChannel {
    url: Url,
    policy: ReconnectPolicy,
    connector: Arc<dyn Connector>,
    sink: Arc<dyn EventSink>,
    connections: Arc<AtomicU64>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl PushChannel {
    pub fn new(
        url: Url,
        policy: ReconnectPolicy,
        connector: Arc<dyn Connector>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            url,
            policy,
            connector,
            sink,
            connections: Arc::new(AtomicU64::new(0)),
            cancel: CancellationToken::new(),
            task: None,
        }
    }

    /// Starts the connection loop. Calling it while the loop runs is a no-op.
    /// Must be called from within a tokio runtime.
    pub fn connect(&mut self) {
        if self.is_running() {
            rw_debug!("Push channel already running");
            return;
        }
        if self.cancel.is_cancelled() {
            self.cancel = CancellationToken::new();
        }
        let worker = ChannelWorker {
            url: self.url.clone(),
            policy: self.policy,
            connector: self.connector.clone(),
            sink: self.sink.clone(),
            connections: self.connections.clone(),
            cancel: self.cancel.clone(),
        };
        self.task = Some(tokio::spawn(worker.run()));
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Stops reconnecting and drops the current connection.
    pub fn shutdown(&mut self) {
        self.cancel.cancel();
        self.task = None;
    }
}

impl Drop for PushChannel {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct ChannelWorker {
    url: Url,
    policy: ReconnectPolicy,
    connector: Arc<dyn Connector>,
    sink: Arc<dyn EventSink>,
    connections: Arc<AtomicU64>,
    cancel: CancellationToken,
}

impl ChannelWorker {
    async fn run(self) {
        loop {
            let connection: ConnectionId = self.connections.fetch_add(1, Ordering::Relaxed) + 1;
            let attempt = tokio::select! {
                _ = self.cancel.cancelled() => return,
                attempt = self.connector.connect(&self.url) => attempt,
            };
            match attempt {
                Ok(frames) => {
                    rw_info!("Push channel connected to {} (connection {})", self.url, connection);
                    self.emit(ChannelEvent::Opened { connection });
                    let cancelled = self.pump(connection, frames).await;
                    self.emit(ChannelEvent::Closed { connection });
                    if cancelled {
                        return;
                    }
                }
                Err(err) => rw_error!("Push channel error: {}", err),
            }

            let delay = self.policy.next_delay();
            rw_info!("Push channel disconnected. Reconnecting in {:?}", delay);
            tokio::select! {
                _ = self.cancel.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    /// Forwards messages until the connection ends. Returns `true` when it
    /// ended because of shutdown.
    async fn pump(&self, connection: ConnectionId, mut frames: FrameStream) -> bool {
        loop {
            let next = tokio::select! {
                _ = self.cancel.cancelled() => return true,
                next = frames.next() => next,
            };
            match next {
                Some(Ok(Frame::Text(text))) => match ProgressMessage::decode(&text) {
                    Ok(message) => self.emit(ChannelEvent::Message {
                        connection,
                        message,
                    }),
                    Err(err) => rw_warn!(
                        "Dropping undecodable push message on connection {}: {} ({} bytes)",
                        connection,
                        err,
                        text.len()
                    ),
                },
                Some(Ok(Frame::Other)) => {}
                Some(Ok(Frame::Close)) | None => return false,
                Some(Err(err)) => {
                    rw_error!("Push channel error: {}", err);
                    return false;
                }
            }
        }
    }

    fn emit(&self, event: ChannelEvent) {
        self.sink.emit(EngineEvent::Channel(event));
    }
}
