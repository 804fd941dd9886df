use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use roadwatch_logging::{rw_debug, rw_info, rw_warn};
use tokio::sync::mpsc as async_mpsc;

use crate::channel::{Connector, PushChannel, TungsteniteConnector};
use crate::notify::{NotificationDisplay, NotificationSink};
use crate::persist::ArtifactStore;
use crate::poll::StatusPoller;
use crate::sink::ChannelEventSink;
use crate::{
    ApiError, Backend, ClientSettings, EngineEvent, EventSink, Generation, NotificationSeverity,
    ReqwestBackend, UploadRequest,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCommand {
    CheckHealth,
    ConnectChannel,
    Upload {
        generation: Generation,
        request: UploadRequest,
    },
    StartProcessing {
        generation: Generation,
        filename: String,
    },
    StartStatusPoll { generation: Generation },
    StopStatusPoll,
    Notify {
        message: String,
        severity: NotificationSeverity,
    },
    Download { url: String, filename: String },
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to start runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Runs all IO on a single-threaded tokio runtime owned by a worker thread.
/// Commands go in, `EngineEvent`s come out; callers never block on IO.
pub struct EngineHandle {
    cmd_tx: Option<async_mpsc::UnboundedSender<EngineCommand>>,
    event_rx: mpsc::Receiver<EngineEvent>,
    worker: Option<thread::JoinHandle<()>>,
}

impl EngineHandle {
    pub fn new(
        settings: ClientSettings,
        display: Arc<dyn NotificationDisplay>,
    ) -> Result<Self, EngineError> {
        let backend = Arc::new(ReqwestBackend::new(settings.clone())?);
        Self::with_parts(settings, backend, Arc::new(TungsteniteConnector), display)
    }

    pub fn with_parts(
        settings: ClientSettings,
        backend: Arc<dyn Backend>,
        connector: Arc<dyn Connector>,
        display: Arc<dyn NotificationDisplay>,
    ) -> Result<Self, EngineError> {
        let push_url = settings.push_endpoint()?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let (cmd_tx, mut cmd_rx) = async_mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::channel();
        let sink: Arc<dyn EventSink> = Arc::new(ChannelEventSink::new(event_tx));

        let worker = thread::Builder::new()
            .name("roadwatch-engine".to_string())
            .spawn(move || {
                runtime.block_on(async move {
                    let mut context = EngineContext {
                        channel: PushChannel::new(
                            push_url,
                            settings.reconnect,
                            connector,
                            sink.clone(),
                        ),
                        notifications: NotificationSink::new(display, settings.notification_ttl),
                        store: ArtifactStore::new(settings.download_dir.clone()),
                        poller: None,
                        backend,
                        sink,
                        settings,
                    };
                    while let Some(command) = cmd_rx.recv().await {
                        context.handle(command);
                    }
                    context.shutdown();
                });
            })?;

        Ok(Self {
            cmd_tx: Some(cmd_tx),
            event_rx,
            worker: Some(worker),
        })
    }

    pub fn execute(&self, command: EngineCommand) {
        let delivered = self
            .cmd_tx
            .as_ref()
            .is_some_and(|cmd_tx| cmd_tx.send(command).is_ok());
        if !delivered {
            rw_warn!("Engine worker is gone; command dropped");
        }
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        // Closing the command channel ends the worker loop.
        self.cmd_tx = None;
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

struct EngineContext {
    backend: Arc<dyn Backend>,
    sink: Arc<dyn EventSink>,
    settings: ClientSettings,
    channel: PushChannel,
    notifications: NotificationSink,
    store: ArtifactStore,
    poller: Option<StatusPoller>,
}

impl EngineContext {
    fn handle(&mut self, command: EngineCommand) {
        rw_debug!("Engine command: {:?}", command);
        match command {
            EngineCommand::CheckHealth => {
                let backend = self.backend.clone();
                let sink = self.sink.clone();
                tokio::spawn(async move {
                    let result = backend.health().await;
                    sink.emit(EngineEvent::HealthChecked(result));
                });
            }
            EngineCommand::ConnectChannel => self.channel.connect(),
            EngineCommand::Upload {
                generation,
                request,
            } => {
                let backend = self.backend.clone();
                let sink = self.sink.clone();
                tokio::spawn(async move {
                    let result = backend.upload(&request).await;
                    sink.emit(EngineEvent::UploadFinished { generation, result });
                });
            }
            EngineCommand::StartProcessing {
                generation,
                filename,
            } => {
                let backend = self.backend.clone();
                let sink = self.sink.clone();
                tokio::spawn(async move {
                    let result = backend.start_processing(&filename).await;
                    sink.emit(EngineEvent::ProcessingStarted {
                        generation,
                        filename,
                        result,
                    });
                });
            }
            EngineCommand::StartStatusPoll { generation } => {
                let Some(interval) = self.settings.status_poll_interval else {
                    rw_warn!("Status poll requested but no interval is configured");
                    return;
                };
                // Replacing the poller drops, and so cancels, any previous one.
                self.poller = Some(StatusPoller::spawn(
                    self.backend.clone(),
                    self.sink.clone(),
                    generation,
                    interval,
                ));
            }
            EngineCommand::StopStatusPoll => {
                if let Some(poller) = self.poller.take() {
                    poller.stop();
                }
            }
            EngineCommand::Notify { message, severity } => {
                self.notifications.notify(message, severity);
            }
            EngineCommand::Download { url, filename } => {
                let backend = self.backend.clone();
                let sink = self.sink.clone();
                let store = self.store.clone();
                tokio::spawn(async move {
                    let result = store.save(backend.as_ref(), &url, &filename).await;
                    sink.emit(EngineEvent::DownloadFinished { filename, result });
                });
            }
        }
    }

    fn shutdown(&mut self) {
        rw_info!("Engine shutting down");
        self.channel.shutdown();
        self.poller = None;
    }
}
