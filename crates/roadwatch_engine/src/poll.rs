use std::sync::Arc;
use std::time::Duration;

use roadwatch_logging::{rw_debug, rw_warn};
use tokio_util::sync::CancellationToken;

use crate::{Backend, EngineEvent, EventSink, Generation};

/// Polls `/api/status` on a fixed interval until cancelled. Failed polls are
/// logged and skipped.
pub struct StatusPoller {
    cancel: CancellationToken,
}

impl StatusPoller {
    pub fn spawn(
        backend: Arc<dyn Backend>,
        sink: Arc<dyn EventSink>,
        generation: Generation,
        interval: Duration,
    ) -> Self {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {}
                }
                let report = tokio::select! {
                    _ = token.cancelled() => break,
                    report = backend.status() => report,
                };
                match report {
                    Ok(report) => sink.emit(EngineEvent::StatusPolled {
                        generation,
                        message: report.into_message(),
                    }),
                    Err(err) => rw_warn!("Status poll failed: {}", err),
                }
            }
            rw_debug!("Status poll for generation {} stopped", generation);
        });
        Self { cancel }
    }

    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

impl Drop for StatusPoller {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
