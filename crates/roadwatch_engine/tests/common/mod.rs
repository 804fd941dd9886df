#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use futures_util::stream::{self, StreamExt};
use roadwatch_engine::{
    ChannelError, ChannelEvent, Connector, EngineEvent, EventSink, Frame, FrameStream,
};
use tokio::time::Instant;
use url::Url;

#[derive(Default, Clone)]
pub struct TestSink {
    events: Arc<Mutex<Vec<EngineEvent>>>,
}

impl TestSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }

    pub fn channel_events(&self) -> Vec<ChannelEvent> {
        self.take()
            .into_iter()
            .filter_map(|event| match event {
                EngineEvent::Channel(event) => Some(event),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for TestSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}

pub enum Script {
    Fail,
    Frames(Vec<Frame>),
    Hold,
}

/// Connector that plays back one script per connection attempt and records
/// when each attempt happened. Attempts past the end of the script hold open.
#[derive(Default)]
pub struct ScriptedConnector {
    scripts: Mutex<VecDeque<Script>>,
    attempts: Mutex<Vec<Instant>>,
}

impl ScriptedConnector {
    pub fn new(scripts: Vec<Script>) -> Self {
        Self {
            scripts: Mutex::new(scripts.into()),
            attempts: Mutex::new(Vec::new()),
        }
    }

    pub fn attempts(&self) -> Vec<Instant> {
        self.attempts.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Connector for ScriptedConnector {
    async fn connect(&self, _url: &Url) -> Result<FrameStream, ChannelError> {
        self.attempts.lock().unwrap().push(Instant::now());
        let script = self.scripts.lock().unwrap().pop_front().unwrap_or(Script::Hold);
        match script {
            Script::Fail => Err(ChannelError::Connect("connection refused".to_string())),
            Script::Frames(frames) => Ok(stream::iter(frames.into_iter().map(Ok)).boxed()),
            Script::Hold => Ok(stream::pending().boxed()),
        }
    }
}

pub fn text(json: &str) -> Frame {
    Frame::Text(json.to_string())
}
