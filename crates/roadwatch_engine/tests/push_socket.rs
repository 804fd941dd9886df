mod common;

use std::sync::Arc;
use std::time::Duration;

use common::TestSink;
use futures_util::SinkExt;
use pretty_assertions::assert_eq;
use roadwatch_engine::{ChannelEvent, ProgressMessage, PushChannel, ReconnectPolicy, TungsteniteConnector};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

/// Accepts `connections` sockets in turn, sends each one `payloads` and closes.
async fn serve(listener: TcpListener, connections: usize, payloads: Vec<&'static str>) {
    for _ in 0..connections {
        let (stream, _) = listener.accept().await.unwrap();
        let mut socket = tokio_tungstenite::accept_async(stream).await.unwrap();
        for payload in &payloads {
            socket.send(Message::text(*payload)).await.unwrap();
        }
        socket.close(None).await.unwrap();
    }
}

async fn wait_for(sink: &TestSink, count: usize) -> Vec<ChannelEvent> {
    let mut events = Vec::new();
    for _ in 0..200 {
        events.extend(sink.channel_events());
        if events.len() >= count {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    events
}

#[tokio::test]
async fn receives_progress_and_reconnects_after_close() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let server = tokio::spawn(serve(
        listener,
        2,
        vec![r#"{"progress": 25, "processed_frames": 25, "total_frames": 100}"#, "garbage"],
    ));

    let sink = TestSink::new();
    let mut channel = PushChannel::new(
        Url::parse(&format!("ws://127.0.0.1:{port}/ws")).unwrap(),
        ReconnectPolicy {
            delay: Duration::from_millis(50),
            jitter: Duration::ZERO,
        },
        Arc::new(TungsteniteConnector),
        Arc::new(sink.clone()),
    );
    channel.connect();

    let events = wait_for(&sink, 6).await;
    channel.shutdown();
    server.await.unwrap();

    let progress = ProgressMessage {
        progress: Some(25),
        processed_frames: Some(25),
        total_frames: Some(100),
        ..ProgressMessage::default()
    };
    assert_eq!(
        events[..6].to_vec(),
        vec![
            ChannelEvent::Opened { connection: 1 },
            ChannelEvent::Message {
                connection: 1,
                message: progress.clone(),
            },
            ChannelEvent::Closed { connection: 1 },
            ChannelEvent::Opened { connection: 2 },
            ChannelEvent::Message {
                connection: 2,
                message: progress,
            },
            ChannelEvent::Closed { connection: 2 },
        ]
    );
}
