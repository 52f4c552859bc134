//! WebSocket implementation of the push channel port
//!
//! One connection per session. The adapter parses text frames into JSON and
//! forwards them; it answers liveness probes (both protocol pings and the
//! backend's `{"type": "ping"}` frames) without surfacing them. It never
//! reconnects: on any transport-level error it emits one `Disconnected` and
//! goes quiet, leaving resilience to the polling fallback.

use async_trait::async_trait;
use beacon_application::{ChannelError, ChannelEvent, PushChannel, PushHandle};
use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Per-connection event buffer between the socket task and the handle
const CHANNEL_CAPACITY: usize = 64;

/// Push channel backed by one WebSocket connection per session
pub struct WebSocketPushChannel {
    ws_base: String,
}

impl WebSocketPushChannel {
    /// `ws_base` is the mount point, e.g. `ws://localhost:8000/ws`
    pub fn new(ws_base: impl Into<String>) -> Self {
        Self {
            ws_base: ws_base.into().trim_end_matches('/').to_string(),
        }
    }

    fn session_url(&self, session_id: &str) -> String {
        format!("{}/{}", self.ws_base, session_id)
    }
}

#[async_trait]
impl PushChannel for WebSocketPushChannel {
    async fn open(&self, session_id: &str) -> Result<PushHandle, ChannelError> {
        let url = self.session_url(session_id);
        debug!(url = %url, "opening push channel");
        let (stream, _response) = connect_async(url.as_str())
            .await
            .map_err(|err| ChannelError::ConnectFailed(err.to_string()))?;

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let closer = CancellationToken::new();
        tokio::spawn(run_connection(stream, tx, closer.clone()));
        Ok(PushHandle::new(rx, closer))
    }
}

/// What to do with one inbound frame
#[derive(Debug, PartialEq)]
enum FrameAction {
    /// Surface the parsed payload
    Forward(Value),
    /// Answer a liveness probe with this message, surface nothing
    Reply(Message),
    /// Drop silently
    Ignore,
    /// Peer closed the connection
    Closed,
}

/// Classify one inbound message
///
/// Malformed payloads are dropped and logged, never surfaced as errors.
fn classify(message: Message) -> FrameAction {
    match message {
        Message::Text(text) => match serde_json::from_str::<Value>(&text) {
            Ok(value) => {
                if value.get("type").and_then(Value::as_str) == Some("ping") {
                    FrameAction::Reply(Message::Text(json!({"type": "pong"}).to_string()))
                } else {
                    FrameAction::Forward(value)
                }
            }
            Err(err) => {
                warn!(error = %err, "dropping malformed frame");
                FrameAction::Ignore
            }
        },
        Message::Ping(payload) => FrameAction::Reply(Message::Pong(payload)),
        Message::Pong(_) => FrameAction::Ignore,
        Message::Binary(_) => {
            warn!("dropping unexpected binary frame");
            FrameAction::Ignore
        }
        Message::Close(_) => FrameAction::Closed,
        Message::Frame(_) => FrameAction::Ignore,
    }
}

async fn run_connection(
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    tx: mpsc::Sender<ChannelEvent>,
    closer: CancellationToken,
) {
    let (mut sink, mut source) = stream.split();
    let _ = tx.send(ChannelEvent::Connected).await;

    // Closed locally (handle closed) vs. lost (peer/transport): only the
    // latter emits Disconnected, since close() guarantees no further
    // emissions.
    let mut closed_locally = false;

    loop {
        tokio::select! {
            _ = closer.cancelled() => {
                closed_locally = true;
                let _ = sink.send(Message::Close(None)).await;
                break;
            }
            frame = source.next() => match frame {
                Some(Ok(message)) => match classify(message) {
                    FrameAction::Forward(value) => {
                        if tx.send(ChannelEvent::Frame(value)).await.is_err() {
                            closed_locally = true;
                            break;
                        }
                    }
                    FrameAction::Reply(reply) => {
                        if let Err(err) = sink.send(reply).await {
                            warn!(error = %err, "push channel send failed");
                            break;
                        }
                    }
                    FrameAction::Ignore => {}
                    FrameAction::Closed => break,
                },
                Some(Err(err)) => {
                    warn!(error = %err, "push channel read failed");
                    break;
                }
                None => break,
            }
        }
    }

    if !closed_locally {
        let _ = tx.send(ChannelEvent::Disconnected).await;
    }
    debug!("push channel closed");
}
