//! Push channel port
//!
//! One logical socket connection per session. The channel parses frames into
//! JSON and reports connectivity; it never assigns business meaning. A dead
//! socket is not an error here: the polling fallback is the availability
//! guarantee, so the channel only promises to emit exactly one
//! [`ChannelEvent::Disconnected`] and go quiet.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Errors opening a push connection
#[derive(Error, Debug)]
pub enum ChannelError {
    #[error("Connection failed: {0}")]
    ConnectFailed(String),
}

/// One emission from an open push connection
#[derive(Debug, Clone)]
pub enum ChannelEvent {
    /// The connection is established and frames may follow
    Connected,
    /// One parsed inbound frame; liveness probes are answered upstream and
    /// never appear here
    Frame(serde_json::Value),
    /// The connection is gone; emitted exactly once, nothing follows
    Disconnected,
}

/// Factory for push connections
#[async_trait]
pub trait PushChannel: Send + Sync {
    /// Open a connection for one session
    async fn open(&self, session_id: &str) -> Result<PushHandle, ChannelError>;
}

/// Handle for one open push connection
///
/// Dropping the handle or calling [`PushHandle::close`] releases the
/// underlying connection; close is idempotent.
pub struct PushHandle {
    receiver: mpsc::Receiver<ChannelEvent>,
    closer: CancellationToken,
}

impl PushHandle {
    pub fn new(receiver: mpsc::Receiver<ChannelEvent>, closer: CancellationToken) -> Self {
        Self { receiver, closer }
    }

    /// Token that closes the connection when cancelled
    pub fn closer(&self) -> CancellationToken {
        self.closer.clone()
    }

    /// Receive the next event; `None` once the channel is fully drained
    pub async fn recv(&mut self) -> Option<ChannelEvent> {
        self.receiver.recv().await
    }

    /// Close the connection; safe to call more than once
    pub fn close(&self) {
        self.closer.cancel();
    }

    /// Split into the raw receiver, keeping the closer alive separately
    pub fn into_receiver(self) -> mpsc::Receiver<ChannelEvent> {
        self.receiver
    }
}
