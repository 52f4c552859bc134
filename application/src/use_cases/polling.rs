//! Polling fallback (the pull channel)
//!
//! Issues one status request per tick against the backend gateway. The
//! poller is the availability backstop: it keeps running through socket
//! loss and individual request failures, and stops only when its token is
//! cancelled or the controller goes away.

use crate::ports::backend_gateway::BackendGateway;
use crate::use_cases::SourceEvent;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Spawn the status poller for one session
///
/// A request still in flight when the next tick fires suppresses that tick
/// (the loop awaits the request, and missed ticks are skipped rather than
/// bursted). Failed requests are logged and swallowed. Cancelling `token`
/// stops the loop; cancellation is idempotent and safe after the loop has
/// already exited.
pub fn spawn_status_poller<G: BackendGateway + 'static>(
    gateway: Arc<G>,
    session_id: String,
    interval: Duration,
    token: CancellationToken,
    tx: mpsc::UnboundedSender<SourceEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let result = tokio::select! {
                _ = token.cancelled() => break,
                result = gateway.fetch_status(&session_id) => result,
            };

            let event = match result {
                Ok(report) => SourceEvent::Poll(report),
                Err(err) => {
                    warn!(session_id = %session_id, error = %err, "status poll failed, skipping tick");
                    SourceEvent::PollFailed(err.to_string())
                }
            };

            // Receiver gone means the controller tore down without us.
            if tx.send(event).is_err() {
                break;
            }
        }

        debug!(session_id = %session_id, "status poller stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::backend_gateway::{GatewayError, StartedSession};
    use async_trait::async_trait;
    use beacon_domain::{
        HistoryPage, ResearchQuery, ResearchResults, StartOptions, StatusReport,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingGateway {
        polls: AtomicUsize,
        fail: bool,
    }

    impl CountingGateway {
        fn new(fail: bool) -> Self {
            Self {
                polls: AtomicUsize::new(0),
                fail,
            }
        }
    }

    #[async_trait]
    impl BackendGateway for CountingGateway {
        async fn start_session(
            &self,
            _query: &ResearchQuery,
            _options: &StartOptions,
        ) -> Result<StartedSession, GatewayError> {
            unimplemented!("not used by the poller")
        }

        async fn fetch_status(&self, session_id: &str) -> Result<StatusReport, GatewayError> {
            self.polls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(GatewayError::RequestFailed("503".to_string()));
            }
            Ok(StatusReport {
                session_id: session_id.to_string(),
                status: "running".to_string(),
                ..StatusReport::default()
            })
        }

        async fn fetch_results(&self, _: &str) -> Result<ResearchResults, GatewayError> {
            unimplemented!("not used by the poller")
        }

        async fn cancel_session(&self, _: &str) -> Result<(), GatewayError> {
            unimplemented!("not used by the poller")
        }

        async fn list_history(&self, _: u32, _: u32) -> Result<HistoryPage, GatewayError> {
            unimplemented!("not used by the poller")
        }
    }

    #[tokio::test]
    async fn test_poller_delivers_snapshots_until_stopped() {
        let gateway = Arc::new(CountingGateway::new(false));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let token = CancellationToken::new();

        let handle = spawn_status_poller(
            gateway.clone(),
            "abc123".to_string(),
            Duration::from_millis(5),
            token.clone(),
            tx,
        );

        let first = rx.recv().await.unwrap();
        match first {
            SourceEvent::Poll(report) => assert_eq!(report.session_id, "abc123"),
            other => panic!("Expected Poll, got {:?}", other),
        }

        token.cancel();
        handle.await.unwrap();
        assert!(gateway.polls.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn test_failed_poll_is_reported_not_fatal() {
        let gateway = Arc::new(CountingGateway::new(true));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let token = CancellationToken::new();

        let handle = spawn_status_poller(
            gateway.clone(),
            "abc123".to_string(),
            Duration::from_millis(5),
            token.clone(),
            tx,
        );

        assert!(matches!(
            rx.recv().await.unwrap(),
            SourceEvent::PollFailed(_)
        ));
        // Polling continues after a failure.
        assert!(matches!(
            rx.recv().await.unwrap(),
            SourceEvent::PollFailed(_)
        ));

        token.cancel();
        handle.await.unwrap();
        assert!(gateway.polls.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let gateway = Arc::new(CountingGateway::new(false));
        let (tx, _rx) = mpsc::unbounded_channel();
        let token = CancellationToken::new();

        let handle = spawn_status_poller(
            gateway,
            "abc123".to_string(),
            Duration::from_millis(5),
            token.clone(),
            tx,
        );

        token.cancel();
        token.cancel();
        handle.await.unwrap();
        // Cancelling after the task has exited is also fine.
        token.cancel();
    }

    #[tokio::test]
    async fn test_poller_stops_when_receiver_dropped() {
        let gateway = Arc::new(CountingGateway::new(false));
        let (tx, rx) = mpsc::unbounded_channel();
        let token = CancellationToken::new();

        let handle = spawn_status_poller(
            gateway,
            "abc123".to_string(),
            Duration::from_millis(5),
            token,
            tx,
        );

        drop(rx);
        handle.await.unwrap();
    }
}
