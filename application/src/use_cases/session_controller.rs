//! Session controller
//!
//! Owns the lifecycle of a single tracked session: starts both channels,
//! funnels their traffic through the normalizer into the pipeline state
//! machine, performs the single results fetch on terminal success, and tears
//! both channels down on any terminal outcome.
//!
//! The controller instance is one-shot: `idle → starting → active →
//! terminated`. Tracking a different session means building a new controller,
//! which is what makes switching between history entries safe: the previous
//! controller's channels are fully torn down before new ones exist.

use crate::ports::backend_gateway::{BackendGateway, GatewayError};
use crate::ports::push_channel::{ChannelEvent, PushChannel};
use crate::ports::tracker_event::TrackerEvent;
use crate::use_cases::SourceEvent;
use crate::use_cases::polling::spawn_status_poller;
use beacon_domain::{
    ActivityEntry, ActivityKind, ConnectionEvent, DomainError, PipelineState, ResearchQuery,
    SessionSnapshot, StartOptions, TerminalOutcome, UpdateEvent, normalize, normalize_report,
    session_status_from_str,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Default pull-channel interval
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);

/// Errors from controller operations
#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error("Controller is not idle")]
    NotIdle,

    #[error("No active session")]
    NotActive,

    #[error(transparent)]
    InvalidQuery(#[from] DomainError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("Event sources closed before a terminal outcome")]
    SourcesClosed,
}

/// Lifecycle of the controller itself
///
/// The terminal outcomes (completed/failed/cancelled) are sub-states of
/// `Terminated`, tracked by the pipeline state machine's latch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    Starting,
    Active,
    Terminated,
}

/// Tracks one research session across both channels
pub struct SessionController<G, P>
where
    G: BackendGateway + 'static,
    P: PushChannel + 'static,
{
    gateway: Arc<G>,
    push: Arc<P>,
    /// Output port to the presentation layer
    tx: mpsc::UnboundedSender<TrackerEvent>,
    poll_interval: Duration,
    state: ControllerState,
    session_id: Option<String>,
    pipeline: PipelineState,
    activity: Vec<ActivityEntry>,
    results_fetched: bool,
    /// External cancel trigger (e.g. Ctrl-C); observed by the run loop
    cancel_requested: CancellationToken,
    /// Stops the poller, the socket forwarder, and the socket itself
    teardown: CancellationToken,
    source_tx: mpsc::UnboundedSender<SourceEvent>,
    source_rx: Option<mpsc::UnboundedReceiver<SourceEvent>>,
}

impl<G, P> SessionController<G, P>
where
    G: BackendGateway + 'static,
    P: PushChannel + 'static,
{
    pub fn new(gateway: Arc<G>, push: Arc<P>, tx: mpsc::UnboundedSender<TrackerEvent>) -> Self {
        let (source_tx, source_rx) = mpsc::unbounded_channel();
        Self {
            gateway,
            push,
            tx,
            poll_interval: DEFAULT_POLL_INTERVAL,
            state: ControllerState::Idle,
            session_id: None,
            pipeline: PipelineState::new(),
            activity: Vec::new(),
            results_fetched: false,
            cancel_requested: CancellationToken::new(),
            teardown: CancellationToken::new(),
            source_tx,
            source_rx: Some(source_rx),
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Token that requests cooperative cancellation of the tracked session
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_requested.clone()
    }

    /// Current consolidated view, if a session is being tracked
    pub fn snapshot(&self) -> Option<SessionSnapshot> {
        self.session_id
            .as_deref()
            .map(|id| self.pipeline.snapshot(id))
    }

    /// Ordered activity log for the tracked session
    pub fn activity(&self) -> &[ActivityEntry] {
        &self.activity
    }

    /// Start a new research session and begin tracking it
    ///
    /// Rejects unless the controller is idle and the query passes
    /// validation. A failed start request leaves the controller idle.
    pub async fn start(
        &mut self,
        query: &str,
        options: StartOptions,
    ) -> Result<String, ControllerError> {
        if self.state != ControllerState::Idle {
            return Err(ControllerError::NotIdle);
        }
        let query = ResearchQuery::parse(query)?;

        self.state = ControllerState::Starting;
        let started = match self.gateway.start_session(&query, &options).await {
            Ok(started) => started,
            Err(err) => {
                self.state = ControllerState::Idle;
                return Err(err.into());
            }
        };

        info!(session_id = %started.session_id, "research session started");
        self.session_id = Some(started.session_id.clone());
        self.pipeline = PipelineState::new();
        let _ = self.tx.send(TrackerEvent::SessionStarted {
            session_id: started.session_id.clone(),
        });
        self.push_activity(
            ActivityKind::Info,
            format!("session {} started", started.session_id),
        );

        self.open_channels(&started.session_id).await;
        self.state = ControllerState::Active;
        self.emit_snapshot();
        Ok(started.session_id)
    }

    /// Re-attach to an existing session by id
    ///
    /// Fetches the current status once. Already-terminal sessions are
    /// replayed directly (results fetch included, for completed ones)
    /// without opening any channel; live sessions seed the state machine
    /// from the snapshot and then track like a fresh start.
    pub async fn resume(&mut self, session_id: &str) -> Result<(), ControllerError> {
        if self.state != ControllerState::Idle {
            return Err(ControllerError::NotIdle);
        }

        self.state = ControllerState::Starting;
        let report = match self.gateway.fetch_status(session_id).await {
            Ok(report) => report,
            Err(err) => {
                self.state = ControllerState::Idle;
                return Err(err.into());
            }
        };

        self.session_id = Some(session_id.to_string());
        self.pipeline = PipelineState::new();
        let _ = self.tx.send(TrackerEvent::SessionStarted {
            session_id: session_id.to_string(),
        });
        self.push_activity(
            ActivityKind::Info,
            format!("re-attached to session {}", session_id),
        );

        let already_terminal = session_status_from_str(&report.status)
            .is_some_and(|status| status.is_terminal());
        let events = normalize_report(&report);

        if already_terminal {
            // The run is over; skip channel setup and replay the snapshot.
            for event in &events {
                self.apply_event(event).await;
            }
            return Ok(());
        }

        for event in &events {
            self.apply_event(event).await;
        }
        self.open_channels(session_id).await;
        self.state = ControllerState::Active;
        self.emit_snapshot();
        Ok(())
    }

    /// Cancel the active session
    ///
    /// Optimistic local cancellation: the cancel request is issued
    /// fire-and-forget and the session latches cancelled immediately. A
    /// later server-confirmed terminal frame is absorbed by the latch.
    pub async fn cancel(&mut self) -> Result<(), ControllerError> {
        if self.state != ControllerState::Active {
            return Err(ControllerError::NotActive);
        }
        let Some(session_id) = self.session_id.clone() else {
            return Err(ControllerError::NotActive);
        };

        let gateway = self.gateway.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            if let Err(err) = gateway.cancel_session(&session_id).await {
                warn!(session_id = %session_id, error = %err, "cancel request failed");
                let _ = tx.send(TrackerEvent::ChannelWarning {
                    message: format!("cancel request failed: {}", err),
                });
            }
        });

        self.push_activity(ActivityKind::Info, "cancellation requested");
        self.apply_event(&UpdateEvent::Terminal {
            outcome: TerminalOutcome::Cancelled,
            error: None,
        })
        .await;
        Ok(())
    }

    /// Drive the controller until the session reaches a terminal outcome
    ///
    /// Consumes merged channel traffic in arrival order and reacts to the
    /// external cancel token. Returns the latched outcome.
    pub async fn run_until_terminal(&mut self) -> Result<TerminalOutcome, ControllerError> {
        if self.state == ControllerState::Idle || self.state == ControllerState::Starting {
            return Err(ControllerError::NotActive);
        }
        let Some(mut rx) = self.source_rx.take() else {
            return Err(ControllerError::NotActive);
        };
        let cancel_requested = self.cancel_requested.clone();

        while self.state != ControllerState::Terminated {
            tokio::select! {
                _ = cancel_requested.cancelled(), if self.state == ControllerState::Active => {
                    let _ = self.cancel().await;
                }
                event = rx.recv() => match event {
                    Some(event) => self.handle_source(event).await,
                    None => break,
                }
            }
        }

        self.source_rx = Some(rx);
        self.pipeline
            .outcome()
            .ok_or(ControllerError::SourcesClosed)
    }

    async fn open_channels(&mut self, session_id: &str) {
        // The socket is best-effort: if it cannot be opened the poller alone
        // carries the session, and the user sees a warning, not a failure.
        match self.push.open(session_id).await {
            Ok(handle) => {
                let closer = handle.closer();
                let mut receiver = handle.into_receiver();
                let source_tx = self.source_tx.clone();
                let teardown = self.teardown.clone();
                tokio::spawn(async move {
                    loop {
                        tokio::select! {
                            _ = teardown.cancelled() => break,
                            event = receiver.recv() => match event {
                                Some(event) => {
                                    if source_tx.send(SourceEvent::Push(event)).is_err() {
                                        break;
                                    }
                                }
                                None => break,
                            }
                        }
                    }
                    closer.cancel();
                });
            }
            Err(err) => {
                warn!(error = %err, "push channel unavailable, relying on status polling");
                let message = format!("push channel unavailable: {}", err);
                self.push_activity(ActivityKind::Warning, message.clone());
                let _ = self.tx.send(TrackerEvent::ChannelWarning { message });
            }
        }

        spawn_status_poller(
            self.gateway.clone(),
            session_id.to_string(),
            self.poll_interval,
            self.teardown.clone(),
            self.source_tx.clone(),
        );
    }

    async fn handle_source(&mut self, event: SourceEvent) {
        match event {
            SourceEvent::Push(ChannelEvent::Connected) => {
                self.apply_event(&UpdateEvent::Connection(ConnectionEvent::Established))
                    .await;
            }
            SourceEvent::Push(ChannelEvent::Frame(value)) => {
                for event in normalize(&value) {
                    self.apply_event(&event).await;
                }
            }
            SourceEvent::Push(ChannelEvent::Disconnected) => {
                self.apply_event(&UpdateEvent::Connection(ConnectionEvent::Lost))
                    .await;
                let _ = self.tx.send(TrackerEvent::ChannelWarning {
                    message: "push channel lost; relying on status polling".to_string(),
                });
            }
            SourceEvent::Poll(report) => {
                for event in normalize_report(&report) {
                    self.apply_event(&event).await;
                }
            }
            SourceEvent::PollFailed(error) => {
                debug!(error = %error, "poll tick failed, next tick retries");
            }
        }
    }

    async fn apply_event(&mut self, event: &UpdateEvent) {
        match event {
            UpdateEvent::Connection(connection) => {
                let message = match connection {
                    ConnectionEvent::Established => "push channel connected",
                    ConnectionEvent::Lost => "push channel disconnected",
                };
                self.push_activity(ActivityKind::Connection, message);
            }
            UpdateEvent::Log { message } => {
                self.push_activity(ActivityKind::Info, message.clone());
            }
            _ => {
                let outcome = self.pipeline.apply(event);
                if !outcome.changed() {
                    debug!(kind = event.kind(), "event absorbed without state change");
                    return;
                }
                if let UpdateEvent::Agent {
                    name,
                    status,
                    progress,
                    ..
                } = event
                {
                    self.push_activity(
                        ActivityKind::AgentUpdate,
                        format!("{}: {} ({}%)", name.display_name(), status, progress),
                    );
                }
                self.emit_snapshot();
                if let UpdateEvent::Terminal { outcome, .. } = event {
                    self.finish(*outcome).await;
                }
            }
        }
    }

    /// One-shot terminal handling: teardown, optional results fetch,
    /// terminated state
    ///
    /// Only reachable through the pipeline latch accepting a terminal event,
    /// which it does at most once per session.
    async fn finish(&mut self, outcome: TerminalOutcome) {
        self.stop_channels();
        self.push_activity(ActivityKind::Terminal, format!("session {}", outcome));

        if outcome == TerminalOutcome::Completed {
            self.fetch_results_once().await;
        }

        self.state = ControllerState::Terminated;
        let _ = self.tx.send(TrackerEvent::Finished { outcome });
    }

    /// Stop both channels; safe to call any number of times
    fn stop_channels(&mut self) {
        self.teardown.cancel();
    }

    async fn fetch_results_once(&mut self) {
        if self.results_fetched {
            return;
        }
        // Set before the await so a duplicate terminal delivery arriving
        // mid-fetch cannot double-fire.
        self.results_fetched = true;
        let Some(session_id) = self.session_id.clone() else {
            return;
        };

        match self.gateway.fetch_results(&session_id).await {
            Ok(results) => {
                self.push_activity(
                    ActivityKind::Info,
                    format!("results fetched ({} findings)", results.findings_total()),
                );
                let _ = self.tx.send(TrackerEvent::ResultsReady(Box::new(results)));
            }
            Err(err) => {
                // Non-fatal: the session stays completed; the user can retry
                // through resume.
                warn!(session_id = %session_id, error = %err, "results fetch failed");
                self.push_activity(
                    ActivityKind::Warning,
                    format!("results fetch failed: {}", err),
                );
                let _ = self.tx.send(TrackerEvent::ResultsError {
                    error: err.to_string(),
                });
            }
        }
    }

    fn push_activity(&mut self, kind: ActivityKind, message: impl Into<String>) {
        let entry = ActivityEntry::now(kind, message);
        self.activity.push(entry.clone());
        let _ = self.tx.send(TrackerEvent::Activity(entry));
    }

    fn emit_snapshot(&self) {
        if let Some(session_id) = self.session_id.as_deref() {
            let _ = self
                .tx
                .send(TrackerEvent::Snapshot(self.pipeline.snapshot(session_id)));
        }
    }
}

impl<G, P> Drop for SessionController<G, P>
where
    G: BackendGateway + 'static,
    P: PushChannel + 'static,
{
    fn drop(&mut self) {
        // A dropped controller must not leave a live poller or socket writing
        // into a session nobody observes.
        self.teardown.cancel();
    }
}
