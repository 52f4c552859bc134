//! Backend gateway port
//!
//! Defines the REST-style operations the tracker consumes. Field names in
//! the request/response types are the backend's contract; the adapter in the
//! infrastructure layer speaks them verbatim.

use async_trait::async_trait;
use beacon_domain::{HistoryPage, ResearchQuery, ResearchResults, StartOptions, StatusReport};
use thiserror::Error;

/// Errors that can occur during backend gateway operations
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Backend rejected the request: {0}")]
    Rejected(String),

    #[error("Session not found: {0}")]
    NotFound(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Request timed out")]
    Timeout,
}

/// Result of a successful start request
#[derive(Debug, Clone)]
pub struct StartedSession {
    /// Server-assigned opaque session identifier
    pub session_id: String,
    /// Push endpoint advertised by the backend, if any
    pub websocket_url: Option<String>,
}

/// REST operations against the research backend
///
/// Implementations (adapters) live in the infrastructure layer. All
/// operations address a single session except `list_history`.
#[async_trait]
pub trait BackendGateway: Send + Sync {
    /// Start a new research session
    async fn start_session(
        &self,
        query: &ResearchQuery,
        options: &StartOptions,
    ) -> Result<StartedSession, GatewayError>;

    /// Fetch a point-in-time status snapshot (the pull channel)
    async fn fetch_status(&self, session_id: &str) -> Result<StatusReport, GatewayError>;

    /// Fetch results; only meaningful after terminal completion
    async fn fetch_results(&self, session_id: &str) -> Result<ResearchResults, GatewayError>;

    /// Request cancellation; fire-and-forget for local state purposes
    async fn cancel_session(&self, session_id: &str) -> Result<(), GatewayError>;

    /// List prior sessions, paginated
    async fn list_history(&self, page: u32, limit: u32) -> Result<HistoryPage, GatewayError>;
}
