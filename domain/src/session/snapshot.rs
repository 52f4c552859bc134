//! Read-only view of a tracked session
//!
//! [`SessionSnapshot`] is the only shape the presentation layer consumes.
//! It is produced by the pipeline state machine and carries no behavior.

use crate::pipeline::agent::{AgentName, AgentStatus};
use crate::session::entities::{SessionStatus, TerminalOutcome};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Immutable view of one agent for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub name: AgentName,
    pub status: AgentStatus,
    pub progress: u8,
    pub last_output: Option<String>,
}

/// Immutable view of the whole session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub status: SessionStatus,
    /// All five agents in pipeline order
    pub agents: Vec<AgentSnapshot>,
    pub overall_progress: u8,
    pub phase: Option<String>,
    pub outcome: Option<TerminalOutcome>,
    pub error: Option<String>,
}

/// Classification of an activity log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Info,
    AgentUpdate,
    Connection,
    Warning,
    Terminal,
}

/// One ordered entry in the session's activity log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub timestamp: DateTime<Utc>,
    pub kind: ActivityKind,
    pub message: String,
}

impl ActivityEntry {
    pub fn now(kind: ActivityKind, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            kind,
            message: message.into(),
        }
    }
}
