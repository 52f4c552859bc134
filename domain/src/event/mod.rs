//! Canonical update events
//!
//! [`UpdateEvent`] is the single shape both channels are normalized into
//! before the pipeline state machine sees them. The union is closed on
//! purpose: a new backend frame type has to be mapped here explicitly, and
//! the state machine matches exhaustively, so unhandled shapes surface at
//! compile time instead of falling through a default branch.

use crate::pipeline::agent::{AgentName, AgentStatus};
use crate::session::entities::TerminalOutcome;
use serde::{Deserialize, Serialize};

/// A normalized update for one session, consumed exactly once
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UpdateEvent {
    /// Status/progress change for one named agent
    Agent {
        name: AgentName,
        status: AgentStatus,
        progress: u8,
        output: Option<String>,
    },
    /// Pipeline-wide progress and/or phase label
    Overall {
        progress: Option<u8>,
        phase: Option<String>,
    },
    /// Session reached a terminal outcome
    Terminal {
        outcome: TerminalOutcome,
        error: Option<String>,
    },
    /// Push channel connectivity change; never mutates pipeline state
    Connection(ConnectionEvent),
    /// Informational line for the activity log; never mutates pipeline state
    Log { message: String },
}

/// Connectivity signal from the push channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionEvent {
    Established,
    Lost,
}

impl UpdateEvent {
    /// Whether this event can mutate agent or overall state
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            UpdateEvent::Agent { .. } | UpdateEvent::Overall { .. } | UpdateEvent::Terminal { .. }
        )
    }

    /// Short label for logging
    pub fn kind(&self) -> &'static str {
        match self {
            UpdateEvent::Agent { .. } => "agent",
            UpdateEvent::Overall { .. } => "overall",
            UpdateEvent::Terminal { .. } => "terminal",
            UpdateEvent::Connection(_) => "connection",
            UpdateEvent::Log { .. } => "log",
        }
    }
}
