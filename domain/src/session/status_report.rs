//! Typed status snapshot returned by the pull channel
//!
//! The status endpoint and the socket's `status_response` frame share this
//! shape. Field names are the backend's contract; the historical spellings
//! (`current_stage` for `current_phase`, `error` for `error_message`) are
//! still emitted by older deployments and must keep deserializing.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-agent entry inside a status snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentStatusEntry {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub progress: Option<i64>,
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// One point-in-time view of a session as reported by the backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub progress: Option<i64>,
    #[serde(default, alias = "phase")]
    pub current_phase: Option<String>,
    /// Historical spelling of `current_phase`
    #[serde(default)]
    pub current_stage: Option<String>,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default, alias = "agents")]
    pub agent_statuses: HashMap<String, AgentStatusEntry>,
    #[serde(default)]
    pub error_message: Option<String>,
    /// Historical spelling of `error_message`
    #[serde(default)]
    pub error: Option<String>,
}

impl StatusReport {
    /// Phase label, preferring the current spelling
    pub fn phase(&self) -> Option<&str> {
        self.current_phase
            .as_deref()
            .or(self.current_stage.as_deref())
    }

    /// Error string, preferring the current spelling
    pub fn error_text(&self) -> Option<&str> {
        self.error_message.as_deref().or(self.error.as_deref())
    }
}
