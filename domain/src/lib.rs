//! Domain layer for research-beacon
//!
//! This crate contains the session-tracking core: the pipeline state machine,
//! the canonical update event type, and the message normalizer that folds the
//! two delivery channels (push socket, status polling) into one vocabulary.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Two channels, one truth
//!
//! A research session reports progress over a persistent socket and over
//! periodic status polls. Neither channel is ordered relative to the other,
//! so correctness lives here, in two rules:
//!
//! - **Monotonicity**: agent and overall progress never regress
//! - **Terminal latch**: completed/failed/cancelled is a one-way gate
//!
//! ## Pipeline
//!
//! Every session runs the same five-stage pipeline (user proxy, researcher,
//! analyst, fact checker, report generator). Agent identity is fixed; only
//! status and progress mutate.

pub mod core;
pub mod event;
pub mod history;
pub mod normalize;
pub mod pipeline;
pub mod session;

// Re-export commonly used types
pub use crate::core::{error::DomainError, query::ResearchQuery};
pub use event::{ConnectionEvent, UpdateEvent};
pub use history::{HistoryPage, HistoryRow, Pagination, SessionSummary, project_history};
pub use normalize::{
    agent_status_from_str, normalize, normalize_frame, normalize_report, overall_hint,
    session_status_from_str,
};
pub use pipeline::{
    agent::{AgentName, AgentState, AgentStatus},
    state::{ApplyOutcome, PipelineState},
};
pub use session::{
    entities::{SessionStatus, StartOptions, TerminalOutcome},
    results::{ReportSummary, ResearchResults},
    snapshot::{ActivityEntry, ActivityKind, AgentSnapshot, SessionSnapshot},
    status_report::{AgentStatusEntry, StatusReport},
};
