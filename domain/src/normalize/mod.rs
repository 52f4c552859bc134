//! Message normalizer
//!
//! Maps the heterogeneous payload shapes arriving from either channel into
//! the canonical [`UpdateEvent`] vocabulary. Everything here is pure: raw
//! JSON in, zero or more events out, never an error. Payloads this module
//! cannot make sense of are dropped with a log line; channel redundancy
//! guarantees the state machine converges from the other source.

use crate::event::{ConnectionEvent, UpdateEvent};
use crate::pipeline::agent::{AgentName, AgentStatus};
use crate::session::entities::{SessionStatus, TerminalOutcome};
use crate::session::status_report::StatusReport;
use serde_json::Value;
use tracing::{debug, warn};

/// Map a free-text agent status string to the canonical vocabulary
///
/// Case-insensitive. Unrecognized strings normalize to `pending` and are
/// logged as a warning, never an error.
pub fn agent_status_from_str(raw: &str) -> AgentStatus {
    match raw.to_ascii_lowercase().as_str() {
        "idle" | "queued" | "pending" | "waiting" => AgentStatus::Pending,
        "in_progress" | "running" | "active" | "working" | "started" => AgentStatus::Running,
        "completed" | "complete" | "done" | "success" => AgentStatus::Completed,
        "failed" | "error" => AgentStatus::Failed,
        other => {
            warn!(status = other, "unrecognized agent status, treating as pending");
            AgentStatus::Pending
        }
    }
}

/// Map a free-text session status string to the canonical vocabulary
pub fn session_status_from_str(raw: &str) -> Option<SessionStatus> {
    match raw.to_ascii_lowercase().as_str() {
        "initialized" | "queued" | "pending" | "created" => Some(SessionStatus::Queued),
        // `paused` is non-terminal; the session is still owned by the backend
        "running" | "in_progress" | "active" | "paused" => Some(SessionStatus::Running),
        "completed" | "complete" | "research_complete" => Some(SessionStatus::Completed),
        "failed" | "error" => Some(SessionStatus::Failed),
        "cancelled" | "canceled" => Some(SessionStatus::Cancelled),
        "" => None,
        other => {
            warn!(status = other, "unrecognized session status");
            None
        }
    }
}

/// Normalize one push-channel frame into at most one event
///
/// Returns `None` for payloads with no actionable field; those are dropped,
/// not errors.
pub fn normalize_frame(value: &Value) -> Option<UpdateEvent> {
    let frame_type = value.get("type").and_then(Value::as_str).unwrap_or("");

    match frame_type {
        "connection_established" => Some(UpdateEvent::Connection(ConnectionEvent::Established)),

        // Current and historical spellings of the per-agent update
        "agent_status_update" | "agent_update" => normalize_agent_frame(value),

        "phase_update" => {
            let phase = value.get("phase").and_then(Value::as_str)?;
            Some(UpdateEvent::Overall {
                progress: None,
                phase: Some(phase.to_string()),
            })
        }

        "progress_update" => {
            let progress = progress_field(value)?;
            Some(UpdateEvent::Overall {
                progress: Some(progress),
                phase: value
                    .get("phase")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            })
        }

        "research_complete" | "research_completed" | "completed" => Some(UpdateEvent::Terminal {
            outcome: TerminalOutcome::Completed,
            error: None,
        }),

        "research_error" | "research_failed" | "failed" => Some(UpdateEvent::Terminal {
            outcome: TerminalOutcome::Failed,
            error: error_field(value),
        }),

        "research_cancelled" | "cancelled" => Some(UpdateEvent::Terminal {
            outcome: TerminalOutcome::Cancelled,
            error: None,
        }),

        "log" | "info" => {
            let message = value
                .get("message")
                .or_else(|| value.get("content"))
                .and_then(Value::as_str)?;
            Some(UpdateEvent::Log {
                message: message.to_string(),
            })
        }

        // Liveness frames are answered at the transport and never surface;
        // seeing one here is harmless.
        "ping" | "pong" => None,

        other => {
            debug!(frame_type = other, "dropping unrecognized frame");
            None
        }
    }
}

fn normalize_agent_frame(value: &Value) -> Option<UpdateEvent> {
    let key = value
        .get("agent")
        .or_else(|| value.get("agent_name"))
        .and_then(Value::as_str)?;

    let Some(name) = AgentName::parse(key) else {
        warn!(agent = key, "ignoring update for unknown agent");
        return None;
    };

    let status = value.get("status").and_then(Value::as_str)?;

    Some(UpdateEvent::Agent {
        name,
        status: agent_status_from_str(status),
        progress: progress_field(value).unwrap_or(0),
        output: value
            .get("output")
            .and_then(Value::as_str)
            .map(str::to_string),
    })
}

/// Pipeline-wide progress piggybacked on an agent frame
///
/// The backend attaches `data.overall_progress` to per-agent updates so the
/// push channel carries the overall figure too. Applied after the agent
/// event from the same frame; §monotonicity handles the rest.
pub fn overall_hint(value: &Value) -> Option<UpdateEvent> {
    let progress = value
        .get("data")
        .and_then(|d| d.get("overall_progress"))
        .and_then(Value::as_i64)?;
    Some(UpdateEvent::Overall {
        progress: Some(clamp_progress(progress)),
        phase: None,
    })
}

/// Normalize a pull-channel status snapshot into an ordered event batch
///
/// Agent events first, then the overall figure, then a terminal event if the
/// reported status is terminal. Terminal last so per-agent detail lands
/// before the latch closes.
pub fn normalize_report(report: &StatusReport) -> Vec<UpdateEvent> {
    let mut events = Vec::new();

    for name in AgentName::ALL {
        let entry = report
            .agent_statuses
            .iter()
            .find(|(key, _)| AgentName::parse(key) == Some(name))
            .map(|(_, entry)| entry);
        let Some(entry) = entry else { continue };
        let Some(status) = entry.status.as_deref() else {
            continue;
        };
        events.push(UpdateEvent::Agent {
            name,
            status: agent_status_from_str(status),
            progress: entry.progress.map(clamp_progress).unwrap_or(0),
            output: entry.output.clone(),
        });
    }

    for key in report.agent_statuses.keys() {
        if AgentName::parse(key).is_none() {
            warn!(agent = key.as_str(), "status snapshot names unknown agent");
        }
    }

    let progress = report.progress.map(clamp_progress);
    let phase = report.phase().map(str::to_string);
    if progress.is_some() || phase.is_some() {
        events.push(UpdateEvent::Overall { progress, phase });
    }

    if let Some(outcome) = session_status_from_str(&report.status).and_then(|s| s.terminal_outcome())
    {
        events.push(UpdateEvent::Terminal {
            outcome,
            error: report.error_text().map(str::to_string),
        });
    }

    events
}

/// Normalize any raw payload from either channel into an event batch
///
/// The one entry point the session controller uses: expands status-shaped
/// frames into their full batch and picks up the piggybacked overall figure
/// on agent frames.
pub fn normalize(value: &Value) -> Vec<UpdateEvent> {
    if value.get("type").and_then(Value::as_str) == Some("status_response") {
        return match serde_json::from_value::<StatusReport>(value.clone()) {
            Ok(report) => normalize_report(&report),
            Err(err) => {
                warn!(error = %err, "malformed status_response frame");
                Vec::new()
            }
        };
    }

    let mut events = Vec::new();
    let primary = normalize_frame(value);
    let is_agent_event = matches!(primary, Some(UpdateEvent::Agent { .. }));
    events.extend(primary);
    if is_agent_event {
        events.extend(overall_hint(value));
    }
    events
}

fn progress_field(value: &Value) -> Option<u8> {
    value
        .get("progress")
        .or_else(|| value.get("data").and_then(|d| d.get("progress")))
        .and_then(Value::as_i64)
        .map(clamp_progress)
}

fn error_field(value: &Value) -> Option<String> {
    value
        .get("error")
        .or_else(|| value.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn clamp_progress(raw: i64) -> u8 {
    raw.clamp(0, 100) as u8
}
