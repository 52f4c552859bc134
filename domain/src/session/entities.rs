//! Session domain entities and value objects

use serde::{Deserialize, Serialize};

/// Lifecycle status of a tracked research session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Queued,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl SessionStatus {
    /// Whether this status ends tracking
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionStatus::Completed | SessionStatus::Failed | SessionStatus::Cancelled
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Queued => "queued",
            SessionStatus::Running => "running",
            SessionStatus::Completed => "completed",
            SessionStatus::Failed => "failed",
            SessionStatus::Cancelled => "cancelled",
        }
    }

    /// The terminal outcome this status corresponds to, if any
    pub fn terminal_outcome(&self) -> Option<TerminalOutcome> {
        match self {
            SessionStatus::Completed => Some(TerminalOutcome::Completed),
            SessionStatus::Failed => Some(TerminalOutcome::Failed),
            SessionStatus::Cancelled => Some(TerminalOutcome::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One-shot terminal outcome of a session
///
/// Once reached, the pipeline state machine latches and ignores further
/// mutating input for that session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalOutcome {
    Completed,
    Failed,
    Cancelled,
}

impl TerminalOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            TerminalOutcome::Completed => "completed",
            TerminalOutcome::Failed => "failed",
            TerminalOutcome::Cancelled => "cancelled",
        }
    }
}

impl From<TerminalOutcome> for SessionStatus {
    fn from(outcome: TerminalOutcome) -> Self {
        match outcome {
            TerminalOutcome::Completed => SessionStatus::Completed,
            TerminalOutcome::Failed => SessionStatus::Failed,
            TerminalOutcome::Cancelled => SessionStatus::Cancelled,
        }
    }
}

impl std::fmt::Display for TerminalOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Optional knobs accepted by the backend's start operation
///
/// All fields are optional; the backend applies its own defaults. Serialized
/// as the start request body alongside the query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StartOptions {
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub focus_areas: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub source_preferences: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_sources: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub citation_style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub research_mode: Option<String>,
}

impl StartOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_focus_areas(mut self, areas: Vec<String>) -> Self {
        self.focus_areas = areas;
        self
    }

    pub fn with_source_preferences(mut self, prefs: Vec<String>) -> Self {
        self.source_preferences = prefs;
        self
    }

    pub fn with_max_sources(mut self, max: u32) -> Self {
        self.max_sources = Some(max);
        self
    }

    pub fn with_report_format(mut self, format: impl Into<String>) -> Self {
        self.report_format = Some(format.into());
        self
    }

    pub fn with_citation_style(mut self, style: impl Into<String>) -> Self {
        self.citation_style = Some(style.into());
        self
    }

    pub fn with_research_mode(mut self, mode: impl Into<String>) -> Self {
        self.research_mode = Some(mode.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_statuses() {
        assert!(SessionStatus::Completed.is_terminal());
        assert!(SessionStatus::Failed.is_terminal());
        assert!(SessionStatus::Cancelled.is_terminal());
        assert!(!SessionStatus::Queued.is_terminal());
        assert!(!SessionStatus::Running.is_terminal());
    }

    #[test]
    fn test_outcome_round_trip() {
        assert_eq!(
            SessionStatus::from(TerminalOutcome::Failed),
            SessionStatus::Failed
        );
        assert_eq!(
            SessionStatus::Failed.terminal_outcome(),
            Some(TerminalOutcome::Failed)
        );
        assert_eq!(SessionStatus::Running.terminal_outcome(), None);
    }

    #[test]
    fn test_start_options_skip_empty_fields() {
        let body = serde_json::to_value(StartOptions::new()).unwrap();
        assert_eq!(body, serde_json::json!({}));
    }

    #[test]
    fn test_start_options_builder() {
        let opts = StartOptions::new()
            .with_max_sources(50)
            .with_citation_style("APA");
        assert_eq!(opts.max_sources, Some(50));
        assert_eq!(opts.citation_style.as_deref(), Some("APA"));
    }
}
