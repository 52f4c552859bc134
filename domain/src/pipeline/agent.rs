//! Agent identity and per-agent state
//!
//! Every session runs the same ordered pipeline of five agents. Identity is
//! fixed at session creation; only status and progress mutate.

use serde::{Deserialize, Serialize};

/// One named stage of the fixed five-stage pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentName {
    UserProxy,
    Researcher,
    Analyst,
    FactChecker,
    ReportGenerator,
}

impl AgentName {
    /// All agents in pipeline order
    pub const ALL: [AgentName; 5] = [
        AgentName::UserProxy,
        AgentName::Researcher,
        AgentName::Analyst,
        AgentName::FactChecker,
        AgentName::ReportGenerator,
    ];

    /// The key the backend uses on the wire
    pub fn wire_key(&self) -> &'static str {
        match self {
            AgentName::UserProxy => "user_proxy",
            AgentName::Researcher => "researcher",
            AgentName::Analyst => "analyst",
            AgentName::FactChecker => "fact_checker",
            AgentName::ReportGenerator => "report_generator",
        }
    }

    /// Human-readable name for display
    pub fn display_name(&self) -> &'static str {
        match self {
            AgentName::UserProxy => "User Proxy",
            AgentName::Researcher => "Researcher",
            AgentName::Analyst => "Analyst",
            AgentName::FactChecker => "Fact-Checker",
            AgentName::ReportGenerator => "Report Generator",
        }
    }

    /// Position in the pipeline (0-based)
    pub fn index(&self) -> usize {
        match self {
            AgentName::UserProxy => 0,
            AgentName::Researcher => 1,
            AgentName::Analyst => 2,
            AgentName::FactChecker => 3,
            AgentName::ReportGenerator => 4,
        }
    }

    /// Parse an agent key, tolerating separator and casing variants
    ///
    /// The two channels historically disagree on spelling: the socket sends
    /// `fact_checker` while older poll snapshots used `fact-checker` or the
    /// display name. All of them resolve to the same agent.
    pub fn parse(key: &str) -> Option<Self> {
        let folded: String = key
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match folded.as_str() {
            "userproxy" => Some(AgentName::UserProxy),
            "researcher" => Some(AgentName::Researcher),
            "analyst" => Some(AgentName::Analyst),
            "factchecker" => Some(AgentName::FactChecker),
            "reportgenerator" => Some(AgentName::ReportGenerator),
            _ => None,
        }
    }
}

impl std::fmt::Display for AgentName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.wire_key())
    }
}

/// Status of an individual agent within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl AgentStatus {
    /// Whether this agent's state may no longer change for this session
    pub fn is_terminal(&self) -> bool {
        matches!(self, AgentStatus::Completed | AgentStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentStatus::Pending => "pending",
            AgentStatus::Running => "running",
            AgentStatus::Completed => "completed",
            AgentStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Mutable state of one agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentState {
    pub status: AgentStatus,
    /// Progress percentage, clamped to 0..=100
    pub progress: u8,
    /// Last output line, kept for the activity log only
    pub last_output: Option<String>,
}

impl AgentState {
    pub fn pending() -> Self {
        Self {
            status: AgentStatus::Pending,
            progress: 0,
            last_output: None,
        }
    }
}

impl Default for AgentState {
    fn default() -> Self {
        Self::pending()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_order_is_stable() {
        let keys: Vec<&str> = AgentName::ALL.iter().map(|a| a.wire_key()).collect();
        assert_eq!(
            keys,
            vec![
                "user_proxy",
                "researcher",
                "analyst",
                "fact_checker",
                "report_generator"
            ]
        );
    }

    #[test]
    fn test_parse_wire_keys() {
        for agent in AgentName::ALL {
            assert_eq!(AgentName::parse(agent.wire_key()), Some(agent));
        }
    }

    #[test]
    fn test_parse_tolerates_separator_variants() {
        assert_eq!(AgentName::parse("fact-checker"), Some(AgentName::FactChecker));
        assert_eq!(AgentName::parse("factChecker"), Some(AgentName::FactChecker));
        assert_eq!(AgentName::parse("Fact-Checker"), Some(AgentName::FactChecker));
        assert_eq!(AgentName::parse("User Proxy"), Some(AgentName::UserProxy));
        assert_eq!(
            AgentName::parse("REPORT_GENERATOR"),
            Some(AgentName::ReportGenerator)
        );
    }

    #[test]
    fn test_parse_unknown_agent() {
        assert_eq!(AgentName::parse("orchestrator"), None);
        assert_eq!(AgentName::parse(""), None);
    }

    #[test]
    fn test_terminal_agent_statuses() {
        assert!(AgentStatus::Completed.is_terminal());
        assert!(AgentStatus::Failed.is_terminal());
        assert!(!AgentStatus::Pending.is_terminal());
        assert!(!AgentStatus::Running.is_terminal());
    }
}
