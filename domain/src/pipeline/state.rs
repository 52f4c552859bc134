//! Pipeline state machine
//!
//! Owns the five agents, the overall progress/phase, and the terminal latch.
//! Updates from the two channels arrive in no guaranteed relative order, so
//! this module is where correctness is enforced:
//!
//! - agent status never regresses out of `completed`/`failed`
//! - overall progress is monotonically non-decreasing
//! - the terminal latch is a one-way gate; later events are log-only

use crate::event::UpdateEvent;
use crate::pipeline::agent::{AgentName, AgentState, AgentStatus};
use crate::session::entities::{SessionStatus, TerminalOutcome};
use crate::session::snapshot::{AgentSnapshot, SessionSnapshot};

/// Result of feeding one event to the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// State changed; observers should be notified
    Changed,
    /// Event was valid but carried nothing new
    Unchanged,
    /// Event was rejected by a monotonicity rule or the terminal latch
    Ignored,
    /// Event never mutates state (connection/log)
    LogOnly,
}

impl ApplyOutcome {
    pub fn changed(&self) -> bool {
        matches!(self, ApplyOutcome::Changed)
    }
}

/// State of one tracked session's pipeline
#[derive(Debug, Clone)]
pub struct PipelineState {
    agents: [AgentState; 5],
    overall_progress: u8,
    phase: Option<String>,
    outcome: Option<TerminalOutcome>,
    error: Option<String>,
}

impl PipelineState {
    /// Fresh state: all agents pending, overall progress 0
    pub fn new() -> Self {
        Self {
            agents: std::array::from_fn(|_| AgentState::pending()),
            overall_progress: 0,
            phase: None,
            outcome: None,
            error: None,
        }
    }

    pub fn agent(&self, name: AgentName) -> &AgentState {
        &self.agents[name.index()]
    }

    pub fn overall_progress(&self) -> u8 {
        self.overall_progress
    }

    pub fn phase(&self) -> Option<&str> {
        self.phase.as_deref()
    }

    pub fn outcome(&self) -> Option<TerminalOutcome> {
        self.outcome
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_terminal(&self) -> bool {
        self.outcome.is_some()
    }

    /// Session-level status derived from the latch and agent activity
    pub fn session_status(&self) -> SessionStatus {
        if let Some(outcome) = self.outcome {
            return SessionStatus::from(outcome);
        }
        let started = self.overall_progress > 0
            || self
                .agents
                .iter()
                .any(|a| a.status != AgentStatus::Pending || a.progress > 0);
        if started {
            SessionStatus::Running
        } else {
            SessionStatus::Queued
        }
    }

    /// Apply one normalized event, in arrival order
    pub fn apply(&mut self, event: &UpdateEvent) -> ApplyOutcome {
        match event {
            UpdateEvent::Connection(_) | UpdateEvent::Log { .. } => ApplyOutcome::LogOnly,

            // Terminal latch: once set, every mutating event is log-only.
            _ if self.outcome.is_some() => ApplyOutcome::Ignored,

            UpdateEvent::Agent {
                name,
                status,
                progress,
                output,
            } => self.apply_agent(*name, *status, *progress, output.as_deref()),

            UpdateEvent::Overall { progress, phase } => {
                self.apply_overall(*progress, phase.as_deref())
            }

            UpdateEvent::Terminal { outcome, error } => {
                self.apply_terminal(*outcome, error.as_deref())
            }
        }
    }

    fn apply_agent(
        &mut self,
        name: AgentName,
        status: AgentStatus,
        progress: u8,
        output: Option<&str>,
    ) -> ApplyOutcome {
        let agent = &mut self.agents[name.index()];

        // Anti-regression invariant: a finished agent stays finished.
        if agent.status.is_terminal() {
            return ApplyOutcome::Ignored;
        }

        let progress = progress.min(100);
        let changed = agent.status != status
            || agent.progress != progress
            || (output.is_some() && agent.last_output.as_deref() != output);
        agent.status = status;
        agent.progress = progress;
        if let Some(output) = output {
            agent.last_output = Some(output.to_string());
        }
        if changed {
            ApplyOutcome::Changed
        } else {
            ApplyOutcome::Unchanged
        }
    }

    fn apply_overall(&mut self, progress: Option<u8>, phase: Option<&str>) -> ApplyOutcome {
        if let Some(progress) = progress {
            let progress = progress.min(100);
            // Monotonicity: a stale poll response must not undo a fresher
            // push update.
            if progress < self.overall_progress {
                return ApplyOutcome::Ignored;
            }
            let changed =
                progress > self.overall_progress || (phase.is_some() && self.phase.as_deref() != phase);
            self.overall_progress = progress;
            if let Some(phase) = phase {
                self.phase = Some(phase.to_string());
            }
            return if changed {
                ApplyOutcome::Changed
            } else {
                ApplyOutcome::Unchanged
            };
        }

        // Phase-only update; the label is advisory.
        match phase {
            Some(phase) if self.phase.as_deref() != Some(phase) => {
                self.phase = Some(phase.to_string());
                ApplyOutcome::Changed
            }
            Some(_) => ApplyOutcome::Unchanged,
            None => ApplyOutcome::Unchanged,
        }
    }

    fn apply_terminal(&mut self, outcome: TerminalOutcome, error: Option<&str>) -> ApplyOutcome {
        self.outcome = Some(outcome);
        if let Some(error) = error {
            self.error = Some(error.to_string());
        }

        match outcome {
            TerminalOutcome::Completed => {
                // Completion implies every stage finished, even if individual
                // agent-level updates were missed on both channels.
                for agent in &mut self.agents {
                    agent.status = AgentStatus::Completed;
                    agent.progress = 100;
                }
                self.overall_progress = 100;
            }
            TerminalOutcome::Failed | TerminalOutcome::Cancelled => {
                // Agents keep the state they reached so the user can see
                // which stage the run got to.
            }
        }
        ApplyOutcome::Changed
    }

    /// Read-only snapshot for the presentation layer
    pub fn snapshot(&self, session_id: &str) -> SessionSnapshot {
        SessionSnapshot {
            session_id: session_id.to_string(),
            status: self.session_status(),
            agents: AgentName::ALL
                .iter()
                .map(|name| AgentSnapshot {
                    name: *name,
                    status: self.agent(*name).status,
                    progress: self.agent(*name).progress,
                    last_output: self.agent(*name).last_output.clone(),
                })
                .collect(),
            overall_progress: self.overall_progress,
            phase: self.phase.clone(),
            outcome: self.outcome,
            error: self.error.clone(),
        }
    }
}

impl Default for PipelineState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent_event(name: AgentName, status: AgentStatus, progress: u8) -> UpdateEvent {
        UpdateEvent::Agent {
            name,
            status,
            progress,
            output: None,
        }
    }

    fn overall_event(progress: u8) -> UpdateEvent {
        UpdateEvent::Overall {
            progress: Some(progress),
            phase: None,
        }
    }

    fn terminal_event(outcome: TerminalOutcome) -> UpdateEvent {
        UpdateEvent::Terminal {
            outcome,
            error: None,
        }
    }

    #[test]
    fn test_initial_state() {
        let state = PipelineState::new();
        assert_eq!(state.session_status(), SessionStatus::Queued);
        assert_eq!(state.overall_progress(), 0);
        for name in AgentName::ALL {
            assert_eq!(state.agent(name).status, AgentStatus::Pending);
        }
    }

    #[test]
    fn test_agent_update_applies() {
        let mut state = PipelineState::new();
        let outcome = state.apply(&agent_event(AgentName::Researcher, AgentStatus::Running, 40));
        assert_eq!(outcome, ApplyOutcome::Changed);
        assert_eq!(state.agent(AgentName::Researcher).status, AgentStatus::Running);
        assert_eq!(state.agent(AgentName::Researcher).progress, 40);
        assert_eq!(state.session_status(), SessionStatus::Running);
        // Other agents untouched
        assert_eq!(state.agent(AgentName::Analyst).status, AgentStatus::Pending);
    }

    #[test]
    fn test_completed_agent_never_regresses() {
        let mut state = PipelineState::new();
        state.apply(&agent_event(AgentName::Researcher, AgentStatus::Completed, 100));

        // A stale update from the other channel arrives afterwards.
        let outcome = state.apply(&agent_event(AgentName::Researcher, AgentStatus::Running, 60));
        assert_eq!(outcome, ApplyOutcome::Ignored);
        assert_eq!(
            state.agent(AgentName::Researcher).status,
            AgentStatus::Completed
        );
        assert_eq!(state.agent(AgentName::Researcher).progress, 100);
    }

    #[test]
    fn test_failed_agent_never_regresses() {
        let mut state = PipelineState::new();
        state.apply(&agent_event(AgentName::Analyst, AgentStatus::Failed, 30));
        let outcome = state.apply(&agent_event(AgentName::Analyst, AgentStatus::Pending, 0));
        assert_eq!(outcome, ApplyOutcome::Ignored);
        assert_eq!(state.agent(AgentName::Analyst).status, AgentStatus::Failed);
    }

    #[test]
    fn test_duplicate_agent_update_is_unchanged() {
        let mut state = PipelineState::new();
        state.apply(&agent_event(AgentName::Researcher, AgentStatus::Running, 40));
        let outcome = state.apply(&agent_event(AgentName::Researcher, AgentStatus::Running, 40));
        assert_eq!(outcome, ApplyOutcome::Unchanged);
    }

    #[test]
    fn test_overall_progress_is_monotonic() {
        let mut state = PipelineState::new();
        assert!(state.apply(&overall_event(60)).changed());
        assert_eq!(state.overall_progress(), 60);

        // Stale poll response arriving after a fresher push update.
        assert_eq!(state.apply(&overall_event(30)), ApplyOutcome::Ignored);
        assert_eq!(state.overall_progress(), 60);

        assert!(state.apply(&overall_event(75)).changed());
        assert_eq!(state.overall_progress(), 75);
    }

    #[test]
    fn test_overall_progress_clamped() {
        let mut state = PipelineState::new();
        state.apply(&UpdateEvent::Overall {
            progress: Some(100),
            phase: None,
        });
        assert_eq!(state.overall_progress(), 100);
    }

    #[test]
    fn test_phase_only_update() {
        let mut state = PipelineState::new();
        let outcome = state.apply(&UpdateEvent::Overall {
            progress: None,
            phase: Some("analysis".to_string()),
        });
        assert_eq!(outcome, ApplyOutcome::Changed);
        assert_eq!(state.phase(), Some("analysis"));
        assert_eq!(state.overall_progress(), 0);
    }

    #[test]
    fn test_terminal_completed_forces_everything() {
        let mut state = PipelineState::new();
        state.apply(&agent_event(AgentName::UserProxy, AgentStatus::Completed, 100));
        state.apply(&agent_event(AgentName::Researcher, AgentStatus::Running, 50));
        state.apply(&overall_event(40));

        let outcome = state.apply(&terminal_event(TerminalOutcome::Completed));
        assert_eq!(outcome, ApplyOutcome::Changed);
        assert_eq!(state.session_status(), SessionStatus::Completed);
        assert_eq!(state.overall_progress(), 100);
        for name in AgentName::ALL {
            assert_eq!(state.agent(name).status, AgentStatus::Completed);
            assert_eq!(state.agent(name).progress, 100);
        }
    }

    #[test]
    fn test_terminal_failed_leaves_agents_as_reached() {
        let mut state = PipelineState::new();
        state.apply(&agent_event(AgentName::UserProxy, AgentStatus::Completed, 100));
        state.apply(&agent_event(AgentName::Researcher, AgentStatus::Running, 50));

        state.apply(&UpdateEvent::Terminal {
            outcome: TerminalOutcome::Failed,
            error: Some("timeout".to_string()),
        });
        assert_eq!(state.session_status(), SessionStatus::Failed);
        assert_eq!(state.error(), Some("timeout"));
        // The user can still see which stage the failure reached.
        assert_eq!(state.agent(AgentName::UserProxy).status, AgentStatus::Completed);
        assert_eq!(state.agent(AgentName::Researcher).status, AgentStatus::Running);
        assert_eq!(state.agent(AgentName::Analyst).status, AgentStatus::Pending);
    }

    #[test]
    fn test_terminal_latch_is_one_way() {
        let mut state = PipelineState::new();
        state.apply(&terminal_event(TerminalOutcome::Cancelled));

        // A late server-confirmed completion must be absorbed.
        assert_eq!(
            state.apply(&terminal_event(TerminalOutcome::Completed)),
            ApplyOutcome::Ignored
        );
        assert_eq!(state.session_status(), SessionStatus::Cancelled);

        // So must agent and overall updates.
        assert_eq!(
            state.apply(&agent_event(AgentName::Researcher, AgentStatus::Running, 80)),
            ApplyOutcome::Ignored
        );
        assert_eq!(state.apply(&overall_event(90)), ApplyOutcome::Ignored);
    }

    #[test]
    fn test_duplicate_terminal_is_ignored() {
        let mut state = PipelineState::new();
        assert!(state.apply(&terminal_event(TerminalOutcome::Completed)).changed());
        assert_eq!(
            state.apply(&terminal_event(TerminalOutcome::Completed)),
            ApplyOutcome::Ignored
        );
    }

    #[test]
    fn test_connection_and_log_events_never_mutate() {
        let mut state = PipelineState::new();
        assert_eq!(
            state.apply(&UpdateEvent::Connection(crate::event::ConnectionEvent::Lost)),
            ApplyOutcome::LogOnly
        );
        assert_eq!(
            state.apply(&UpdateEvent::Log {
                message: "searching sources".to_string()
            }),
            ApplyOutcome::LogOnly
        );
        assert_eq!(state.session_status(), SessionStatus::Queued);
    }

    #[test]
    fn test_interleaved_channels_converge() {
        // Socket and poller deliver overlapping views of the same run; the
        // result must be the same monotonic progression either way.
        let mut state = PipelineState::new();
        let events = [
            agent_event(AgentName::UserProxy, AgentStatus::Running, 50),
            overall_event(5),
            agent_event(AgentName::UserProxy, AgentStatus::Completed, 100),
            // poll snapshot older than the push stream
            agent_event(AgentName::UserProxy, AgentStatus::Running, 80),
            overall_event(3),
            agent_event(AgentName::Researcher, AgentStatus::Running, 20),
            overall_event(25),
        ];
        for event in &events {
            state.apply(event);
        }
        assert_eq!(state.agent(AgentName::UserProxy).status, AgentStatus::Completed);
        assert_eq!(state.overall_progress(), 25);
        assert_eq!(state.agent(AgentName::Researcher).progress, 20);
    }

    #[test]
    fn test_snapshot_reflects_state() {
        let mut state = PipelineState::new();
        state.apply(&agent_event(AgentName::Researcher, AgentStatus::Running, 40));
        state.apply(&UpdateEvent::Overall {
            progress: Some(10),
            phase: Some("discovery".to_string()),
        });

        let snapshot = state.snapshot("abc123");
        assert_eq!(snapshot.session_id, "abc123");
        assert_eq!(snapshot.status, SessionStatus::Running);
        assert_eq!(snapshot.overall_progress, 10);
        assert_eq!(snapshot.phase.as_deref(), Some("discovery"));
        assert_eq!(snapshot.agents.len(), 5);
        assert_eq!(snapshot.agents[1].name, AgentName::Researcher);
        assert_eq!(snapshot.agents[1].progress, 40);
    }
}
