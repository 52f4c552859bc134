//! Console rendering of tracker events
//!
//! Renders the session snapshot as a block of progress bars (one per
//! pipeline agent plus the overall bar) and streams activity-log lines
//! above them. Pure formatting helpers are kept separate from the indicatif
//! plumbing so they stay testable.

use beacon_application::TrackerEvent;
use beacon_domain::{
    ActivityKind, AgentName, AgentStatus, HistoryRow, ResearchResults, SessionSnapshot,
    SessionStatus, TerminalOutcome,
};
use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Renders tracker events to the terminal
pub struct ConsolePresenter {
    multi: MultiProgress,
    overall: Option<ProgressBar>,
    agents: Vec<ProgressBar>,
    progress_enabled: bool,
    verbose: bool,
}

impl ConsolePresenter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            overall: None,
            agents: Vec::new(),
            progress_enabled: true,
            verbose: false,
        }
    }

    /// Disable the live progress display (quiet mode)
    pub fn with_progress(mut self, enabled: bool) -> Self {
        self.progress_enabled = enabled;
        self
    }

    /// Also print per-agent activity lines (redundant with the bars)
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Render one tracker event
    pub fn handle(&mut self, event: &TrackerEvent) {
        match event {
            TrackerEvent::SessionStarted { session_id } => {
                self.println(format!("Tracking session {}", session_id.bold()));
                if self.progress_enabled {
                    self.build_bars();
                }
            }
            TrackerEvent::Snapshot(snapshot) => self.render_snapshot(snapshot),
            TrackerEvent::Activity(entry) => {
                let show = match entry.kind {
                    ActivityKind::AgentUpdate => self.verbose,
                    _ => true,
                };
                if show {
                    self.println(format_activity(&entry.message, entry.kind));
                }
            }
            TrackerEvent::ChannelWarning { message } => {
                self.println(format!("{} {}", "warning:".yellow().bold(), message));
            }
            TrackerEvent::ResultsReady(results) => {
                self.clear_bars();
                for line in summarize_results(results) {
                    println!("{}", line);
                }
            }
            TrackerEvent::ResultsError { error } => {
                self.println(format!(
                    "{} results fetch failed: {}",
                    "error:".red().bold(),
                    error
                ));
            }
            TrackerEvent::Finished { outcome } => {
                self.clear_bars();
                println!("{}", format_outcome(*outcome));
            }
        }
    }

    fn build_bars(&mut self) {
        let overall = self.multi.add(ProgressBar::new(100));
        overall.set_style(overall_style());
        overall.set_prefix("overall");
        self.overall = Some(overall);

        self.agents = AgentName::ALL
            .iter()
            .map(|name| {
                let bar = self.multi.add(ProgressBar::new(100));
                bar.set_style(agent_style());
                bar.set_prefix(name.display_name().to_string());
                bar
            })
            .collect();
    }

    fn render_snapshot(&mut self, snapshot: &SessionSnapshot) {
        if !self.progress_enabled {
            return;
        }
        if let Some(overall) = &self.overall {
            overall.set_position(snapshot.overall_progress as u64);
            if let Some(phase) = &snapshot.phase {
                overall.set_message(phase.clone());
            }
        }
        for agent in &snapshot.agents {
            if let Some(bar) = self.agents.get(agent.name.index()) {
                bar.set_position(agent.progress as u64);
                bar.set_message(format!("{} {}", status_glyph(agent.status), agent.status));
            }
        }
    }

    fn clear_bars(&mut self) {
        for bar in self.agents.drain(..) {
            bar.finish_and_clear();
        }
        if let Some(overall) = self.overall.take() {
            overall.finish_and_clear();
        }
    }

    /// Print a line without tearing the live bars
    fn println(&self, line: String) {
        if self.progress_enabled && self.overall.is_some() {
            let _ = self.multi.println(line);
        } else {
            println!("{}", line);
        }
    }
}

impl Default for ConsolePresenter {
    fn default() -> Self {
        Self::new()
    }
}

fn overall_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{prefix:>16.bold.cyan} [{bar:40.cyan/blue}] {pos:>3}% {msg}")
        .unwrap()
        .progress_chars("=>-")
}

fn agent_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{prefix:>16} [{bar:40.green/white}] {pos:>3}% {msg}")
        .unwrap()
        .progress_chars("=>-")
}

fn format_activity(message: &str, kind: ActivityKind) -> String {
    match kind {
        ActivityKind::Warning => format!("{} {}", "!".yellow(), message),
        ActivityKind::Terminal => format!("{} {}", "*".bold(), message),
        _ => format!("  {}", message.dimmed()),
    }
}

/// Final status line for a terminal outcome
fn format_outcome(outcome: TerminalOutcome) -> String {
    match outcome {
        TerminalOutcome::Completed => format!("research {}", "completed".green().bold()),
        TerminalOutcome::Failed => format!("research {}", "failed".red().bold()),
        TerminalOutcome::Cancelled => format!("research {}", "cancelled".yellow().bold()),
    }
}

/// Human summary of a results payload
fn summarize_results(results: &ResearchResults) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(title) = results.title() {
        lines.push(format!("{}", title.bold()));
    }
    if let Some(summary) = results
        .report
        .as_ref()
        .and_then(|r| r.executive_summary.as_deref())
    {
        lines.push(summary.to_string());
    }
    lines.push(format!("{} findings", results.findings_total()));
    lines
}

/// Render the history listing as aligned rows
pub fn render_history(rows: &[HistoryRow]) {
    if rows.is_empty() {
        println!("no past sessions");
        return;
    }
    for row in rows {
        println!("{}", format_history_row(row));
    }
}

fn format_history_row(row: &HistoryRow) -> String {
    let status = match row.status {
        SessionStatus::Completed => row.status.as_str().green(),
        SessionStatus::Failed => row.status.as_str().red(),
        SessionStatus::Cancelled => row.status.as_str().yellow(),
        _ => row.status.as_str().cyan(),
    };
    let progress = row
        .progress
        .map(|p| format!(" {:>3}%", p))
        .unwrap_or_default();
    let created = row.created_at.as_deref().unwrap_or("-");
    format!(
        "{:<36} {:>9}{}  {:<19}  {}",
        row.session_id, status, progress, created, row.query
    )
}

/// Short glyph for an agent status, used in verbose activity lines
pub fn status_glyph(status: AgentStatus) -> &'static str {
    match status {
        AgentStatus::Pending => ".",
        AgentStatus::Running => ">",
        AgentStatus::Completed => "+",
        AgentStatus::Failed => "x",
    }
}
