//! Tracker events emitted by the session controller for presentation
//!
//! These events form the output port from the application layer to whatever
//! renders the session (console presenter here; any UI elsewhere). The
//! presentation layer subscribes to the stream and renders; it never reaches
//! back into the controller.

use beacon_domain::{ActivityEntry, ResearchResults, SessionSnapshot, TerminalOutcome};

/// Events emitted while tracking one session
#[derive(Debug, Clone)]
pub enum TrackerEvent {
    /// Tracking began for a session (fresh start or resume)
    SessionStarted { session_id: String },

    /// The consolidated view changed; always carries the full snapshot
    Snapshot(SessionSnapshot),

    /// A new ordered entry was appended to the activity log
    Activity(ActivityEntry),

    /// Non-fatal channel degradation (socket lost, poll hiccup)
    ChannelWarning { message: String },

    /// Results fetched after terminal completion; sent at most once
    ResultsReady(Box<ResearchResults>),

    /// The single results fetch failed; the session stays completed
    ResultsError { error: String },

    /// Tracking ended with a terminal outcome
    Finished { outcome: TerminalOutcome },
}
