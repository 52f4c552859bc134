//! Use cases orchestrating the domain over the ports

pub mod polling;
pub mod session_controller;

use crate::ports::push_channel::ChannelEvent;
use beacon_domain::StatusReport;

/// Raw traffic from either channel, merged into the controller's single
/// event loop
///
/// Only one logical thread of execution ever touches the pipeline state
/// machine: socket frames and poll snapshots are funneled through this type
/// into one receiver.
#[derive(Debug)]
pub enum SourceEvent {
    /// Traffic from the push socket
    Push(ChannelEvent),
    /// A successful poll snapshot
    Poll(StatusReport),
    /// One failed poll tick; non-fatal, the next tick retries
    PollFailed(String),
}
