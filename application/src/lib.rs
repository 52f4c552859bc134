//! Application layer for research-beacon
//!
//! This crate contains the session controller use case, the port definitions
//! for the backend gateway and the push channel, and the polling fallback.
//! It depends only on the domain layer.

pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use ports::{
    backend_gateway::{BackendGateway, GatewayError, StartedSession},
    push_channel::{ChannelError, ChannelEvent, PushChannel, PushHandle},
    tracker_event::TrackerEvent,
};
pub use use_cases::{
    SourceEvent,
    polling::spawn_status_poller,
    session_controller::{ControllerError, ControllerState, SessionController},
};
