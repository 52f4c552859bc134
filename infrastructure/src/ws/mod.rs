//! WebSocket adapter for the push channel

pub mod channel;
