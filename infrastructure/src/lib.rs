//! Infrastructure layer for research-beacon
//!
//! This crate contains the adapters that implement the ports defined in the
//! application layer: the HTTP backend gateway, the WebSocket push channel,
//! and configuration file loading.

pub mod config;
pub mod rest;
pub mod ws;

// Re-export commonly used types
pub use config::{
    file_config::{BackendConfig, FileConfig, TrackerConfig},
    loader::ConfigLoader,
};
pub use rest::client::HttpBackendGateway;
pub use ws::channel::WebSocketPushChannel;
