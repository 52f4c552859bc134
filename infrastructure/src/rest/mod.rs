//! REST adapter for the research backend

pub mod client;
pub mod envelope;
