//! Configuration file schema

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration, merged from defaults, files, and environment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub backend: BackendConfig,
    pub tracker: TrackerConfig,
}

/// Where the research backend lives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the REST API
    pub base_url: String,
    /// Explicit WebSocket base; derived from `base_url` when unset
    pub ws_url: Option<String>,
    pub request_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            ws_url: None,
            request_timeout_secs: 30,
        }
    }
}

impl BackendConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// WebSocket base URL, e.g. `ws://127.0.0.1:8000/ws`
    ///
    /// An explicit `ws_url` wins; otherwise the REST base is rewritten
    /// (`http` → `ws`, `https` → `wss`) with the `/ws` mount appended.
    pub fn websocket_base(&self) -> String {
        if let Some(ws_url) = &self.ws_url {
            return ws_url.trim_end_matches('/').to_string();
        }
        let base = self.base_url.trim_end_matches('/');
        let rewritten = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            format!("ws://{}", base)
        };
        format!("{}/ws", rewritten)
    }
}

/// Tracking behavior knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Pull-channel interval in milliseconds
    pub poll_interval_ms: u64,
    /// Page size for history listings
    pub history_page_size: u32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 2000,
            history_page_size: 20,
        }
    }
}

impl TrackerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
