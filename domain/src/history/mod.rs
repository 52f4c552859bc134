//! History projection
//!
//! Read-only mapping from the backend's paginated session list into display
//! rows. No coordination concerns; included here because it shares the
//! session status vocabulary.

use crate::normalize::session_status_from_str;
use crate::session::entities::SessionStatus;
use serde::{Deserialize, Serialize};

/// Maximum query length shown in a history row
const QUERY_PREVIEW_LEN: usize = 60;

/// One past session as listed by the backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub progress: Option<i64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub research_mode: Option<String>,
}

/// Pagination envelope of the history listing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub pages: u32,
}

/// One page of prior sessions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryPage {
    #[serde(default)]
    pub sessions: Vec<SessionSummary>,
    #[serde(default)]
    pub pagination: Pagination,
}

/// Display model for one history entry
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRow {
    pub session_id: String,
    pub query: String,
    pub status: SessionStatus,
    /// Progress label, only meaningful for non-terminal sessions
    pub progress: Option<u8>,
    pub created_at: Option<String>,
    pub resumable: bool,
}

/// Project one history page into display rows
///
/// Sessions with an unrecognized status are shown as queued rather than
/// dropped; the listing is informational and the status endpoint remains
/// the authority once a session is opened.
pub fn project_history(page: &HistoryPage) -> Vec<HistoryRow> {
    page.sessions
        .iter()
        .map(|summary| {
            let status =
                session_status_from_str(&summary.status).unwrap_or(SessionStatus::Queued);
            HistoryRow {
                session_id: summary.session_id.clone(),
                query: truncate_query(&summary.query),
                status,
                progress: if status.is_terminal() {
                    None
                } else {
                    summary.progress.map(|p| p.clamp(0, 100) as u8)
                },
                created_at: summary.created_at.clone(),
                resumable: !status.is_terminal(),
            }
        })
        .collect()
}

fn truncate_query(query: &str) -> String {
    if query.chars().count() <= QUERY_PREVIEW_LEN {
        return query.to_string();
    }
    let truncated: String = query.chars().take(QUERY_PREVIEW_LEN - 1).collect();
    format!("{}…", truncated.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn page(sessions: serde_json::Value) -> HistoryPage {
        serde_json::from_value(json!({
            "sessions": sessions,
            "pagination": {"page": 1, "limit": 20, "total": 2, "pages": 1}
        }))
        .unwrap()
    }

    #[test]
    fn test_projection_maps_status_vocabulary() {
        let page = page(json!([
            {"session_id": "a", "query": "first", "status": "completed", "progress": 100},
            {"session_id": "b", "query": "second", "status": "in_progress", "progress": 40}
        ]));

        let rows = project_history(&page);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].status, SessionStatus::Completed);
        assert!(!rows[0].resumable);
        assert_eq!(rows[0].progress, None);
        assert_eq!(rows[1].status, SessionStatus::Running);
        assert!(rows[1].resumable);
        assert_eq!(rows[1].progress, Some(40));
    }

    #[test]
    fn test_unknown_status_defaults_to_queued() {
        let page = page(json!([
            {"session_id": "a", "query": "q", "status": "archived"}
        ]));
        let rows = project_history(&page);
        assert_eq!(rows[0].status, SessionStatus::Queued);
        assert!(rows[0].resumable);
    }

    #[test]
    fn test_long_query_is_truncated() {
        let long = "x".repeat(200);
        let page = page(json!([
            {"session_id": "a", "query": long, "status": "completed"}
        ]));
        let rows = project_history(&page);
        assert!(rows[0].query.chars().count() <= QUERY_PREVIEW_LEN);
        assert!(rows[0].query.ends_with('…'));
    }

    #[test]
    fn test_history_page_deserializes_backend_shape() {
        let page: HistoryPage = serde_json::from_value(json!({
            "sessions": [{
                "session_id": "abc",
                "query": "solar storms",
                "status": "failed",
                "created_at": "2024-01-15T10:30:00",
                "completed_at": null,
                "research_mode": "auto"
            }],
            "pagination": {"page": 2, "limit": 10, "total": 31, "pages": 4}
        }))
        .unwrap();
        assert_eq!(page.pagination.pages, 4);
        assert_eq!(page.sessions[0].research_mode.as_deref(), Some("auto"));
    }
}
