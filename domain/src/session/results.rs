//! Research results, fetched once after terminal completion

use serde::{Deserialize, Serialize};

/// Summary of the generated report
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub executive_summary: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub quality_score: Option<f64>,
}

/// Complete results payload of a completed session
///
/// Rendering of the report body is a presentation concern; this type only
/// carries what the tracker needs to confirm and summarize completion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResearchResults {
    #[serde(default)]
    pub report: Option<ReportSummary>,
    #[serde(default)]
    pub findings: Vec<serde_json::Value>,
    #[serde(default)]
    pub sources: Vec<serde_json::Value>,
    #[serde(default)]
    pub findings_count: Option<u64>,
    #[serde(default)]
    pub sources_count: Option<serde_json::Value>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

impl ResearchResults {
    /// Number of findings, preferring the explicit count field
    pub fn findings_total(&self) -> u64 {
        self.findings_count
            .unwrap_or(self.findings.len() as u64)
    }

    pub fn title(&self) -> Option<&str> {
        self.report.as_ref().and_then(|r| r.title.as_deref())
    }
}
