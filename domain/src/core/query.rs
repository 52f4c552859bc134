//! Research query value object

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// Minimum length of a research query after trimming
const MIN_QUERY_LEN: usize = 3;

/// A validated research query (Value Object)
///
/// Represents the text a session is started with. A start request is only
/// issued for a query that passed validation, so a `ResearchQuery` is always
/// non-empty and at least [`MIN_QUERY_LEN`] characters after trimming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchQuery {
    content: String,
}

impl ResearchQuery {
    /// Parse and validate a query string
    pub fn parse(content: impl Into<String>) -> Result<Self, DomainError> {
        let content = content.into();
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Err(DomainError::InvalidQuery("query is empty".to_string()));
        }
        if trimmed.chars().count() < MIN_QUERY_LEN {
            return Err(DomainError::InvalidQuery(format!(
                "query must be at least {} characters",
                MIN_QUERY_LEN
            )));
        }
        Ok(Self {
            content: trimmed.to_string(),
        })
    }

    /// Get the query content
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Consume and return the inner content
    pub fn into_content(self) -> String {
        self.content
    }
}

impl std::fmt::Display for ResearchQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.content)
    }
}
