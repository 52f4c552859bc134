//! The backend's REST response envelope
//!
//! Every endpoint wraps its payload as `{"status": <code>, "message": <str>,
//! "data": {...}}`; rejections replace `status` with `"success": false`.

use beacon_application::GatewayError;
use serde::Deserialize;
use serde::de::DeserializeOwned;

/// Response envelope shared by all backend endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope {
    #[serde(default)]
    pub status: Option<i64>,
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl ApiEnvelope {
    /// Whether the backend reported a rejection inside a 2xx response
    pub fn is_rejected(&self) -> bool {
        self.success == Some(false)
    }

    pub fn message(&self) -> &str {
        self.message.as_deref().unwrap_or("no message")
    }

    /// Unwrap the payload, surfacing in-envelope rejections as errors
    pub fn into_data<T: DeserializeOwned>(self) -> Result<T, GatewayError> {
        if self.is_rejected() {
            return Err(GatewayError::Rejected(self.message().to_string()));
        }
        serde_json::from_value(self.data)
            .map_err(|err| GatewayError::MalformedResponse(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beacon_domain::StatusReport;
    use serde_json::json;

    #[test]
    fn test_unwraps_data() {
        let envelope: ApiEnvelope = serde_json::from_value(json!({
            "status": 200,
            "message": "Status retrieved successfully",
            "data": {"session_id": "abc123", "status": "running"}
        }))
        .unwrap();

        let report: StatusReport = envelope.into_data().unwrap();
        assert_eq!(report.session_id, "abc123");
    }

    #[test]
    fn test_rejection_becomes_error() {
        let envelope: ApiEnvelope = serde_json::from_value(json!({
            "success": false,
            "message": "Cannot cancel session with status: completed",
            "data": {"session_id": "abc123", "status": "completed"}
        }))
        .unwrap();

        assert!(envelope.is_rejected());
        let result: Result<StatusReport, _> = envelope.into_data();
        assert!(matches!(result, Err(GatewayError::Rejected(_))));
    }

    #[test]
    fn test_mismatched_data_is_malformed() {
        let envelope: ApiEnvelope = serde_json::from_value(json!({
            "status": 200,
            "data": "not an object"
        }))
        .unwrap();

        let result: Result<StatusReport, _> = envelope.into_data();
        assert!(matches!(result, Err(GatewayError::MalformedResponse(_))));
    }
}
