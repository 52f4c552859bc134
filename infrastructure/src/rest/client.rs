//! HTTP implementation of the backend gateway port

use crate::rest::envelope::ApiEnvelope;
use async_trait::async_trait;
use beacon_application::{BackendGateway, GatewayError, StartedSession};
use beacon_domain::{HistoryPage, ResearchQuery, ResearchResults, StartOptions, StatusReport};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Backend gateway speaking the research REST API over HTTP
pub struct HttpBackendGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackendGateway {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| GatewayError::RequestFailed(err.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_data<T: DeserializeOwned>(&self, url: String) -> Result<T, GatewayError> {
        debug!(url = %url, "GET");
        let response = self.client.get(&url).send().await.map_err(map_reqwest)?;
        unwrap_envelope(response).await
    }

    async fn post_data<T: DeserializeOwned>(
        &self,
        url: String,
        body: &Value,
    ) -> Result<T, GatewayError> {
        debug!(url = %url, "POST");
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(map_reqwest)?;
        unwrap_envelope(response).await
    }
}

/// Shape of the start endpoint's `data` payload
#[derive(Debug, Deserialize)]
struct StartResponse {
    session_id: String,
    #[serde(default)]
    websocket_url: Option<String>,
}

/// Build the start request body the backend expects
fn start_body(query: &ResearchQuery, options: &StartOptions) -> Value {
    let mut body = serde_json::to_value(options).unwrap_or_else(|_| Value::Object(Default::default()));
    if let Value::Object(map) = &mut body {
        map.insert(
            "query".to_string(),
            Value::String(query.content().to_string()),
        );
    }
    body
}

fn map_reqwest(err: reqwest::Error) -> GatewayError {
    if err.is_timeout() {
        GatewayError::Timeout
    } else {
        GatewayError::RequestFailed(err.to_string())
    }
}

async fn unwrap_envelope<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, GatewayError> {
    let status = response.status();
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(GatewayError::NotFound(
            response.text().await.unwrap_or_default(),
        ));
    }
    if !status.is_success() {
        return Err(GatewayError::RequestFailed(format!(
            "HTTP {}: {}",
            status.as_u16(),
            response.text().await.unwrap_or_default()
        )));
    }
    let envelope: ApiEnvelope = response
        .json()
        .await
        .map_err(|err| GatewayError::MalformedResponse(err.to_string()))?;
    envelope.into_data()
}

#[async_trait]
impl BackendGateway for HttpBackendGateway {
    async fn start_session(
        &self,
        query: &ResearchQuery,
        options: &StartOptions,
    ) -> Result<StartedSession, GatewayError> {
        let body = start_body(query, options);
        let started: StartResponse = self
            .post_data(self.url("/api/v1/research/start"), &body)
            .await?;
        Ok(StartedSession {
            session_id: started.session_id,
            websocket_url: started.websocket_url,
        })
    }

    async fn fetch_status(&self, session_id: &str) -> Result<StatusReport, GatewayError> {
        self.get_data(self.url(&format!("/api/v1/research/{}", session_id)))
            .await
    }

    async fn fetch_results(&self, session_id: &str) -> Result<ResearchResults, GatewayError> {
        self.get_data(self.url(&format!("/api/v1/research/{}/results", session_id)))
            .await
    }

    async fn cancel_session(&self, session_id: &str) -> Result<(), GatewayError> {
        let url = self.url(&format!("/api/v1/research/{}/cancel", session_id));
        let _: Value = self.post_data(url, &Value::Object(Default::default())).await?;
        Ok(())
    }

    async fn list_history(&self, page: u32, limit: u32) -> Result<HistoryPage, GatewayError> {
        self.get_data(self.url(&format!("/api/v1/history/?page={}&limit={}", page, limit)))
            .await
    }
}
