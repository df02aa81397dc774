use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use super::{BackendError, ChatBackend, ChatReply, HealthStatus};

/// reqwest-backed client for the assistant API
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `POST /api/v1/chat?query=...` with an empty body
    pub async fn chat(&self, query: &str) -> Result<ChatReply, BackendError> {
        let url = format!("{}/api/v1/chat", self.base_url);
        debug!(%url, query_len = query.len(), "sending chat query");

        let response = self
            .client
            .post(&url)
            .query(&[("query", query)])
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let value: Value = serde_json::from_str(&body)
            .map_err(|e| BackendError::Parse(format!("invalid JSON in response body: {}", e)))?;

        Ok(ChatReply::from_value(&value))
    }

    /// `GET /api/v1/health`
    pub async fn health(&self) -> Result<HealthStatus, BackendError> {
        let url = format!("{}/api/v1/health", self.base_url);

        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| BackendError::Parse(format!("invalid health payload: {}", e)))
    }
}

impl ChatBackend for HttpBackend {
    async fn ask(&self, query: &str) -> Result<ChatReply, BackendError> {
        self.chat(query).await
    }
}
