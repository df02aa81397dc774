//! Client side of the textbook assistant HTTP API
//!
//! The backend answers one question per request. Transport and protocol
//! failures come back as a [`BackendError`] so callers can classify them
//! without inspecting error strings.

pub mod http;

use std::future::Future;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::classify::PLACEHOLDER_REPLY;

pub use http::HttpBackend;

/// Something that can answer a chat query.
///
/// Implemented by [`HttpBackend`] for the real service; tests plug in
/// scripted backends.
pub trait ChatBackend: Send + Sync + 'static {
    fn ask(&self, query: &str) -> impl Future<Output = Result<ChatReply, BackendError>> + Send;
}

/// Structured failure of a backend call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// The server could not be reached at all (connection refused, DNS)
    #[error("Failed to fetch: {0}")]
    Unreachable(String),
    /// The connection was made but the exchange failed (timeout, reset)
    #[error("NetworkError: {0}")]
    Transport(String),
    #[error("HTTP error! status: {0}")]
    Status(u16),
    #[error("{0}")]
    Parse(String),
    /// The request task panicked or was cancelled before producing a result
    #[error("request task ended unexpectedly: {0}")]
    Interrupted(String),
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() {
            BackendError::Unreachable(err.to_string())
        } else if err.is_decode() {
            BackendError::Parse(err.to_string())
        } else {
            BackendError::Transport(err.to_string())
        }
    }
}

/// A textbook passage the backend used to ground its answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRef {
    #[serde(default)]
    pub chunk_id: Option<String>,
    #[serde(default)]
    pub chapter_id: Option<String>,
    #[serde(default)]
    pub score: f64,
}

impl SourceRef {
    /// Short label for display, preferring the chapter
    pub fn label(&self) -> String {
        match (&self.chapter_id, &self.chunk_id) {
            (Some(chapter), _) => chapter.clone(),
            (None, Some(chunk)) => chunk.clone(),
            (None, None) => "unknown".to_string(),
        }
    }
}

/// Successful chat payload
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChatReply {
    pub response: Option<String>,
    pub sources: Vec<SourceRef>,
}

impl ChatReply {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: Some(response.into()),
            sources: Vec::new(),
        }
    }

    /// Reads a decoded JSON body leniently.
    ///
    /// A missing or non-string `response` leaves `response` empty; source
    /// entries that do not fit [`SourceRef`] are skipped.
    pub fn from_value(value: &Value) -> Self {
        let response = value
            .get("response")
            .and_then(Value::as_str)
            .map(str::to_string);

        let sources = value
            .get("sources")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| serde_json::from_value::<SourceRef>(item.clone()).ok())
                    .collect()
            })
            .unwrap_or_default();

        Self { response, sources }
    }

    /// The text to show, falling back to the placeholder when the reply is empty
    pub fn text(&self) -> &str {
        match self.response.as_deref() {
            Some(text) if !text.trim().is_empty() => text,
            _ => PLACEHOLDER_REPLY,
        }
    }
}

/// Body of the health endpoint
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy")
    }
}
