//! Mapping from backend failures to the assistant text shown in the transcript

use crate::backend::BackendError;

/// Leading sentence of every failure reply
pub const FAILURE_PREFIX: &str = "Sorry, I'm having trouble connecting to the textbook assistant. ";

/// Shown when the backend answered successfully but without usable text
pub const PLACEHOLDER_REPLY: &str = "Sorry, I couldn't process your request.";

/// User-facing category of a failed exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    NetworkUnreachable,
    NotFound,
    Unauthorized,
    ServerError,
    OtherHttpError,
    MalformedResponse,
}

impl FailureKind {
    pub fn of(err: &BackendError) -> Self {
        match err {
            // Any network-level failure reads as "could not connect", whether
            // the connection was refused, timed out or dropped mid-response.
            BackendError::Unreachable(_) | BackendError::Transport(_) => FailureKind::NetworkUnreachable,
            BackendError::Status(404) => FailureKind::NotFound,
            BackendError::Status(401 | 403) => FailureKind::Unauthorized,
            BackendError::Status(500) => FailureKind::ServerError,
            BackendError::Status(_) => FailureKind::OtherHttpError,
            BackendError::Parse(_) | BackendError::Interrupted(_) => FailureKind::MalformedResponse,
        }
    }
}

/// Full assistant reply for a failed exchange.
///
/// `base_url` is named in the unreachable case so the user knows which
/// server the widget tried.
pub fn failure_message(err: &BackendError, base_url: &str) -> String {
    let detail = match FailureKind::of(err) {
        FailureKind::NetworkUnreachable => format!(
            "Could not connect to the API server. Please check if the backend server is running on {}.",
            base_url
        ),
        FailureKind::NotFound => {
            "The API endpoint was not found. Please verify the API URL is correct.".to_string()
        }
        FailureKind::Unauthorized => {
            "Access to the API was denied. Please check API authentication.".to_string()
        }
        FailureKind::ServerError => {
            "The API server encountered an error. Please check the server logs.".to_string()
        }
        FailureKind::OtherHttpError | FailureKind::MalformedResponse => {
            format!("Error details: {}", err)
        }
    };

    format!("{}{}", FAILURE_PREFIX, detail)
}
