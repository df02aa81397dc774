//! Submission lifecycle of the chat widget
//!
//! A controller is either idle or has exactly one request in flight. The
//! request runs on its own tokio task so the host keeps rendering; the
//! host hands the store back through [`ChatController::poll`] (or
//! [`ChatController::settle`]) to fold the outcome into the transcript.

use std::sync::Arc;

use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, info, warn};

use crate::backend::{BackendError, ChatBackend, ChatReply};
use crate::classify::{failure_message, FailureKind};
use crate::state::ConversationStore;

type Outcome = Result<ChatReply, BackendError>;

pub struct ChatController<B: ChatBackend> {
    backend: Arc<B>,
    base_url: String,
    in_flight: Option<JoinHandle<Outcome>>,
}

impl<B: ChatBackend> ChatController<B> {
    /// `base_url` is only used to word the unreachable-server reply.
    pub fn new(backend: B, base_url: &str) -> Self {
        Self {
            backend: Arc::new(backend),
            base_url: base_url.to_string(),
            in_flight: None,
        }
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Starts a request for the draft text.
    ///
    /// Returns `false` without touching the store or the draft when the
    /// draft is blank or another request is still in flight. Must be called
    /// from within a tokio runtime.
    pub fn submit(&mut self, store: &mut ConversationStore, draft: &mut String) -> bool {
        if draft.trim().is_empty() || self.is_submitting() || store.is_pending() {
            return false;
        }

        let query = std::mem::take(draft);
        store.append_user(&query);
        store.set_pending(true);

        debug!(chars = query.chars().count(), "submitting chat query");
        let backend = Arc::clone(&self.backend);
        self.in_flight = Some(tokio::spawn(async move { backend.ask(&query).await }));
        true
    }

    /// Applies the outcome if the in-flight request has finished.
    ///
    /// Never waits on an unfinished request. Returns whether the transcript
    /// changed.
    pub async fn poll(&mut self, store: &mut ConversationStore) -> bool {
        let finished = self
            .in_flight
            .as_ref()
            .map(JoinHandle::is_finished)
            .unwrap_or(false);
        if !finished {
            return false;
        }
        self.settle(store).await
    }

    /// Waits for the in-flight request, if any, and applies its outcome.
    pub async fn settle(&mut self, store: &mut ConversationStore) -> bool {
        let Some(handle) = self.in_flight.take() else {
            return false;
        };
        let joined = handle.await;
        self.apply(store, joined);
        true
    }

    /// Submits and waits for the reply in one step.
    pub async fn submit_and_wait(&mut self, store: &mut ConversationStore, draft: &mut String) -> bool {
        if !self.submit(store, draft) {
            return false;
        }
        self.settle(store).await
    }

    /// Abandons the in-flight request; its result is never applied.
    ///
    /// Only meaningful when the store is being torn down with the widget.
    pub fn detach(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            handle.abort();
            debug!("discarded in-flight chat request");
        }
    }

    fn apply(&self, store: &mut ConversationStore, joined: Result<Outcome, JoinError>) {
        let outcome = joined.unwrap_or_else(|e| Err(BackendError::Interrupted(e.to_string())));

        match outcome {
            Ok(reply) => {
                let text = reply.text().to_string();
                info!(sources = reply.sources.len(), "assistant replied");
                store.append_assistant_with_sources(&text, reply.sources);
            }
            Err(err) => {
                warn!(kind = ?FailureKind::of(&err), error = %err, "chat request failed");
                store.append_assistant(&failure_message(&err, &self.base_url));
            }
        }

        store.set_pending(false);
    }
}

impl<B: ChatBackend> Drop for ChatController<B> {
    fn drop(&mut self) {
        self.detach();
    }
}
