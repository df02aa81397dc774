use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use textbook_core::classify::failure_message;
use textbook_core::{
    BackendError, ChatBackend, ChatController, ChatReply, ChatWidget, ConversationStore, Sender,
    Settings, SourceRef, DEFAULT_GREETING, FAILURE_PREFIX, PLACEHOLDER_REPLY,
};
use tokio::sync::Notify;

/// Backend that returns a fixed outcome, optionally after a gate opens
#[derive(Clone)]
struct ScriptedBackend {
    outcome: Result<ChatReply, BackendError>,
    gate: Option<Arc<Notify>>,
    calls: Arc<AtomicUsize>,
    completed: Arc<AtomicBool>,
    queries: Arc<Mutex<Vec<String>>>,
}

impl ScriptedBackend {
    fn replying(outcome: Result<ChatReply, BackendError>) -> Self {
        Self {
            outcome,
            gate: None,
            calls: Arc::new(AtomicUsize::new(0)),
            completed: Arc::new(AtomicBool::new(false)),
            queries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn gated(outcome: Result<ChatReply, BackendError>) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        let mut backend = Self::replying(outcome);
        backend.gate = Some(Arc::clone(&gate));
        (backend, gate)
    }

    fn record(&self, query: &str) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.to_string());
    }
}

impl ChatBackend for ScriptedBackend {
    async fn ask(&self, query: &str) -> Result<ChatReply, BackendError> {
        self.record(query);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.completed.store(true, Ordering::SeqCst);
        self.outcome.clone()
    }
}

struct PanickingBackend;

impl ChatBackend for PanickingBackend {
    async fn ask(&self, _query: &str) -> Result<ChatReply, BackendError> {
        panic!("backend exploded")
    }
}

const BASE: &str = "http://localhost:8001";

fn store() -> ConversationStore {
    ConversationStore::new(DEFAULT_GREETING)
}

#[tokio::test]
async fn test_successful_reply_follows_user_message() {
    let backend = ScriptedBackend::replying(Ok(ChatReply::new("A humanoid robot is...")));
    let mut controller = ChatController::new(backend.clone(), BASE);
    let mut store = store();
    let mut draft = "What is a humanoid robot?".to_string();

    assert!(controller.submit_and_wait(&mut store, &mut draft).await);

    let messages = store.messages();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[1].sender, Sender::User);
    assert_eq!(messages[1].text, "What is a humanoid robot?");
    assert_eq!(messages[2].sender, Sender::Assistant);
    assert_eq!(messages[2].text, "A humanoid robot is...");
    assert!(!store.is_pending());
    assert!(draft.is_empty());
    assert_eq!(
        *backend.queries.lock().unwrap(),
        vec!["What is a humanoid robot?".to_string()]
    );
}

#[tokio::test]
async fn test_raw_text_is_forwarded_untrimmed() {
    let backend = ScriptedBackend::replying(Ok(ChatReply::new("ok")));
    let mut controller = ChatController::new(backend.clone(), BASE);
    let mut store = store();
    let mut draft = "  spaced out  ".to_string();

    controller.submit_and_wait(&mut store, &mut draft).await;

    assert_eq!(store.messages()[1].text, "  spaced out  ");
    assert_eq!(backend.queries.lock().unwrap()[0], "  spaced out  ");
}

#[tokio::test]
async fn test_blank_input_changes_nothing() {
    let backend = ScriptedBackend::replying(Ok(ChatReply::new("unused")));
    let mut controller = ChatController::new(backend.clone(), BASE);
    let mut store = store();

    for blank in ["", "   ", "\t\n"] {
        let mut draft = blank.to_string();
        assert!(!controller.submit(&mut store, &mut draft));
        assert_eq!(draft, blank);
    }

    assert_eq!(store.len(), 1);
    assert!(!store.is_pending());
    assert!(!controller.is_submitting());
    assert!(!controller.settle(&mut store).await);
    assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_submissions_while_pending_are_ignored() {
    let (backend, gate) = ScriptedBackend::gated(Ok(ChatReply::new("first answer")));
    let mut controller = ChatController::new(backend.clone(), BASE);
    let mut store = store();

    let mut draft = "first".to_string();
    assert!(controller.submit(&mut store, &mut draft));
    assert!(store.is_pending());
    assert!(controller.is_submitting());

    for text in ["second", "third"] {
        let mut draft = text.to_string();
        assert!(!controller.submit(&mut store, &mut draft));
        assert_eq!(draft, text, "rejected draft must be left alone");
    }
    assert_eq!(store.len(), 2);

    gate.notify_one();
    assert!(controller.settle(&mut store).await);

    assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    let texts: Vec<&str> = store.messages().iter().map(|m| m.text.as_str()).collect();
    assert_eq!(texts, vec![DEFAULT_GREETING, "first", "first answer"]);
    assert!(!store.is_pending());

    // Idle again, so the next submission goes through
    let mut draft = "fourth".to_string();
    assert!(controller.submit(&mut store, &mut draft));
    gate.notify_one();
    controller.settle(&mut store).await;
    assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
    assert_eq!(store.len(), 5);
}

#[tokio::test]
async fn test_poll_waits_for_completion() {
    let (backend, gate) = ScriptedBackend::gated(Ok(ChatReply::new("done")));
    let mut controller = ChatController::new(backend, BASE);
    let mut store = store();

    let mut draft = "question".to_string();
    controller.submit(&mut store, &mut draft);

    assert!(!controller.poll(&mut store).await);
    assert!(store.is_pending());
    assert_eq!(store.len(), 2);

    gate.notify_one();
    let applied = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            if controller.poll(&mut store).await {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;

    assert!(applied.is_ok(), "reply was never applied");
    assert!(!store.is_pending());
    assert_eq!(store.last().map(|m| m.text.as_str()), Some("done"));
}

#[tokio::test]
async fn test_every_failure_becomes_one_assistant_message() {
    let failures = [
        BackendError::Unreachable("connection refused".to_string()),
        BackendError::Transport("operation timed out".to_string()),
        BackendError::Status(404),
        BackendError::Status(401),
        BackendError::Status(403),
        BackendError::Status(500),
        BackendError::Status(502),
        BackendError::Parse("invalid JSON in response body".to_string()),
    ];

    for err in failures {
        let backend = ScriptedBackend::replying(Err(err.clone()));
        let mut controller = ChatController::new(backend, BASE);
        let mut store = store();
        let mut draft = "test".to_string();

        controller.submit_and_wait(&mut store, &mut draft).await;

        assert_eq!(store.len(), 3, "{:?}", err);
        let reply = &store.messages()[2];
        assert_eq!(reply.sender, Sender::Assistant);
        assert_eq!(reply.text, failure_message(&err, BASE));
        assert!(reply.text.starts_with(FAILURE_PREFIX));
        assert!(!store.is_pending());
        assert!(!controller.is_submitting());
    }
}

#[tokio::test]
async fn test_unreachable_backend_message() {
    let backend = ScriptedBackend::replying(Err(BackendError::Unreachable("dns error".to_string())));
    let mut controller = ChatController::new(backend, BASE);
    let mut store = store();
    let mut draft = "test".to_string();

    controller.submit_and_wait(&mut store, &mut draft).await;

    assert_eq!(store.messages()[1].text, "test");
    assert_eq!(
        store.messages()[2].text,
        "Sorry, I'm having trouble connecting to the textbook assistant. Could not connect to the API server. \
         Please check if the backend server is running on http://localhost:8001."
    );
}

#[tokio::test]
async fn test_not_found_message() {
    let backend = ScriptedBackend::replying(Err(BackendError::Status(404)));
    let mut controller = ChatController::new(backend, BASE);
    let mut store = store();
    let mut draft = "test".to_string();

    controller.submit_and_wait(&mut store, &mut draft).await;

    assert!(store.messages()[2]
        .text
        .ends_with("The API endpoint was not found. Please verify the API URL is correct."));
}

#[tokio::test]
async fn test_empty_reply_uses_placeholder() {
    let backend = ScriptedBackend::replying(Ok(ChatReply::default()));
    let mut controller = ChatController::new(backend, BASE);
    let mut store = store();
    let mut draft = "anything".to_string();

    controller.submit_and_wait(&mut store, &mut draft).await;

    assert_eq!(store.last().map(|m| m.text.as_str()), Some(PLACEHOLDER_REPLY));
}

#[tokio::test]
async fn test_sources_are_kept_on_reply() {
    let reply = ChatReply {
        response: Some("See chapter 3.".to_string()),
        sources: vec![SourceRef {
            chunk_id: Some("ch3-1".to_string()),
            chapter_id: Some("ch3".to_string()),
            score: 0.7,
        }],
    };
    let backend = ScriptedBackend::replying(Ok(reply));
    let mut controller = ChatController::new(backend, BASE);
    let mut store = store();
    let mut draft = "where?".to_string();

    controller.submit_and_wait(&mut store, &mut draft).await;

    let last = store.last().unwrap();
    assert_eq!(last.sources.len(), 1);
    assert_eq!(last.sources[0].label(), "ch3");
    assert!(store.messages()[1].sources.is_empty());
}

#[tokio::test]
async fn test_panicking_request_still_clears_pending() {
    let mut controller = ChatController::new(PanickingBackend, BASE);
    let mut store = store();
    let mut draft = "boom".to_string();

    assert!(controller.submit_and_wait(&mut store, &mut draft).await);

    assert!(!store.is_pending());
    assert_eq!(store.len(), 3);
    let reply = &store.messages()[2];
    assert_eq!(reply.sender, Sender::Assistant);
    assert!(reply.text.starts_with(FAILURE_PREFIX));
    assert!(reply.text.contains("Error details: request task ended unexpectedly"));
}

#[tokio::test]
async fn test_widget_visibility_does_not_touch_transcript() {
    let backend = ScriptedBackend::replying(Ok(ChatReply::new("A humanoid robot is...")));
    let mut widget = ChatWidget::mount(backend, &Settings::default());
    assert!(!widget.is_open());
    assert_eq!(widget.messages().len(), 1);
    assert_eq!(widget.messages()[0].text, DEFAULT_GREETING);

    widget.open();
    widget.draft_mut().push_str("What is a humanoid robot?");
    assert!(widget.submit());
    assert!(widget.draft().is_empty());
    widget.settle().await;

    widget.close();
    assert!(!widget.is_open());
    assert_eq!(widget.messages().len(), 3);

    widget.toggle();
    assert!(widget.is_open());
    assert_eq!(widget.messages().len(), 3);
    assert_eq!(widget.messages()[2].text, "A humanoid robot is...");
    assert!(!widget.is_pending());
}

#[tokio::test]
async fn test_unmount_discards_pending_reply() {
    let (backend, gate) = ScriptedBackend::gated(Ok(ChatReply::new("too late")));
    let completed = Arc::clone(&backend.completed);
    let calls = Arc::clone(&backend.calls);
    let mut widget = ChatWidget::mount(backend, &Settings::default());

    widget.draft_mut().push_str("question");
    assert!(widget.submit());
    assert!(widget.is_pending());

    // Let the request task start before tearing down
    tokio::time::timeout(Duration::from_secs(2), async {
        while calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("request never started");

    widget.unmount();
    gate.notify_one();
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(!completed.load(Ordering::SeqCst));
}
