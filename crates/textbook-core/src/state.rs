//! Conversation state for one mounted chat widget
//!
//! The store is UI-agnostic: the terminal host renders from it, the
//! controller is the only writer.

use serde::{Deserialize, Serialize};

use crate::backend::SourceRef;

/// Stable identifier of a message within one store, usable as a render key
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MessageId(pub u64);

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sender {
    User,
    Assistant,
}

/// A chat message in the transcript
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub text: String,
    pub sender: Sender,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<SourceRef>,
}

/// Ordered transcript plus the in-flight flag.
///
/// Messages are only ever appended; ids grow by one per append.
#[derive(Debug)]
pub struct ConversationStore {
    messages: Vec<Message>,
    pending: bool,
    next_id: u64,
}

impl ConversationStore {
    /// Creates a store seeded with one assistant greeting.
    pub fn new(greeting: &str) -> Self {
        let mut store = Self {
            messages: Vec::new(),
            pending: false,
            next_id: 1,
        };
        store.append_assistant(greeting);
        store
    }

    pub fn append_user(&mut self, text: &str) -> MessageId {
        debug_assert!(!text.trim().is_empty(), "user message must not be blank");
        self.push(Sender::User, text, Vec::new())
    }

    pub fn append_assistant(&mut self, text: &str) -> MessageId {
        self.push(Sender::Assistant, text, Vec::new())
    }

    pub fn append_assistant_with_sources(&mut self, text: &str, sources: Vec<SourceRef>) -> MessageId {
        self.push(Sender::Assistant, text, sources)
    }

    pub fn set_pending(&mut self, pending: bool) {
        self.pending = pending;
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    fn push(&mut self, sender: Sender, text: &str, sources: Vec<SourceRef>) -> MessageId {
        let id = MessageId(self.next_id);
        self.next_id += 1;
        self.messages.push(Message {
            id,
            text: text.to_string(),
            sender,
            sources,
        });
        id
    }
}
